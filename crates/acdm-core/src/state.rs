//! Asset state: native balances, deployed tokens and the router.
//!
//! Everything the platform and the governance engine move value through
//! lives here, so cloning an `AssetState` snapshots every balance.

use std::collections::BTreeMap;

use acdm_types::{Address, Amount};

use crate::access::Role;
use crate::error::CoreError;
use crate::native::NativeLedger;
use crate::router::Router;
use crate::token::{Token, TokenInfo};

#[derive(Debug, Clone)]
pub struct AssetState {
    pub native: NativeLedger,
    tokens: BTreeMap<Address, Token>,
    pub router: Router,
}

impl AssetState {
    pub fn new(router_address: Address) -> Self {
        Self {
            native: NativeLedger::new(),
            tokens: BTreeMap::new(),
            router: Router::new(router_address),
        }
    }

    /// Register a token. Its address must be unused.
    pub fn deploy_token(&mut self, token: Token) -> Result<Address, CoreError> {
        let address = token.address();
        if address.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        if self.tokens.contains_key(&address) {
            return Err(CoreError::TokenExists(address));
        }
        tracing::info!(%address, symbol = token.symbol(), decimals = token.decimals(), "token deployed");
        self.tokens.insert(address, token);
        Ok(address)
    }

    pub fn token(&self, address: &Address) -> Result<&Token, CoreError> {
        self.tokens.get(address).ok_or(CoreError::UnknownToken(*address))
    }

    pub fn token_mut(&mut self, address: &Address) -> Result<&mut Token, CoreError> {
        self.tokens.get_mut(address).ok_or(CoreError::UnknownToken(*address))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    /// Create a native/`token` pool whose LP token is deployed at `lp_address`.
    ///
    /// The router is the LP token's only minter.
    pub fn create_pool(
        &mut self,
        admin: Address,
        token: Address,
        lp_address: Address,
        lp_info: TokenInfo,
    ) -> Result<(), CoreError> {
        self.token(&token)?;
        let router = self.router.address();
        let mut lp = Token::new(lp_address, lp_info, admin);
        lp.access_mut().grant_role(Role::Minter, router);
        self.deploy_token(lp)?;
        self.router.create_pool(token, lp_address)?;
        Ok(())
    }

    /// Deposit `native_amount` and `token_amount` into the `token` pool.
    ///
    /// The token side is pulled with `transfer_from`, so the provider must
    /// have approved the router. Returns the LP tokens minted to `provider`.
    pub fn add_liquidity_native(
        &mut self,
        provider: &Address,
        token: &Address,
        token_amount: Amount,
        native_amount: Amount,
    ) -> Result<Amount, CoreError> {
        let router = self.router.address();
        let pool = self.router.pool(token)?.clone();
        let lp_supply = self.token(&pool.lp_token)?.total_supply();
        let (minted, locked) =
            self.router
                .liquidity_for(&pool, native_amount, token_amount, lp_supply)?;

        self.token_mut(token)?
            .transfer_from(&router, provider, &router, token_amount)?;
        self.native.transfer(provider, &router, native_amount)?;

        let lp = self.token_mut(&pool.lp_token)?;
        lp.mint(&router, &router, locked)?;
        lp.mint(&router, provider, minted)?;

        let pool = self.router.pool_mut(token)?;
        pool.native_reserve = pool
            .native_reserve
            .checked_add(native_amount)
            .ok_or_else(CoreError::overflow)?;
        pool.token_reserve = pool
            .token_reserve
            .checked_add(token_amount)
            .ok_or_else(CoreError::overflow)?;

        tracing::info!(%provider, %token, native_amount, token_amount, minted, "liquidity added");
        Ok(minted)
    }

    /// Swap exactly `native_in` from `payer` for as many `token` as the
    /// pool yields, delivered to `to`. Fails if fewer than `amount_out_min`.
    pub fn swap_exact_native_for_tokens(
        &mut self,
        payer: &Address,
        token: &Address,
        native_in: Amount,
        amount_out_min: Amount,
        to: &Address,
    ) -> Result<Amount, CoreError> {
        let router = self.router.address();
        let pool = self.router.pool(token)?;
        let amount_out =
            self.router
                .get_amount_out(native_in, pool.native_reserve, pool.token_reserve)?;
        if amount_out < amount_out_min {
            return Err(CoreError::InsufficientOutputAmount {
                minimum: amount_out_min,
                actual: amount_out,
            });
        }

        self.native.transfer(payer, &router, native_in)?;
        self.token_mut(token)?.transfer(&router, to, amount_out)?;

        let pool = self.router.pool_mut(token)?;
        pool.native_reserve = pool
            .native_reserve
            .checked_add(native_in)
            .ok_or_else(CoreError::overflow)?;
        pool.token_reserve -= amount_out;

        tracing::info!(%payer, %token, native_in, amount_out, "swap");
        Ok(amount_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(symbol: &str) -> TokenInfo {
        TokenInfo {
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            decimals: 18,
        }
    }

    /// State with an XXX token, a pool for it, and a funded provider.
    fn setup() -> (AssetState, Address, Address, Address) {
        let admin = Address::from_label("admin");
        let provider = Address::from_label("provider");
        let xxx = Address::from_label("xxx");
        let lp = Address::from_label("xxx-lp");

        let mut state = AssetState::new(Address::from_label("router"));
        let mut token = Token::new(xxx, info("XXX"), admin);
        token.access_mut().grant_role(Role::Minter, admin);
        token.mint(&admin, &provider, 1_000_000).unwrap();
        state.deploy_token(token).unwrap();
        state.create_pool(admin, xxx, lp, info("LP")).unwrap();
        state.native.issue(provider, 1_000_000).unwrap();
        (state, provider, xxx, lp)
    }

    #[test]
    fn test_deploy_twice_fails() {
        let (mut state, _, xxx, _) = setup();
        let dup = Token::new(xxx, info("XXX"), Address::from_label("admin"));
        assert_eq!(state.deploy_token(dup).unwrap_err(), CoreError::TokenExists(xxx));
        assert!(state.token(&Address::from_label("missing")).is_err());
    }

    #[test]
    fn test_add_liquidity_requires_approval() {
        let (mut state, provider, xxx, _) = setup();
        let err = state
            .add_liquidity_native(&provider, &xxx, 400_000, 100_000)
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientAllowance { .. }));
    }

    #[test]
    fn test_add_liquidity_and_swap() {
        let (mut state, provider, xxx, lp) = setup();
        let router = state.router.address();
        state
            .token_mut(&xxx)
            .unwrap()
            .approve(&provider, &router, 400_000)
            .unwrap();

        let minted = state
            .add_liquidity_native(&provider, &xxx, 400_000, 100_000)
            .unwrap();
        assert_eq!(minted, 200_000 - crate::router::MINIMUM_LIQUIDITY);
        assert_eq!(state.token(&lp).unwrap().balance_of(&provider), minted);
        assert_eq!(state.native.balance_of(&router), 100_000);

        let buyer = Address::from_label("buyer");
        state.native.issue(buyer, 1_000).unwrap();
        let out = state
            .swap_exact_native_for_tokens(&buyer, &xxx, 1_000, 1, &buyer)
            .unwrap();
        assert!(out > 0 && out < 4_000);
        assert_eq!(state.token(&xxx).unwrap().balance_of(&buyer), out);
        assert_eq!(state.native.balance_of(&buyer), 0);
        assert_eq!(state.router.pool(&xxx).unwrap().token_reserve, 400_000 - out);
    }

    #[test]
    fn test_swap_slippage_limit() {
        let (mut state, provider, xxx, _) = setup();
        let router = state.router.address();
        state
            .token_mut(&xxx)
            .unwrap()
            .approve(&provider, &router, 400_000)
            .unwrap();
        state
            .add_liquidity_native(&provider, &xxx, 400_000, 100_000)
            .unwrap();

        let err = state
            .swap_exact_native_for_tokens(&provider, &xxx, 1_000, 1_000_000, &provider)
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientOutputAmount { minimum: 1_000_000, .. }));
    }
}
