//! Constant-product (x · y = k) router pairing the native currency with tokens.
//!
//! The router only tracks reserves and does the pricing math; the asset
//! movements happen in [`crate::AssetState`], which owns the balances.

use std::collections::BTreeMap;

use acdm_types::{Address, Amount};

use crate::error::CoreError;

/// Liquidity locked forever on the first deposit into a pool.
pub const MINIMUM_LIQUIDITY: Amount = 1_000;

/// A native/token pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub token: Address,
    /// Liquidity-provider token minted to depositors
    pub lp_token: Address,
    pub native_reserve: Amount,
    pub token_reserve: Amount,
}

/// Router state
#[derive(Debug, Clone)]
pub struct Router {
    address: Address,
    /// Fee numerator (3 = 0.3%)
    fee_numerator: Amount,
    fee_denominator: Amount,
    pools: BTreeMap<Address, Pool>,
}

impl Router {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            fee_numerator: 3,
            fee_denominator: 1_000,
            pools: BTreeMap::new(),
        }
    }

    /// Custody account holding every pool's reserves.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn pool(&self, token: &Address) -> Result<&Pool, CoreError> {
        self.pools.get(token).ok_or(CoreError::PoolNotFound(*token))
    }

    pub fn pool_mut(&mut self, token: &Address) -> Result<&mut Pool, CoreError> {
        self.pools.get_mut(token).ok_or(CoreError::PoolNotFound(*token))
    }

    /// LP token of the pool for `token`, if one exists.
    pub fn lp_token(&self, token: &Address) -> Option<Address> {
        self.pools.get(token).map(|pool| pool.lp_token)
    }

    /// Register an empty pool. Fails if one already exists.
    pub fn create_pool(&mut self, token: Address, lp_token: Address) -> Result<&Pool, CoreError> {
        if token.is_zero() || lp_token.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        if self.pools.contains_key(&token) {
            return Err(CoreError::TokenExists(token));
        }
        Ok(self.pools.entry(token).or_insert(Pool {
            token,
            lp_token,
            native_reserve: 0,
            token_reserve: 0,
        }))
    }

    /// Output amount for an exact input, after the swap fee.
    pub fn get_amount_out(
        &self,
        amount_in: Amount,
        reserve_in: Amount,
        reserve_out: Amount,
    ) -> Result<Amount, CoreError> {
        if amount_in == 0 {
            return Err(CoreError::InsufficientInputAmount);
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(CoreError::InsufficientLiquidity);
        }

        let amount_in_with_fee = amount_in
            .checked_mul(self.fee_denominator - self.fee_numerator)
            .ok_or_else(CoreError::overflow)?;
        let numerator = amount_in_with_fee
            .checked_mul(reserve_out)
            .ok_or_else(CoreError::overflow)?;
        let denominator = reserve_in
            .checked_mul(self.fee_denominator)
            .and_then(|d| d.checked_add(amount_in_with_fee))
            .ok_or_else(CoreError::overflow)?;

        Ok(numerator / denominator)
    }

    /// LP tokens owed for a deposit, given the LP token's current supply.
    ///
    /// Returns `(minted, locked)`; `locked` is non-zero only for the first
    /// deposit into an empty pool.
    pub fn liquidity_for(
        &self,
        pool: &Pool,
        native_amount: Amount,
        token_amount: Amount,
        lp_supply: Amount,
    ) -> Result<(Amount, Amount), CoreError> {
        if native_amount == 0 || token_amount == 0 {
            return Err(CoreError::InsufficientInputAmount);
        }

        if lp_supply == 0 {
            let product = native_amount
                .checked_mul(token_amount)
                .ok_or_else(CoreError::overflow)?;
            let root = integer_sqrt(product);
            if root <= MINIMUM_LIQUIDITY {
                return Err(CoreError::InsufficientLiquidity);
            }
            return Ok((root - MINIMUM_LIQUIDITY, MINIMUM_LIQUIDITY));
        }

        if pool.native_reserve == 0 || pool.token_reserve == 0 {
            return Err(CoreError::InsufficientLiquidity);
        }
        let by_native = acdm_types::mul_div(native_amount, lp_supply, pool.native_reserve)?;
        let by_token = acdm_types::mul_div(token_amount, lp_supply, pool.token_reserve)?;
        let minted = by_native.min(by_token);
        if minted == 0 {
            return Err(CoreError::InsufficientLiquidity);
        }
        Ok((minted, 0))
    }
}

/// Largest `x` with `x · x ≤ n` (Newton iteration).
pub fn integer_sqrt(n: Amount) -> Amount {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = n / 2 + (n & 1);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn router_with_pool() -> (Router, Address) {
        let token = Address::from_label("xxx");
        let mut router = Router::new(Address::from_label("router"));
        router.create_pool(token, Address::from_label("lp")).unwrap();
        (router, token)
    }

    #[test]
    fn test_create_pool_once() {
        let (mut router, token) = router_with_pool();
        assert_eq!(router.lp_token(&token), Some(Address::from_label("lp")));
        assert_eq!(
            router.create_pool(token, Address::from_label("lp2")).unwrap_err(),
            CoreError::TokenExists(token)
        );
        assert!(router.pool(&Address::from_label("other")).is_err());
    }

    #[test]
    fn test_swap_calculation() {
        let (router, _) = router_with_pool();
        // 1000 in against 10_000 / 10_000 reserves, 0.3% fee
        let out = router.get_amount_out(1_000, 10_000, 10_000).unwrap();
        assert_eq!(out, 906);
        assert_eq!(
            router.get_amount_out(0, 10_000, 10_000),
            Err(CoreError::InsufficientInputAmount)
        );
        assert_eq!(
            router.get_amount_out(1, 0, 10_000),
            Err(CoreError::InsufficientLiquidity)
        );
    }

    #[test]
    fn test_first_liquidity_locks_minimum() {
        let (router, token) = router_with_pool();
        let pool = router.pool(&token).unwrap().clone();
        let (minted, locked) = router.liquidity_for(&pool, 1_000_000, 4_000_000, 0).unwrap();
        assert_eq!(locked, MINIMUM_LIQUIDITY);
        assert_eq!(minted, 2_000_000 - MINIMUM_LIQUIDITY);
    }

    #[test]
    fn test_proportional_liquidity() {
        let (router, token) = router_with_pool();
        let pool = Pool {
            native_reserve: 1_000,
            token_reserve: 4_000,
            ..router.pool(&token).unwrap().clone()
        };
        let (minted, locked) = router.liquidity_for(&pool, 100, 800, 2_000).unwrap();
        assert_eq!(locked, 0);
        assert_eq!(minted, 200);
    }

    #[test]
    fn test_integer_sqrt() {
        assert_eq!(integer_sqrt(0), 0);
        assert_eq!(integer_sqrt(1), 1);
        assert_eq!(integer_sqrt(15), 3);
        assert_eq!(integer_sqrt(16), 4);
        assert_eq!(integer_sqrt(u128::MAX), u64::MAX as u128);
    }

    proptest! {
        #[test]
        fn prop_swap_preserves_product(amount_in in 1u128..1u128 << 40, r_in in 1u128..1u128 << 40, r_out in 1u128..1u128 << 40) {
            let (router, _) = router_with_pool();
            let out = router.get_amount_out(amount_in, r_in, r_out).unwrap();
            prop_assert!(out < r_out);
            prop_assert!((r_in + amount_in) * (r_out - out) >= r_in * r_out);
        }

        #[test]
        fn prop_integer_sqrt_floor(n in any::<u64>()) {
            let n = n as u128;
            let root = integer_sqrt(n);
            prop_assert!(root * root <= n);
            prop_assert!((root + 1) * (root + 1) > n);
        }
    }
}
