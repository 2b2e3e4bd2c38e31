//! The platform: round transitions, primary sale, order book settlement and
//! the administrative call surface.
//!
//! Every entry point takes the asset state it moves value through plus the
//! caller and, where expiry matters, the current time. Entry points are not
//! transactional on their own: the node's ledger runs them against a
//! snapshot and restores it on failure.

use acdm_core::{AccessControl, AssetState, Role};
use acdm_types::{mul_div, mul_div_ceil, Address, Amount, Coefficient, Timestamp};
use serde::{Deserialize, Serialize};

use crate::call::PlatformCall;
use crate::error::PlatformError;
use crate::orders::{Order, OrderBook};
use crate::params::PlatformParams;
use crate::referral::{CommissionConfig, ReferralRegistry, RoundKind, Split, Tier};
use crate::round::{sale_volume, Phase, PriceSchedule, RoundState};

/// Addresses the platform is wired to at deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformAccounts {
    /// The platform's own custody account
    pub address: Address,
    /// Token sold in sale rounds and traded in trade rounds
    pub acdm_token: Address,
    /// Treasury token bought and burned by governance
    pub xxx_token: Address,
    /// Receiver of `SendToOwner`
    pub owner: Address,
    /// Holder of the `Dao` role
    pub dao: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleRoundStarted {
    pub price: Amount,
    pub volume: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Purchase {
    pub units: Amount,
    pub cost: Amount,
    pub refund: Amount,
    pub split: Split,
}

/// Units taken from one order during a redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub order: u64,
    pub seller: Address,
    pub units: Amount,
    pub cost: Amount,
    pub split: Split,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Redemption {
    pub units: Amount,
    pub spent: Amount,
    pub refund: Amount,
    pub fills: Vec<Fill>,
}

#[derive(Debug, Clone)]
pub struct AcdmPlatform {
    accounts: PlatformAccounts,
    access: AccessControl,
    schedule: PriceSchedule,
    round: RoundState,
    orders: OrderBook,
    referrals: ReferralRegistry,
}

impl AcdmPlatform {
    pub fn new(accounts: PlatformAccounts, params: &PlatformParams) -> Result<Self, PlatformError> {
        params.validate()?;
        let mut access = AccessControl::with_admin(accounts.owner);
        access.grant_role(Role::Dao, accounts.dao);
        Ok(Self {
            accounts,
            access,
            schedule: params.schedule(),
            round: RoundState::new(params.round_duration_ms),
            orders: OrderBook::new(),
            referrals: ReferralRegistry::new(params.commissions),
        })
    }

    pub fn address(&self) -> Address {
        self.accounts.address
    }

    pub fn accounts(&self) -> &PlatformAccounts {
        &self.accounts
    }

    pub fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }

    pub fn round_time_ms(&self) -> u64 {
        self.round.duration_ms
    }

    pub fn phase(&self) -> Phase {
        self.round.phase
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn current_price(&self) -> Option<Amount> {
        self.round.current_price
    }

    pub fn sale_volume(&self) -> Amount {
        self.round.volume_minted
    }

    pub fn sold_volume(&self) -> Amount {
        self.round.volume_sold
    }

    pub fn trade_revenue(&self) -> Amount {
        self.round.trade_revenue
    }

    pub fn order(&self, id: u64) -> Option<&Order> {
        self.orders.get(id)
    }

    pub fn active_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.active()
    }

    pub fn referrer_of(&self, account: &Address) -> Option<Address> {
        self.referrals.referrer_of(account)
    }

    pub fn commission(&self, tier: Tier, kind: RoundKind) -> Coefficient {
        self.referrals.commission(tier, kind)
    }

    pub fn commissions(&self) -> &CommissionConfig {
        self.referrals.commissions()
    }

    /// Price the next `start_sale_round` would use. Does not advance it.
    pub fn next_sale_round_price(&self) -> Result<Amount, PlatformError> {
        self.schedule.next_price(self.round.current_price)
    }

    /// Open a sale round, minting inventory worth the last trade round's revenue.
    pub fn start_sale_round(
        &mut self,
        assets: &mut AssetState,
        now: Timestamp,
    ) -> Result<SaleRoundStarted, PlatformError> {
        self.round.ensure_can_start_sale(now)?;

        let price = self.next_sale_round_price()?;
        let acdm = assets.token_mut(&self.accounts.acdm_token)?;
        let volume = sale_volume(self.round.trade_revenue, price, acdm.unit()?)?;
        acdm.mint(&self.accounts.address, &self.accounts.address, volume)?;

        self.round.begin_sale(now, price, volume);
        tracing::info!(price, volume, started_at = now, "sale round started");
        Ok(SaleRoundStarted { price, volume })
    }

    /// Open a trade round, burning whatever sale inventory went unsold.
    pub fn start_trade_round(&mut self, assets: &mut AssetState, now: Timestamp) -> Result<Amount, PlatformError> {
        self.round.ensure_can_start_trade(now)?;

        let unsold = self.round.remaining_volume();
        let platform = self.accounts.address;
        assets
            .token_mut(&self.accounts.acdm_token)?
            .burn(&platform, &platform, unsold)?;

        self.round.begin_trade(now);
        tracing::info!(burned = unsold, started_at = now, "trade round started");
        Ok(unsold)
    }

    /// Buy sale inventory with `payment`. Pays the buyer's referrers out of
    /// the cost and refunds whatever the purchased units didn't use.
    pub fn buy_acdm(
        &mut self,
        assets: &mut AssetState,
        buyer: &Address,
        now: Timestamp,
        payment: Amount,
    ) -> Result<Purchase, PlatformError> {
        if !self.round.sale_open(now) {
            return Err(PlatformError::RoundClosed("sale round is finished".into()));
        }
        if payment == 0 {
            return Err(PlatformError::InvalidAmount);
        }
        let price = self
            .round
            .current_price
            .ok_or_else(|| PlatformError::InvalidState("sale round has no price".into()))?;
        let platform = self.accounts.address;
        let unit = assets.token(&self.accounts.acdm_token)?.unit()?;

        let units = mul_div(payment, unit, price)?.min(self.round.remaining_volume());
        if units == 0 {
            return Err(PlatformError::InvalidAmount);
        }
        let cost = mul_div_ceil(units, price, unit)?;
        let refund = payment - cost;

        assets.native.transfer(buyer, &platform, payment)?;
        let split = self
            .referrals
            .split(&mut assets.native, &platform, cost, buyer, RoundKind::Sale)?;
        assets.native.transfer(&platform, buyer, refund)?;
        assets
            .token_mut(&self.accounts.acdm_token)?
            .transfer(&platform, buyer, units)?;

        self.round.volume_sold += units;
        tracing::info!(%buyer, units, cost, refund, "sale purchase");
        Ok(Purchase { units, cost, refund, split })
    }

    /// Escrow `amount` of the seller's tokens in a new order.
    pub fn add_order(
        &mut self,
        assets: &mut AssetState,
        seller: &Address,
        amount: Amount,
        unit_price: Amount,
    ) -> Result<u64, PlatformError> {
        if !self.round.trade_open() {
            return Err(PlatformError::RoundClosed("trade round isn't started".into()));
        }
        if amount == 0 {
            return Err(PlatformError::InvalidAmount);
        }
        if unit_price == 0 {
            return Err(PlatformError::InvalidPrice);
        }

        let platform = self.accounts.address;
        assets
            .token_mut(&self.accounts.acdm_token)?
            .transfer_from(&platform, seller, &platform, amount)?;

        let id = self.orders.insert(*seller, amount, unit_price);
        tracing::info!(order = id, %seller, amount, unit_price, "order added");
        Ok(id)
    }

    /// Cancel an order and hand its remaining units back to the creator.
    pub fn remove_order(
        &mut self,
        assets: &mut AssetState,
        caller: &Address,
        id: u64,
    ) -> Result<Amount, PlatformError> {
        let returned = self.orders.cancel(id, caller)?;
        assets
            .token_mut(&self.accounts.acdm_token)?
            .transfer(&self.accounts.address, caller, returned)?;
        tracing::info!(order = id, %caller, returned, "order removed");
        Ok(returned)
    }

    /// Spend `payment` on active orders, oldest first.
    ///
    /// Each order yields as many whole tokens as the remaining payment
    /// affords at its price. The cost of every fill is split along the
    /// seller's referral chain; the unspent payment goes back to the buyer.
    pub fn redeem_order(
        &mut self,
        assets: &mut AssetState,
        buyer: &Address,
        payment: Amount,
    ) -> Result<Redemption, PlatformError> {
        if !self.round.trade_open() {
            return Err(PlatformError::RoundClosed("trade round isn't started".into()));
        }
        let platform = self.accounts.address;
        let unit = assets.token(&self.accounts.acdm_token)?.unit()?;
        assets.native.transfer(buyer, &platform, payment)?;

        let mut left = payment;
        let mut redemption = Redemption::default();
        for id in self.orders.active_ids() {
            if left == 0 {
                break;
            }
            let (seller, remaining, unit_price) = match self.orders.get(id) {
                Some(order) => (order.creator, order.remaining, order.unit_price),
                None => continue,
            };
            let units = (left / unit_price).saturating_mul(unit).min(remaining);
            if units == 0 {
                continue;
            }
            let cost = mul_div_ceil(units, unit_price, unit)?;

            self.orders.fill(id, units)?;
            assets
                .token_mut(&self.accounts.acdm_token)?
                .transfer(&platform, buyer, units)?;
            let split = self
                .referrals
                .split(&mut assets.native, &platform, cost, &seller, RoundKind::Trade)?;

            left -= cost;
            self.round.trade_revenue = self
                .round
                .trade_revenue
                .checked_add(cost)
                .ok_or_else(PlatformError::overflow)?;
            redemption.units += units;
            redemption.spent += cost;
            redemption.fills.push(Fill { order: id, seller, units, cost, split });
            tracing::debug!(order = id, %seller, units, cost, "order filled");
        }

        assets.native.transfer(&platform, buyer, left)?;
        redemption.refund = left;
        tracing::info!(%buyer, units = redemption.units, spent = redemption.spent, refund = left, "orders redeemed");
        Ok(redemption)
    }

    /// Record the caller's referrer (zero address for none).
    pub fn register(&mut self, caller: &Address, referrer: Address) -> Result<(), PlatformError> {
        self.referrals.register(*caller, referrer)
    }

    /// Decode and run administrative call data. Only the `Dao` role may call.
    pub fn execute_call(
        &mut self,
        assets: &mut AssetState,
        caller: &Address,
        call_data: &[u8],
    ) -> Result<(), PlatformError> {
        self.access.ensure_role(Role::Dao, caller)?;
        let call = PlatformCall::decode(call_data)?;
        tracing::info!(%caller, ?call, "administrative call");
        self.apply(assets, call)
    }

    fn apply(&mut self, assets: &mut AssetState, call: PlatformCall) -> Result<(), PlatformError> {
        let platform = self.accounts.address;
        match call {
            PlatformCall::SetCommission {
                tier,
                round,
                coefficient,
                decimals,
            } => {
                let value = Coefficient::new(coefficient, decimals)
                    .map_err(|e| PlatformError::InvalidCommission(e.to_string()))?;
                self.referrals.set_commission(tier, round, value)
            }
            PlatformCall::SendToOwner { amount } => {
                assets.native.transfer(&platform, &self.accounts.owner, amount)?;
                Ok(())
            }
            PlatformCall::SwapNativeForTokens { amount_out_min } => {
                let balance = assets.native.balance_of(&platform);
                let bought = assets.swap_exact_native_for_tokens(
                    &platform,
                    &self.accounts.xxx_token,
                    balance,
                    amount_out_min,
                    &platform,
                )?;
                tracing::info!(spent = balance, bought, "treasury swapped");
                Ok(())
            }
            PlatformCall::BurnTreasuryTokens { amount } => {
                assets
                    .token_mut(&self.accounts.xxx_token)?
                    .burn(&platform, &platform, amount)?;
                Ok(())
            }
        }
    }
}
