//! Staking ledger: locked deposits, maturity-gated rewards and hold-gated
//! withdrawal. Deposits double as voting weight.
//!
//! Periods are configured in minutes and compared against millisecond
//! timestamps.

use std::collections::HashMap;

use acdm_core::AssetState;
use acdm_types::{mul_div, Address, Amount, Timestamp, MS_PER_MINUTE};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;
use crate::voting::VotingPower;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakingParams {
    /// Reward per cycle as a percentage of the deposit
    pub rate_percent: u64,
    /// Minutes before a deposit's reward can be claimed
    pub maturity_period_min: u64,
    /// Minutes before a deposit can be withdrawn
    pub deposit_hold_time_min: u64,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            rate_percent: 3,
            maturity_period_min: 5,
            deposit_hold_time_min: 1,
        }
    }
}

/// An account's locked stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Deposit {
    pub amount: Amount,
    /// Reset on every stake
    pub deposited_at: Timestamp,
}

/// Addresses of the custody account and the two tokens involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingAccounts {
    /// Holds deposits and the reward pool
    pub custody: Address,
    pub deposit_token: Address,
    pub reward_token: Address,
}

#[derive(Debug, Clone)]
pub struct StakingLedger {
    accounts: StakingAccounts,
    params: StakingParams,
    deposits: HashMap<Address, Deposit>,
}

fn after_minutes(start: Timestamp, minutes: u64) -> Timestamp {
    start.saturating_add(minutes.saturating_mul(MS_PER_MINUTE))
}

impl StakingLedger {
    pub fn new(accounts: StakingAccounts, params: StakingParams) -> Self {
        Self {
            accounts,
            params,
            deposits: HashMap::new(),
        }
    }

    pub fn accounts(&self) -> &StakingAccounts {
        &self.accounts
    }

    pub fn params(&self) -> &StakingParams {
        &self.params
    }

    pub fn deposit(&self, account: &Address) -> Option<&Deposit> {
        self.deposits.get(account)
    }

    pub fn staked(&self, account: &Address) -> Amount {
        self.deposit(account).map_or(0, |d| d.amount)
    }

    /// Pull `amount` deposit tokens from `caller` into custody. A zero
    /// amount still restarts the deposit's clock.
    pub fn stake(
        &mut self,
        assets: &mut AssetState,
        caller: &Address,
        now: Timestamp,
        amount: Amount,
    ) -> Result<(), GovernanceError> {
        let custody = self.accounts.custody;
        assets
            .token_mut(&self.accounts.deposit_token)?
            .transfer_from(&custody, caller, &custody, amount)?;

        let deposit = self.deposits.entry(*caller).or_default();
        deposit.amount = deposit
            .amount
            .checked_add(amount)
            .ok_or_else(GovernanceError::overflow)?;
        deposit.deposited_at = now;

        tracing::info!(account = %caller, amount, total = deposit.amount, "staked");
        Ok(())
    }

    /// Reward `caller` can claim at `now`; zero before maturity or without
    /// a deposit. Claiming leaves the deposit untouched, so a matured
    /// deposit pays on every claim.
    pub fn claimable(&self, caller: &Address, now: Timestamp) -> Result<Amount, GovernanceError> {
        let Some(deposit) = self.deposits.get(caller) else {
            return Ok(0);
        };
        if deposit.amount == 0 || now < after_minutes(deposit.deposited_at, self.params.maturity_period_min) {
            return Ok(0);
        }
        Ok(mul_div(deposit.amount, Amount::from(self.params.rate_percent), 100)?)
    }

    /// Pay the matured reward from the pre-funded pool. A no-op when
    /// nothing is claimable.
    pub fn claim(
        &mut self,
        assets: &mut AssetState,
        caller: &Address,
        now: Timestamp,
    ) -> Result<Amount, GovernanceError> {
        let reward = self.claimable(caller, now)?;
        if reward == 0 {
            tracing::debug!(account = %caller, "nothing to claim");
            return Ok(0);
        }

        let custody = self.accounts.custody;
        assets
            .token_mut(&self.accounts.reward_token)?
            .transfer(&custody, caller, reward)?;

        tracing::info!(account = %caller, reward, "reward claimed");
        Ok(reward)
    }

    /// Return the whole deposit once the hold time has passed.
    pub fn unstake(
        &mut self,
        assets: &mut AssetState,
        caller: &Address,
        now: Timestamp,
    ) -> Result<Amount, GovernanceError> {
        let deposit = match self.deposits.get(caller) {
            Some(deposit) if deposit.amount > 0 => *deposit,
            _ => return Err(GovernanceError::NoDeposit(*caller)),
        };
        let until = after_minutes(deposit.deposited_at, self.params.deposit_hold_time_min);
        if now < until {
            return Err(GovernanceError::HoldPeriodActive { until });
        }

        let custody = self.accounts.custody;
        assets
            .token_mut(&self.accounts.deposit_token)?
            .transfer(&custody, caller, deposit.amount)?;
        self.deposits.remove(caller);

        tracing::info!(account = %caller, amount = deposit.amount, "unstaked");
        Ok(deposit.amount)
    }

    pub fn set_rate_percent(&mut self, value: u64) {
        self.params.rate_percent = value;
        tracing::info!(value, "rate percent updated");
    }

    pub fn set_maturity_period_min(&mut self, value: u64) {
        self.params.maturity_period_min = value;
        tracing::info!(value, "maturity period updated");
    }

    pub fn set_deposit_hold_time_min(&mut self, value: u64) {
        self.params.deposit_hold_time_min = value;
        tracing::info!(value, "deposit hold time updated");
    }
}

impl VotingPower for StakingLedger {
    fn voting_power(&self, account: &Address) -> Amount {
        self.staked(account)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use acdm_core::{Role, Token, TokenInfo};

    pub(crate) const MINUTE: u64 = MS_PER_MINUTE;

    pub(crate) fn test_params() -> StakingParams {
        StakingParams {
            rate_percent: 20,
            maturity_period_min: 20,
            deposit_hold_time_min: 10,
        }
    }

    /// Assets with LP and XXX tokens; `deployer` may mint both.
    pub(crate) fn test_assets(custody: Address) -> (AssetState, StakingAccounts, Address) {
        let deployer = Address::from_label("deployer");
        let accounts = StakingAccounts {
            custody,
            deposit_token: Address::from_label("lp"),
            reward_token: Address::from_label("xxx"),
        };
        let mut assets = AssetState::new(Address::from_label("router"));
        for (address, symbol) in [(accounts.deposit_token, "LP"), (accounts.reward_token, "XXX")] {
            let info = TokenInfo {
                name: symbol.to_string(),
                symbol: symbol.to_string(),
                decimals: 18,
            };
            let mut token = Token::new(address, info, deployer);
            token.access_mut().grant_role(Role::Minter, deployer);
            assets.deploy_token(token).unwrap();
        }
        (assets, accounts, deployer)
    }

    /// Mint `amount` deposit tokens to `account` and approve custody.
    pub(crate) fn fund(assets: &mut AssetState, accounts: &StakingAccounts, account: &Address, amount: Amount) {
        let deployer = Address::from_label("deployer");
        let token = assets.token_mut(&accounts.deposit_token).unwrap();
        token.mint(&deployer, account, amount).unwrap();
        token.approve(account, &accounts.custody, amount).unwrap();
    }

    fn setup() -> (AssetState, StakingLedger, Address) {
        let (mut assets, accounts, _) = test_assets(Address::from_label("dao"));
        let account = Address::from_label("staker");
        fund(&mut assets, &accounts, &account, 100);
        (assets, StakingLedger::new(accounts, test_params()), account)
    }

    #[test]
    fn test_stake_pulls_tokens() {
        let (mut assets, mut staking, account) = setup();
        staking.stake(&mut assets, &account, 0, 100).unwrap();

        let lp = assets.token(&staking.accounts().deposit_token).unwrap();
        assert_eq!(lp.balance_of(&staking.accounts().custody), 100);
        assert_eq!(lp.balance_of(&account), 0);
        assert_eq!(staking.voting_power(&account), 100);
    }

    #[test]
    fn test_stake_without_approval() {
        let (mut assets, mut staking, _) = setup();
        let other = Address::from_label("other");
        let err = staking.stake(&mut assets, &other, 0, 100).unwrap_err();
        assert!(matches!(err, GovernanceError::Core(acdm_core::CoreError::InsufficientAllowance { .. })));
    }

    #[test]
    fn test_zero_stake_restarts_clock() {
        let (mut assets, mut staking, account) = setup();
        staking.stake(&mut assets, &account, 0, 100).unwrap();
        staking.stake(&mut assets, &account, 15 * MINUTE, 0).unwrap();

        let deposit = staking.deposit(&account).unwrap();
        assert_eq!(deposit.amount, 100);
        assert_eq!(deposit.deposited_at, 15 * MINUTE);
        assert_eq!(staking.claimable(&account, 20 * MINUTE).unwrap(), 0);

        // Without a prior deposit nothing is staked or withdrawable
        let other = Address::from_label("other");
        staking.stake(&mut assets, &other, 0, 0).unwrap();
        assert_eq!(staking.voting_power(&other), 0);
        assert_eq!(staking.unstake(&mut assets, &other, 10 * MINUTE), Err(GovernanceError::NoDeposit(other)));
    }

    #[test]
    fn test_claim_before_maturity_pays_nothing() {
        let (mut assets, mut staking, account) = setup();
        staking.stake(&mut assets, &account, 0, 100).unwrap();
        assert_eq!(staking.claim(&mut assets, &account, 20 * MINUTE - 1).unwrap(), 0);
        assert_eq!(staking.claim(&mut assets, &Address::from_label("nobody"), 0).unwrap(), 0);
    }

    #[test]
    fn test_claim_after_maturity_pays_every_time() {
        let (mut assets, mut staking, account) = setup();
        let deployer = Address::from_label("deployer");
        let custody = staking.accounts().custody;
        let reward_token = staking.accounts().reward_token;
        staking.stake(&mut assets, &account, 0, 100).unwrap();
        assets.token_mut(&reward_token).unwrap().mint(&deployer, &custody, 40).unwrap();

        assert_eq!(staking.claim(&mut assets, &account, 20 * MINUTE).unwrap(), 20);
        assert_eq!(staking.claim(&mut assets, &account, 40 * MINUTE).unwrap(), 20);
        assert_eq!(assets.token(&reward_token).unwrap().balance_of(&account), 40);
        assert_eq!(staking.deposit(&account), Some(&Deposit { amount: 100, deposited_at: 0 }));

        // Pool drained: the next claim fails and changes nothing
        assert!(staking.claim(&mut assets, &account, 60 * MINUTE).is_err());
        assert_eq!(staking.staked(&account), 100);
    }

    #[test]
    fn test_claim_with_empty_pool_fails() {
        let (mut assets, mut staking, account) = setup();
        staking.stake(&mut assets, &account, 0, 100).unwrap();
        let err = staking.claim(&mut assets, &account, 20 * MINUTE).unwrap_err();
        assert!(matches!(err, GovernanceError::Core(acdm_core::CoreError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_unstake_after_hold_time_once() {
        let (mut assets, mut staking, account) = setup();
        staking.stake(&mut assets, &account, 0, 100).unwrap();

        assert_eq!(
            staking.unstake(&mut assets, &account, 10 * MINUTE - 1),
            Err(GovernanceError::HoldPeriodActive { until: 10 * MINUTE })
        );
        assert_eq!(staking.unstake(&mut assets, &account, 10 * MINUTE).unwrap(), 100);
        assert_eq!(
            staking.unstake(&mut assets, &account, 10 * MINUTE),
            Err(GovernanceError::NoDeposit(account))
        );
        let lp = assets.token(&staking.accounts().deposit_token).unwrap();
        assert_eq!(lp.balance_of(&account), 100);
    }

    #[test]
    fn test_restake_resets_timestamp() {
        let (mut assets, mut staking, account) = setup();
        staking.stake(&mut assets, &account, 0, 50).unwrap();
        staking.stake(&mut assets, &account, 5 * MINUTE, 50).unwrap();

        let deposit = staking.deposit(&account).unwrap();
        assert_eq!(deposit.amount, 100);
        assert_eq!(deposit.deposited_at, 5 * MINUTE);
        assert!(staking.unstake(&mut assets, &account, 10 * MINUTE).is_err());
    }
}
