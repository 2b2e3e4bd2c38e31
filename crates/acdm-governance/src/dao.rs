//! `DaoStaking`: the proposal engine weighted by the staking ledger.
//!
//! The contract's own address is the staking custody account and the
//! identity under which finished proposals make their calls. Proposals
//! addressed to that address are decoded as [`GovernanceCall`]s and applied
//! in place; everything else goes through the supplied [`CallExecutor`].

use acdm_core::{AccessControl, AssetState, Role};
use acdm_types::{Address, Amount, Hash, Timestamp};
use serde::{Deserialize, Serialize};

use crate::call::{CallExecutor, GovernanceCall};
use crate::error::GovernanceError;
use crate::proposal::{DaoParams, FinishOutcome, Proposal, ProposalEngine, Vote};
use crate::staking::{Deposit, StakingAccounts, StakingLedger, StakingParams};

/// Addresses a `DaoStaking` instance is deployed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoAccounts {
    pub address: Address,
    /// Holds `Admin` on the governance roles
    pub admin: Address,
    /// Staked token (LP)
    pub deposit_token: Address,
    /// Reward token (XXX)
    pub reward_token: Address,
}

#[derive(Debug, Clone)]
pub struct DaoStaking {
    address: Address,
    proposals: ProposalEngine,
    staking: StakingLedger,
}

impl DaoStaking {
    /// Deploy with `StakingSettings` held by the contract itself, so staking
    /// parameters change only through a passed proposal.
    pub fn new(
        accounts: DaoAccounts,
        dao_params: DaoParams,
        staking_params: StakingParams,
    ) -> Result<Self, GovernanceError> {
        let mut proposals = ProposalEngine::new(accounts.admin, dao_params)?;
        proposals
            .access_mut()
            .grant_role(Role::StakingSettings, accounts.address);
        let staking = StakingLedger::new(
            StakingAccounts {
                custody: accounts.address,
                deposit_token: accounts.deposit_token,
                reward_token: accounts.reward_token,
            },
            staking_params,
        );
        Ok(Self {
            address: accounts.address,
            proposals,
            staking,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn access(&self) -> &AccessControl {
        self.proposals.access()
    }

    pub fn access_mut(&mut self) -> &mut AccessControl {
        self.proposals.access_mut()
    }

    pub fn proposals(&self) -> &ProposalEngine {
        &self.proposals
    }

    pub fn staking(&self) -> &StakingLedger {
        &self.staking
    }

    pub fn deposit(&self, account: &Address) -> Option<&Deposit> {
        self.staking.deposit(account)
    }

    pub fn proposal(&self, id: &Hash) -> Option<&Proposal> {
        self.proposals.proposal(id)
    }

    pub fn vote_of(&self, id: &Hash, account: &Address) -> Option<&Vote> {
        self.proposals.vote_of(id, account)
    }

    pub fn locked_until(&self, account: &Address) -> Timestamp {
        self.proposals.locked_until(account)
    }

    pub fn minimum_quorum(&self) -> u64 {
        self.proposals.minimum_quorum()
    }

    pub fn debating_period_duration(&self) -> u64 {
        self.proposals.debating_period_duration()
    }

    pub fn deposit_hold_time_min(&self) -> u64 {
        self.staking.params().deposit_hold_time_min
    }

    pub fn maturity_period_min(&self) -> u64 {
        self.staking.params().maturity_period_min
    }

    pub fn rate_percent(&self) -> u64 {
        self.staking.params().rate_percent
    }

    pub fn stake(
        &mut self,
        assets: &mut AssetState,
        caller: &Address,
        now: Timestamp,
        amount: Amount,
    ) -> Result<(), GovernanceError> {
        self.staking.stake(assets, caller, now, amount)
    }

    pub fn claim(&mut self, assets: &mut AssetState, caller: &Address, now: Timestamp) -> Result<Amount, GovernanceError> {
        self.staking.claim(assets, caller, now)
    }

    pub fn unstake(
        &mut self,
        assets: &mut AssetState,
        caller: &Address,
        now: Timestamp,
    ) -> Result<Amount, GovernanceError> {
        if self.proposals.params().enforce_voter_lock {
            let until = self.proposals.locked_until(caller);
            if now < until {
                return Err(GovernanceError::VoteLockActive { until });
            }
        }
        self.staking.unstake(assets, caller, now)
    }

    pub fn add_proposal(
        &mut self,
        caller: &Address,
        recipient: Address,
        description: String,
        call_data: Vec<u8>,
        now: Timestamp,
    ) -> Result<Hash, GovernanceError> {
        self.proposals
            .add_proposal(caller, recipient, description, call_data, now)
    }

    /// Vote with the caller's current stake.
    pub fn vote(&mut self, id: &Hash, voter: &Address, support: bool, now: Timestamp) -> Result<Amount, GovernanceError> {
        self.proposals.vote(id, voter, support, now, &self.staking)
    }

    pub fn finish_proposal(
        &mut self,
        id: &Hash,
        now: Timestamp,
        executor: &mut impl CallExecutor,
    ) -> Result<FinishOutcome, GovernanceError> {
        let pending = self.proposals.prepare_finish(id, now)?;
        let outcome = if !pending.execute {
            FinishOutcome::Rejected
        } else if pending.recipient == self.address {
            let sender = self.address;
            self.execute_call(&sender, &pending.call_data)
                .map_err(|e| GovernanceError::RecipientCallFailed(e.to_string()))?;
            FinishOutcome::Executed
        } else {
            executor
                .execute(self.address, pending.recipient, &pending.call_data)
                .map_err(GovernanceError::RecipientCallFailed)?;
            FinishOutcome::Executed
        };
        self.proposals.mark_finished(id)?;
        tracing::info!(%id, ?outcome, "proposal finished");
        Ok(outcome)
    }

    /// Decode and apply a settings call on behalf of `caller`.
    pub fn execute_call(&mut self, caller: &Address, call_data: &[u8]) -> Result<(), GovernanceError> {
        let call = GovernanceCall::decode(call_data)?;
        tracing::debug!(%caller, ?call, "governance call");
        match call {
            GovernanceCall::SetMinimumQuorum { value } => self.proposals.set_minimum_quorum(caller, value),
            GovernanceCall::SetDebatingPeriodDuration { value } => {
                self.proposals.set_debating_period_duration(caller, value)
            }
            GovernanceCall::SetDepositHoldTimeMin { value } => {
                self.ensure_staking_settings(caller)?;
                self.staking.set_deposit_hold_time_min(value);
                Ok(())
            }
            GovernanceCall::SetMaturityPeriodMin { value } => {
                self.ensure_staking_settings(caller)?;
                self.staking.set_maturity_period_min(value);
                Ok(())
            }
            GovernanceCall::SetRatePercent { value } => {
                self.ensure_staking_settings(caller)?;
                self.staking.set_rate_percent(value);
                Ok(())
            }
        }
    }

    fn ensure_staking_settings(&self, caller: &Address) -> Result<(), GovernanceError> {
        Ok(self.proposals.access().ensure_role(Role::StakingSettings, caller)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staking::tests::{fund, test_assets, test_params, MINUTE};

    const DEBATE: u64 = 100;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    struct Fixture {
        assets: AssetState,
        dao: DaoStaking,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_params(DaoParams {
                minimum_quorum: 100,
                debating_period_ms: DEBATE,
                enforce_voter_lock: false,
            })
        }

        fn with_params(params: DaoParams) -> Self {
            let (mut assets, accounts, _) = test_assets(addr("dao"));
            let mut dao = DaoStaking::new(
                DaoAccounts {
                    address: accounts.custody,
                    admin: addr("admin"),
                    deposit_token: accounts.deposit_token,
                    reward_token: accounts.reward_token,
                },
                params,
                test_params(),
            )
            .unwrap();
            dao.access_mut().grant_role(Role::Chair, addr("chair"));
            dao.access_mut().grant_role(Role::DaoSettings, addr("settings"));

            for (label, amount) in [("alice", 100), ("bob", 40)] {
                fund(&mut assets, &accounts, &addr(label), amount);
                dao.stake(&mut assets, &addr(label), 0, amount).unwrap();
            }
            Self { assets, dao }
        }

        fn propose(&mut self, recipient: Address, call_data: Vec<u8>) -> Hash {
            self.dao
                .add_proposal(&addr("chair"), recipient, "test".into(), call_data, 0)
                .unwrap()
        }
    }

    fn no_external_calls() -> impl FnMut(Address, Address, &[u8]) -> Result<(), String> {
        |_, recipient, _| Err(format!("no contract at {recipient}"))
    }

    #[test]
    fn test_stake_weight_votes() {
        let mut fx = Fixture::new();
        let id = fx.propose(addr("target"), vec![]);
        assert_eq!(fx.dao.vote(&id, &addr("alice"), true, 1), Ok(100));
        assert_eq!(
            fx.dao.vote(&id, &addr("carol"), true, 1),
            Err(GovernanceError::ZeroWeight(addr("carol")))
        );
        assert_eq!(fx.dao.locked_until(&addr("alice")), DEBATE);
    }

    #[test]
    fn test_quorum_not_met() {
        let mut fx = Fixture::new();
        let id = fx.propose(addr("target"), vec![]);
        fx.dao.vote(&id, &addr("bob"), true, 1).unwrap();
        assert_eq!(
            fx.dao.finish_proposal(&id, DEBATE, &mut no_external_calls()),
            Err(GovernanceError::QuorumNotMet { actual: 40, required: 100 })
        );
    }

    #[test]
    fn test_cons_win_without_call() {
        let mut fx = Fixture::new();
        let id = fx.propose(addr("target"), vec![]);
        fx.dao.vote(&id, &addr("alice"), false, 1).unwrap();
        fx.dao.vote(&id, &addr("bob"), true, 1).unwrap();
        assert_eq!(
            fx.dao.finish_proposal(&id, DEBATE, &mut no_external_calls()),
            Ok(FinishOutcome::Rejected)
        );
        assert!(fx.dao.proposal(&id).unwrap().finished);
    }

    #[test]
    fn test_pros_win_external_call() {
        let mut fx = Fixture::new();
        let id = fx.propose(addr("target"), vec![7]);
        fx.dao.vote(&id, &addr("alice"), true, 1).unwrap();

        let mut delivered = None;
        let mut executor = |sender: Address, recipient: Address, data: &[u8]| -> Result<(), String> {
            delivered = Some((sender, recipient, data.to_vec()));
            Ok(())
        };
        assert_eq!(
            fx.dao.finish_proposal(&id, DEBATE, &mut executor),
            Ok(FinishOutcome::Executed)
        );
        assert_eq!(delivered, Some((addr("dao"), addr("target"), vec![7])));
    }

    #[test]
    fn test_wrong_call_data_keeps_proposal_open() {
        let mut fx = Fixture::new();
        let id = fx.propose(addr("dao"), vec![0xde, 0xad]);
        fx.dao.vote(&id, &addr("alice"), true, 1).unwrap();

        let err = fx.dao.finish_proposal(&id, DEBATE, &mut no_external_calls()).unwrap_err();
        assert!(matches!(err, GovernanceError::RecipientCallFailed(_)));
        assert!(!fx.dao.proposal(&id).unwrap().finished);
    }

    #[test]
    fn test_self_call_sets_hold_time() {
        let mut fx = Fixture::new();
        let call = GovernanceCall::SetDepositHoldTimeMin { value: 30 }.encode().unwrap();
        let id = fx.propose(addr("dao"), call);
        fx.dao.vote(&id, &addr("alice"), true, 1).unwrap();

        assert_eq!(
            fx.dao.finish_proposal(&id, DEBATE, &mut no_external_calls()),
            Ok(FinishOutcome::Executed)
        );
        assert_eq!(fx.dao.deposit_hold_time_min(), 30);
        assert!(matches!(
            fx.dao.unstake(&mut fx.assets, &addr("alice"), 10 * MINUTE),
            Err(GovernanceError::HoldPeriodActive { .. })
        ));
    }

    #[test]
    fn test_staking_setters_need_proposal() {
        let mut fx = Fixture::new();
        let call = GovernanceCall::SetRatePercent { value: 50 }.encode().unwrap();
        assert!(matches!(
            fx.dao.execute_call(&addr("settings"), &call),
            Err(GovernanceError::Unauthorized {
                role: Role::StakingSettings,
                ..
            })
        ));

        let quorum = GovernanceCall::SetMinimumQuorum { value: 7 }.encode().unwrap();
        fx.dao.execute_call(&addr("settings"), &quorum).unwrap();
        assert_eq!(fx.dao.minimum_quorum(), 7);
    }

    #[test]
    fn test_self_call_without_dao_settings_fails() {
        let mut fx = Fixture::new();
        let call = GovernanceCall::SetMinimumQuorum { value: 7 }.encode().unwrap();
        let id = fx.propose(addr("dao"), call);
        fx.dao.vote(&id, &addr("alice"), true, 1).unwrap();

        let err = fx.dao.finish_proposal(&id, DEBATE, &mut no_external_calls()).unwrap_err();
        assert!(matches!(err, GovernanceError::RecipientCallFailed(_)));
        assert_eq!(fx.dao.minimum_quorum(), 100);
    }

    #[test]
    fn test_voter_lock_enforced_when_enabled() {
        let mut params = DaoParams {
            minimum_quorum: 100,
            debating_period_ms: 60 * MINUTE,
            enforce_voter_lock: false,
        };
        let mut fx = Fixture::with_params(params);
        let id = fx.propose(addr("target"), vec![]);
        fx.dao.vote(&id, &addr("alice"), true, 1).unwrap();
        assert_eq!(fx.dao.unstake(&mut fx.assets, &addr("alice"), 10 * MINUTE), Ok(100));

        params.enforce_voter_lock = true;
        let mut fx = Fixture::with_params(params);
        let id = fx.propose(addr("target"), vec![]);
        fx.dao.vote(&id, &addr("alice"), true, 1).unwrap();
        assert_eq!(
            fx.dao.unstake(&mut fx.assets, &addr("alice"), 10 * MINUTE),
            Err(GovernanceError::VoteLockActive { until: 60 * MINUTE })
        );
        assert_eq!(fx.dao.unstake(&mut fx.assets, &addr("alice"), 60 * MINUTE), Ok(100));
        assert_eq!(fx.dao.locked_until(&addr("bob")), 0);
    }

    #[test]
    fn test_claim_after_maturity() {
        let mut fx = Fixture::new();
        let xxx = fx.dao.staking().accounts().reward_token;
        fx.assets
            .token_mut(&xxx)
            .unwrap()
            .mint(&addr("deployer"), &addr("dao"), 1_000)
            .unwrap();
        assert_eq!(fx.dao.claim(&mut fx.assets, &addr("alice"), 20 * MINUTE), Ok(20));
        assert_eq!(fx.assets.token(&xxx).unwrap().balance_of(&addr("alice")), 20);
    }
}
