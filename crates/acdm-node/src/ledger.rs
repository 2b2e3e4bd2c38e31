//! The ledger runtime.
//!
//! Owns the whole system state and runs operations one at a time. Each
//! operation runs against the live state after a snapshot is taken; on any
//! error the snapshot is restored, so a failed operation leaves no trace,
//! including changes made by a proposal's call into the platform.

use acdm_core::{AssetState, CoreError, Role};
use acdm_governance::{CallExecutor, DaoStaking, FinishOutcome, GovernanceCall};
use acdm_platform::{AcdmPlatform, PlatformCall, Purchase, Redemption, SaleRoundStarted};
use acdm_types::{Address, Amount, Hash, Timestamp};
use serde::{Deserialize, Serialize};

use crate::account::AccountRef;
use crate::config::NodeConfig;
use crate::error::LedgerError;
use crate::genesis::{self, Deployment};

/// Deployed contracts that operations can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Contract {
    Platform,
    Dao,
    Router,
    Acdm,
    Xxx,
    Lp,
}

impl Contract {
    pub fn address(&self, deployment: &Deployment) -> Address {
        match self {
            Contract::Platform => deployment.platform,
            Contract::Dao => deployment.dao,
            Contract::Router => deployment.router,
            Contract::Acdm => deployment.acdm,
            Contract::Xxx => deployment.xxx,
            Contract::Lp => deployment.lp,
        }
    }

    fn token(&self, deployment: &Deployment) -> Result<Address, LedgerError> {
        match self {
            Contract::Acdm | Contract::Xxx | Contract::Lp => Ok(self.address(deployment)),
            other => Err(LedgerError::UnsupportedTarget(format!("{other:?}"))),
        }
    }
}

/// Call data of a proposal, typed or raw hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalCall {
    Platform(PlatformCall),
    Governance(GovernanceCall),
    Raw(String),
}

impl ProposalCall {
    pub fn encode(&self) -> Result<Vec<u8>, LedgerError> {
        match self {
            ProposalCall::Platform(call) => Ok(call.encode()?),
            ProposalCall::Governance(call) => Ok(call.encode()?),
            ProposalCall::Raw(data) => {
                let data = data.strip_prefix("0x").unwrap_or(data);
                hex::decode(data).map_err(|e| LedgerError::InvalidCallData(e.to_string()))
            }
        }
    }
}

/// A proposal by creation order or by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProposalRef {
    Index(usize),
    Id(Hash),
}

/// Every entry point of the system, as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Issue native currency; owner only
    Faucet { to: AccountRef, amount: Amount },
    Mint { token: Contract, to: AccountRef, amount: Amount },
    Transfer { token: Contract, to: AccountRef, amount: Amount },
    Approve { token: Contract, spender: AccountRef, amount: Amount },
    GrantRole { contract: Contract, role: Role, account: AccountRef },
    /// Deposit XXX and native currency into the XXX pool
    AddLiquidityNative { token_amount: Amount, native_amount: Amount },
    StartSaleRound,
    StartTradeRound,
    BuyAcdm { payment: Amount },
    AddOrder { amount: Amount, unit_price: Amount },
    RemoveOrder { id: u64 },
    RedeemOrder { payment: Amount },
    Register { referrer: Option<AccountRef> },
    /// Call the platform's administrative surface directly
    PlatformCall { call: PlatformCall },
    /// Call the DAO's settings surface directly
    GovernanceCall { call: GovernanceCall },
    Stake { amount: Amount },
    Claim,
    Unstake,
    AddProposal { recipient: AccountRef, description: String, call: ProposalCall },
    Vote { proposal: ProposalRef, support: bool },
    FinishProposal { proposal: ProposalRef },
}

/// What a successful operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receipt {
    Done,
    LiquidityAdded { minted: Amount },
    SaleRoundStarted(SaleRoundStarted),
    TradeRoundStarted { burned: Amount },
    Purchased(Purchase),
    OrderAdded { id: u64 },
    OrderRemoved { returned: Amount },
    Redeemed(Redemption),
    Claimed { reward: Amount },
    Unstaked { amount: Amount },
    ProposalAdded { id: Hash },
    Voted { weight: Amount },
    ProposalFinished(FinishOutcome),
}

/// Delivers DAO proposal calls to the platform, the only other contract
/// that accepts call data.
struct PlatformExecutor<'a> {
    assets: &'a mut AssetState,
    platform: &'a mut AcdmPlatform,
}

impl CallExecutor for PlatformExecutor<'_> {
    fn execute(&mut self, sender: Address, recipient: Address, call_data: &[u8]) -> Result<(), String> {
        if recipient != self.platform.address() {
            return Err(format!("no contract accepting calls at {recipient}"));
        }
        self.platform
            .execute_call(self.assets, &sender, call_data)
            .map_err(|e| e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    deployment: Deployment,
    assets: AssetState,
    platform: AcdmPlatform,
    dao: DaoStaking,
    proposal_ids: Vec<Hash>,
    committed: u64,
}

impl Ledger {
    pub fn genesis(config: &NodeConfig) -> Result<Self, LedgerError> {
        let state = genesis::build(config)?;
        Ok(Self {
            deployment: state.deployment,
            assets: state.assets,
            platform: state.platform,
            dao: state.dao,
            proposal_ids: Vec::new(),
            committed: 0,
        })
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn assets(&self) -> &AssetState {
        &self.assets
    }

    pub fn platform(&self) -> &AcdmPlatform {
        &self.platform
    }

    pub fn dao(&self) -> &DaoStaking {
        &self.dao
    }

    /// Proposal ids in creation order.
    pub fn proposal_ids(&self) -> &[Hash] {
        &self.proposal_ids
    }

    /// Number of operations committed so far.
    pub fn committed(&self) -> u64 {
        self.committed
    }

    pub fn native_balance(&self, account: &Address) -> Amount {
        self.assets.native.balance_of(account)
    }

    pub fn token_balance(&self, token: Contract, account: &Address) -> Result<Amount, LedgerError> {
        let address = token.token(&self.deployment)?;
        Ok(self.assets.token(&address)?.balance_of(account))
    }

    pub fn resolve_proposal(&self, proposal: ProposalRef) -> Result<Hash, LedgerError> {
        match proposal {
            ProposalRef::Index(i) => self
                .proposal_ids
                .get(i)
                .copied()
                .ok_or_else(|| LedgerError::UnknownProposal(format!("#{i}"))),
            ProposalRef::Id(id) => Ok(id),
        }
    }

    /// Run `op` for `caller` at `now`. Either every effect commits or none do.
    pub fn execute(&mut self, caller: &Address, now: Timestamp, op: Operation) -> Result<Receipt, LedgerError> {
        let snapshot = self.clone();
        tracing::debug!(%caller, now, ?op, "executing");
        match self.apply(caller, now, op) {
            Ok(receipt) => {
                self.committed += 1;
                tracing::debug!(height = self.committed, ?receipt, "committed");
                Ok(receipt)
            }
            Err(err) => {
                *self = snapshot;
                tracing::warn!(%caller, now, error = %err, "rolled back");
                Err(err)
            }
        }
    }

    fn apply(&mut self, caller: &Address, now: Timestamp, op: Operation) -> Result<Receipt, LedgerError> {
        let d = self.deployment;
        let receipt = match op {
            Operation::Faucet { to, amount } => {
                if *caller != d.owner {
                    return Err(CoreError::MissingRole {
                        role: Role::Admin,
                        account: *caller,
                    }
                    .into());
                }
                self.assets.native.issue(to.address(), amount)?;
                Receipt::Done
            }
            Operation::Mint { token, to, amount } => {
                let token = token.token(&d)?;
                self.assets.token_mut(&token)?.mint(caller, &to.address(), amount)?;
                Receipt::Done
            }
            Operation::Transfer { token, to, amount } => {
                let token = token.token(&d)?;
                self.assets.token_mut(&token)?.transfer(caller, &to.address(), amount)?;
                Receipt::Done
            }
            Operation::Approve { token, spender, amount } => {
                let token = token.token(&d)?;
                self.assets.token_mut(&token)?.approve(caller, &spender.address(), amount)?;
                Receipt::Done
            }
            Operation::GrantRole { contract, role, account } => {
                let access = match contract {
                    Contract::Platform => self.platform.access_mut(),
                    Contract::Dao => self.dao.access_mut(),
                    Contract::Router => {
                        return Err(LedgerError::UnsupportedTarget(format!("{contract:?}")));
                    }
                    token => {
                        let token = token.token(&d)?;
                        self.assets.token_mut(&token)?.access_mut()
                    }
                };
                access.grant_role_as(caller, role, account.address())?;
                Receipt::Done
            }
            Operation::AddLiquidityNative {
                token_amount,
                native_amount,
            } => {
                let minted = self
                    .assets
                    .add_liquidity_native(caller, &d.xxx, token_amount, native_amount)?;
                Receipt::LiquidityAdded { minted }
            }
            Operation::StartSaleRound => {
                Receipt::SaleRoundStarted(self.platform.start_sale_round(&mut self.assets, now)?)
            }
            Operation::StartTradeRound => {
                let burned = self.platform.start_trade_round(&mut self.assets, now)?;
                Receipt::TradeRoundStarted { burned }
            }
            Operation::BuyAcdm { payment } => {
                Receipt::Purchased(self.platform.buy_acdm(&mut self.assets, caller, now, payment)?)
            }
            Operation::AddOrder { amount, unit_price } => {
                let id = self.platform.add_order(&mut self.assets, caller, amount, unit_price)?;
                Receipt::OrderAdded { id }
            }
            Operation::RemoveOrder { id } => {
                let returned = self.platform.remove_order(&mut self.assets, caller, id)?;
                Receipt::OrderRemoved { returned }
            }
            Operation::RedeemOrder { payment } => {
                Receipt::Redeemed(self.platform.redeem_order(&mut self.assets, caller, payment)?)
            }
            Operation::Register { referrer } => {
                let referrer = referrer.map_or(Address::ZERO, |r| r.address());
                self.platform.register(caller, referrer)?;
                Receipt::Done
            }
            Operation::PlatformCall { call } => {
                self.platform.execute_call(&mut self.assets, caller, &call.encode()?)?;
                Receipt::Done
            }
            Operation::GovernanceCall { call } => {
                self.dao.execute_call(caller, &call.encode()?)?;
                Receipt::Done
            }
            Operation::Stake { amount } => {
                self.dao.stake(&mut self.assets, caller, now, amount)?;
                Receipt::Done
            }
            Operation::Claim => {
                let reward = self.dao.claim(&mut self.assets, caller, now)?;
                Receipt::Claimed { reward }
            }
            Operation::Unstake => {
                let amount = self.dao.unstake(&mut self.assets, caller, now)?;
                Receipt::Unstaked { amount }
            }
            Operation::AddProposal {
                recipient,
                description,
                call,
            } => {
                let data = call.encode()?;
                let id = self
                    .dao
                    .add_proposal(caller, recipient.address(), description, data, now)?;
                self.proposal_ids.push(id);
                Receipt::ProposalAdded { id }
            }
            Operation::Vote { proposal, support } => {
                let id = self.resolve_proposal(proposal)?;
                let weight = self.dao.vote(&id, caller, support, now)?;
                Receipt::Voted { weight }
            }
            Operation::FinishProposal { proposal } => {
                let id = self.resolve_proposal(proposal)?;
                let mut executor = PlatformExecutor {
                    assets: &mut self.assets,
                    platform: &mut self.platform,
                };
                Receipt::ProposalFinished(self.dao.finish_proposal(&id, now, &mut executor)?)
            }
        };
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn ledger() -> Ledger {
        Ledger::genesis(&NodeConfig::default()).unwrap()
    }

    #[test]
    fn test_failed_operation_rolls_back() {
        let mut ledger = ledger();
        let owner = ledger.deployment().owner;
        ledger
            .execute(&owner, 0, Operation::Faucet { to: "alice".into(), amount: 10 })
            .unwrap();
        assert_eq!(ledger.committed(), 1);

        let err = ledger
            .execute(&addr("alice"), 0, Operation::Faucet { to: "alice".into(), amount: 10 })
            .unwrap_err();
        assert_eq!(err.kind(), "MissingRole");
        assert_eq!(ledger.native_balance(&addr("alice")), 10);
        assert_eq!(ledger.committed(), 1);
    }

    #[test]
    fn test_token_ops_reject_non_tokens() {
        let mut ledger = ledger();
        let err = ledger
            .execute(
                &addr("alice"),
                0,
                Operation::Approve {
                    token: Contract::Platform,
                    spender: "bob".into(),
                    amount: 1,
                },
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnsupportedTarget(_)));
    }

    #[test]
    fn test_unknown_proposal_index() {
        let mut ledger = ledger();
        let err = ledger
            .execute(&addr("alice"), 0, Operation::Vote { proposal: ProposalRef::Index(0), support: true })
            .unwrap_err();
        assert_eq!(err, LedgerError::UnknownProposal("#0".into()));
    }

    #[test]
    fn test_owner_grants_roles() {
        let mut ledger = ledger();
        let owner = ledger.deployment().owner;
        ledger
            .execute(
                &owner,
                0,
                Operation::GrantRole {
                    contract: Contract::Dao,
                    role: Role::Chair,
                    account: "alice".into(),
                },
            )
            .unwrap();
        assert!(ledger.dao().access().has_role(Role::Chair, &addr("alice")));

        let err = ledger
            .execute(
                &addr("alice"),
                0,
                Operation::GrantRole {
                    contract: Contract::Acdm,
                    role: Role::Minter,
                    account: "alice".into(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::MissingRole { .. })));
    }

    #[test]
    fn test_operation_json_forms() {
        let op: Operation = serde_json::from_str(r#""start_sale_round""#).unwrap();
        assert_eq!(op, Operation::StartSaleRound);

        let op: Operation =
            serde_json::from_str(r#"{"buy_acdm":{"payment":100000000000000000000}}"#).unwrap();
        assert_eq!(op, Operation::BuyAcdm { payment: 100_000_000_000_000_000_000 });

        let op: Operation = serde_json::from_str(r#"{"vote":{"proposal":0,"support":true}}"#).unwrap();
        assert_eq!(op, Operation::Vote { proposal: ProposalRef::Index(0), support: true });

        let op: Operation = serde_json::from_str(
            r#"{"add_proposal":{"recipient":"platform","description":"burn","call":{"platform":{"burn_treasury_tokens":{"amount":5}}}}}"#,
        )
        .unwrap();
        let Operation::AddProposal { recipient, call, .. } = op else {
            panic!("wrong variant");
        };
        assert_eq!(recipient.address(), addr("platform"));
        assert_eq!(
            call.encode().unwrap(),
            PlatformCall::BurnTreasuryTokens { amount: 5 }.encode().unwrap()
        );
    }

    #[test]
    fn test_raw_call_data() {
        assert_eq!(ProposalCall::Raw("0xdead".into()).encode().unwrap(), vec![0xde, 0xad]);
        assert!(matches!(
            ProposalCall::Raw("zz".into()).encode(),
            Err(LedgerError::InvalidCallData(_))
        ));
    }
}
