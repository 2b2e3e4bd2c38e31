//! ACDM Governance - staking-weighted proposals over the ACDM platform.
//!
//! This crate provides:
//! - The staking ledger (deposits, matured rewards, hold-gated withdrawal)
//! - The proposal engine (chair-created proposals, weighted votes, quorum)
//! - `DaoStaking`, combining the two with self-addressed settings calls

pub mod call;
pub mod dao;
pub mod error;
pub mod proposal;
pub mod staking;
pub mod voting;

pub use call::{CallExecutor, GovernanceCall};
pub use dao::{DaoAccounts, DaoStaking};
pub use error::GovernanceError;
pub use proposal::{proposal_id, DaoParams, FinishOutcome, PendingExecution, Proposal, ProposalEngine, Vote};
pub use staking::{Deposit, StakingAccounts, StakingLedger, StakingParams};
pub use voting::VotingPower;
