//! ACDM Node - the ledger runtime.
//!
//! This crate ties the platform and governance crates into one owned state
//! that executes operations serially with full rollback, and provides the
//! configuration, logging and scenario replay used by the `acdm-node` binary.

pub mod account;
pub mod config;
pub mod error;
pub mod genesis;
pub mod ledger;
pub mod scenario;
pub mod telemetry;

pub use account::AccountRef;
pub use config::NodeConfig;
pub use error::{LedgerError, ScenarioError};
pub use genesis::Deployment;
pub use ledger::{Contract, Ledger, Operation, ProposalCall, ProposalRef, Receipt};
pub use scenario::{Scenario, Step, StepOutcome};
