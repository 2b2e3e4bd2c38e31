//! ACDM Core - the ledger collaborators the platform and governance run against.
//!
//! This crate provides:
//! - Fungible tokens with allowances and role-gated mint/burn
//! - Native currency balances
//! - Role-based capability checks
//! - A constant-product router for native/token pools
//! - `AssetState`, the bundle of all of the above

pub mod access;
pub mod error;
pub mod native;
pub mod router;
pub mod state;
pub mod token;

pub use access::{AccessControl, Role};
pub use error::CoreError;
pub use native::NativeLedger;
pub use router::{Pool, Router, MINIMUM_LIQUIDITY};
pub use state::AssetState;
pub use token::{Token, TokenInfo};
