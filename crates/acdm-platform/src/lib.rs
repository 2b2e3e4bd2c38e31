//! ACDM Platform - the token issuance and trading venue.
//!
//! This crate provides:
//! - The sale/trade round state machine and sale price progression
//! - The primary sale and the secondary-market order book
//! - The two-level referral registry and commission splitting
//! - Administrative call data accepted from governance

pub mod call;
pub mod error;
pub mod orders;
pub mod params;
pub mod platform;
pub mod referral;
pub mod round;

pub use call::PlatformCall;
pub use error::PlatformError;
pub use orders::{Order, OrderBook};
pub use params::PlatformParams;
pub use platform::{AcdmPlatform, Fill, PlatformAccounts, Purchase, Redemption, SaleRoundStarted};
pub use referral::{CommissionConfig, ReferralRegistry, RoundKind, Split, Tier, TierCommission};
pub use round::{Phase, PriceSchedule, RoundState};
