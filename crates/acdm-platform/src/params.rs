//! Deployment parameters of the platform.

use acdm_types::Amount;
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;
use crate::referral::CommissionConfig;
use crate::round::PriceSchedule;

/// Three days.
pub const DEFAULT_ROUND_DURATION_MS: u64 = 3 * 24 * 60 * 60 * 1000;
/// 0.00001 native per whole token, in 18-decimal native units
pub const DEFAULT_BASE_PRICE: u64 = 10_000_000_000_000;
pub const DEFAULT_PRICE_STEP: u64 = 4_000_000_000_000;
pub const DEFAULT_PRICE_GROWTH_PERCENT: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformParams {
    /// Length of every sale and trade round
    pub round_duration_ms: u64,
    /// Price of the first sale round
    pub base_price: u64,
    pub price_step: u64,
    pub price_growth_percent: u64,
    pub commissions: CommissionConfig,
}

impl Default for PlatformParams {
    fn default() -> Self {
        Self {
            round_duration_ms: DEFAULT_ROUND_DURATION_MS,
            base_price: DEFAULT_BASE_PRICE,
            price_step: DEFAULT_PRICE_STEP,
            price_growth_percent: DEFAULT_PRICE_GROWTH_PERCENT,
            commissions: CommissionConfig::default(),
        }
    }
}

impl PlatformParams {
    pub fn schedule(&self) -> PriceSchedule {
        PriceSchedule {
            base_price: Amount::from(self.base_price),
            price_step: Amount::from(self.price_step),
            growth_percent: Amount::from(self.price_growth_percent),
        }
    }

    pub fn validate(&self) -> Result<(), PlatformError> {
        if self.round_duration_ms == 0 {
            return Err(PlatformError::InvalidParameter("round_duration_ms must be positive".into()));
        }
        if self.base_price == 0 {
            return Err(PlatformError::InvalidParameter("base_price must be positive".into()));
        }
        self.commissions.validate()
    }
}
