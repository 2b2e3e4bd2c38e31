//! Administrative calls, delivered as borsh-encoded call data.
//!
//! These are the only way to change commission rates or move treasury
//! funds, and they are accepted only from the holder of the `Dao` role.

use acdm_types::Amount;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;
use crate::referral::{RoundKind, Tier};

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformCall {
    /// Replace one referral commission fraction
    SetCommission {
        tier: Tier,
        round: RoundKind,
        coefficient: u64,
        decimals: u32,
    },
    /// Pay retained native revenue to the platform owner
    SendToOwner { amount: Amount },
    /// Swap the whole native treasury for the treasury token
    SwapNativeForTokens { amount_out_min: Amount },
    /// Burn treasury tokens held by the platform
    BurnTreasuryTokens { amount: Amount },
}

impl PlatformCall {
    pub fn encode(&self) -> Result<Vec<u8>, PlatformError> {
        borsh::to_vec(self).map_err(|e| PlatformError::InvalidCall(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, PlatformError> {
        borsh::from_slice(data).map_err(|e| PlatformError::InvalidCall(e.to_string()))
    }
}
