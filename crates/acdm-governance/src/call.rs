//! Proposal execution seam and the governance contract's own settings calls.

use acdm_types::Address;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// Delivers a finished proposal's call data to its recipient.
///
/// `sender` is the governance contract itself; failures surface as a
/// message and abort the proposal's finish.
pub trait CallExecutor {
    fn execute(&mut self, sender: Address, recipient: Address, call_data: &[u8]) -> Result<(), String>;
}

impl<F> CallExecutor for F
where
    F: FnMut(Address, Address, &[u8]) -> Result<(), String>,
{
    fn execute(&mut self, sender: Address, recipient: Address, call_data: &[u8]) -> Result<(), String> {
        self(sender, recipient, call_data)
    }
}

/// Settings changes addressed to the governance contract.
///
/// Quorum and debating period need `DaoSettings`; the staking parameters
/// need `StakingSettings`.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceCall {
    SetMinimumQuorum { value: u64 },
    SetDebatingPeriodDuration { value: u64 },
    SetDepositHoldTimeMin { value: u64 },
    SetMaturityPeriodMin { value: u64 },
    SetRatePercent { value: u64 },
}

impl GovernanceCall {
    pub fn encode(&self) -> Result<Vec<u8>, GovernanceError> {
        borsh::to_vec(self).map_err(|e| GovernanceError::InvalidCall(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, GovernanceError> {
        borsh::from_slice(data).map_err(|e| GovernanceError::InvalidCall(e.to_string()))
    }
}
