//! Scenario replay.
//!
//! A scenario is a JSON file of steps run in order against one ledger:
//!
//! ```json
//! { "steps": [
//!     { "at": 0, "caller": "owner", "op": "start_sale_round" },
//!     { "at": 1, "caller": "alice", "op": { "buy_acdm": { "payment": 5 } },
//!       "expect_error": "RoundClosed" }
//! ] }
//! ```
//!
//! `caller` and every account field accept labels or addresses.
//! `expect_error` names the error variant the step must fail with.

use std::path::Path;

use acdm_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::account::AccountRef;
use crate::error::ScenarioError;
use crate::ledger::{Ledger, Operation, Receipt};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Block time in milliseconds
    pub at: Timestamp,
    pub caller: AccountRef,
    pub op: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

/// Result of one replayed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Committed(Receipt),
    /// Failed as expected, with the named error
    Rejected(String),
}

impl Scenario {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read scenario '{}': {}", path.display(), e))?;
        serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse scenario '{}': {}", path.display(), e))
    }

    /// Replay every step, stopping at the first one whose outcome differs
    /// from the expectation.
    pub fn run(&self, ledger: &mut Ledger) -> Result<Vec<StepOutcome>, ScenarioError> {
        let mut outcomes = Vec::with_capacity(self.steps.len());
        for (step, s) in self.steps.iter().enumerate() {
            let result = ledger.execute(&s.caller.address(), s.at, s.op.clone());
            let outcome = match (result, &s.expect_error) {
                (Ok(receipt), None) => StepOutcome::Committed(receipt),
                (Ok(_), Some(expected)) => {
                    return Err(ScenarioError::UnexpectedSuccess {
                        step,
                        expected: expected.clone(),
                    })
                }
                (Err(error), None) => return Err(ScenarioError::Failed { step, error }),
                (Err(error), Some(expected)) => {
                    let actual = error.kind();
                    if actual != *expected {
                        return Err(ScenarioError::WrongError {
                            step,
                            expected: expected.clone(),
                            actual,
                        });
                    }
                    StepOutcome::Rejected(actual)
                }
            };
            tracing::info!(step, at = s.at, caller = %s.caller, ?outcome, "step replayed");
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
