use acdm_core::CoreError;
use acdm_governance::GovernanceError;
use acdm_platform::PlatformError;
use acdm_types::TypesError;
use thiserror::Error;

/// Errors surfaced by the ledger runtime.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error("Unknown proposal reference: {0}")]
    UnknownProposal(String),

    #[error("{0} does not support this operation")]
    UnsupportedTarget(String),

    #[error("Invalid call data: {0}")]
    InvalidCallData(String),
}

impl LedgerError {
    /// Name of the failing variant, innermost first, for scenario checks.
    pub fn kind(&self) -> String {
        let debug = match self {
            LedgerError::Platform(PlatformError::Core(inner))
            | LedgerError::Governance(GovernanceError::Core(inner)) => format!("{inner:?}"),
            LedgerError::Platform(inner) => format!("{inner:?}"),
            LedgerError::Governance(inner) => format!("{inner:?}"),
            LedgerError::Core(inner) => format!("{inner:?}"),
            LedgerError::Types(inner) => format!("{inner:?}"),
            other => format!("{other:?}"),
        };
        debug
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

/// A scenario step whose outcome differs from what the file expects.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("Step {step} failed: {error}")]
    Failed { step: usize, error: LedgerError },

    #[error("Step {step} succeeded but {expected} was expected")]
    UnexpectedSuccess { step: usize, expected: String },

    #[error("Step {step} failed with {actual} but {expected} was expected")]
    WrongError {
        step: usize,
        expected: String,
        actual: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use acdm_types::Address;

    #[test]
    fn test_kind_names_inner_variant() {
        assert_eq!(LedgerError::from(PlatformError::InvalidAmount).kind(), "InvalidAmount");
        let err = LedgerError::from(GovernanceError::ZeroWeight(Address::from_label("a")));
        assert_eq!(err.kind(), "ZeroWeight");
        assert_eq!(LedgerError::UnknownProposal("#3".into()).kind(), "UnknownProposal");

        let core = CoreError::ZeroAddress;
        assert_eq!(LedgerError::from(PlatformError::Core(core)).kind(), "ZeroAddress");
    }
}
