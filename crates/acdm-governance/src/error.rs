use acdm_core::{CoreError, Role};
use acdm_types::{Address, Amount, Hash, Timestamp, TypesError};
use thiserror::Error;

/// Errors that can occur in governance operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GovernanceError {
    #[error("Proposal {0} does not exist")]
    NoSuchProposal(Hash),

    #[error("Proposal {0} already exists")]
    DuplicateProposal(Hash),

    #[error("Voting on {0} is closed")]
    VotingClosed(Hash),

    #[error("Voting on {0} is still open")]
    VotingStillOpen(Hash),

    #[error("Proposal {0} is already finished")]
    AlreadyFinished(Hash),

    #[error("{0} has no voting weight")]
    ZeroWeight(Address),

    #[error("{voter} already voted on {proposal}")]
    AlreadyVoted { proposal: Hash, voter: Address },

    #[error("Quorum not met: {actual} < {required}")]
    QuorumNotMet { actual: Amount, required: Amount },

    #[error("Recipient call failed: {0}")]
    RecipientCallFailed(String),

    #[error("Quorum is zero")]
    QuorumZero,

    #[error("Duration is zero")]
    DurationZero,

    #[error("{0} has no deposit")]
    NoDeposit(Address),

    #[error("Deposit is held until {until}")]
    HoldPeriodActive { until: Timestamp },

    #[error("Deposit is locked by open votes until {until}")]
    VoteLockActive { until: Timestamp },

    #[error("Invalid call data: {0}")]
    InvalidCall(String),

    #[error("Unauthorized: {account} lacks {role:?}")]
    Unauthorized { role: Role, account: Address },

    #[error(transparent)]
    Core(CoreError),

    #[error("Arithmetic error: {0}")]
    Arithmetic(TypesError),
}

impl From<CoreError> for GovernanceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingRole { role, account } => GovernanceError::Unauthorized { role, account },
            CoreError::Arithmetic(inner) => GovernanceError::Arithmetic(inner),
            other => GovernanceError::Core(other),
        }
    }
}

impl From<TypesError> for GovernanceError {
    fn from(err: TypesError) -> Self {
        GovernanceError::Arithmetic(err)
    }
}

impl GovernanceError {
    pub fn overflow() -> Self {
        GovernanceError::Arithmetic(TypesError::Overflow)
    }
}
