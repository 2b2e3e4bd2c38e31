use acdm_core::{CoreError, Role};
use acdm_types::{Address, TypesError};
use thiserror::Error;

/// Errors raised by the sale/trade platform.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlatformError {
    /// Round transition attempted from the wrong phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Round closed: {0}")]
    RoundClosed(String),

    #[error("Wrong amount")]
    InvalidAmount,

    #[error("Wrong price")]
    InvalidPrice,

    #[error("Order {0} does not exist")]
    NotFound(u64),

    #[error("Order {order} was not created by {caller}")]
    NotOwner { order: u64, caller: Address },

    #[error("Account {0} is already registered")]
    AlreadyRegistered(Address),

    #[error("Referrer {0} is not registered")]
    UnregisteredReferrer(Address),

    #[error("Invalid commission: {0}")]
    InvalidCommission(String),

    #[error("Invalid call data: {0}")]
    InvalidCall(String),

    #[error("Unauthorized: {account} lacks {role:?}")]
    Unauthorized { role: Role, account: Address },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Core(CoreError),

    #[error("Arithmetic error: {0}")]
    Arithmetic(TypesError),
}

impl From<CoreError> for PlatformError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingRole { role, account } => PlatformError::Unauthorized { role, account },
            CoreError::Arithmetic(inner) => PlatformError::Arithmetic(inner),
            other => PlatformError::Core(other),
        }
    }
}

impl From<TypesError> for PlatformError {
    fn from(err: TypesError) -> Self {
        PlatformError::Arithmetic(err)
    }
}

impl PlatformError {
    pub fn overflow() -> Self {
        PlatformError::Arithmetic(TypesError::Overflow)
    }

    /// Whether the failure came from a missing token pre-authorization.
    pub fn is_insufficient_allowance(&self) -> bool {
        matches!(self, PlatformError::Core(CoreError::InsufficientAllowance { .. }))
    }
}
