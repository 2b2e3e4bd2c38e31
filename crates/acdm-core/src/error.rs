use acdm_types::{Address, Amount, TypesError};
use thiserror::Error;

use crate::access::Role;

/// Errors raised by the ledger collaborators.
///
/// Any of these is fatal to the enclosing operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("Insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Insufficient allowance: {spender} may spend {available} of {owner}, required {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Account {account} is missing role {role:?}")]
    MissingRole { role: Role, account: Address },

    #[error("Unknown token: {0}")]
    UnknownToken(Address),

    #[error("Token already deployed at {0}")]
    TokenExists(Address),

    #[error("Zero address not allowed")]
    ZeroAddress,

    #[error("No pool for token {0}")]
    PoolNotFound(Address),

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Insufficient input amount")]
    InsufficientInputAmount,

    #[error("Insufficient output amount: minimum {minimum}, got {actual}")]
    InsufficientOutputAmount { minimum: Amount, actual: Amount },

    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] TypesError),
}

impl CoreError {
    /// Overflow shorthand for checked arithmetic.
    pub fn overflow() -> Self {
        CoreError::Arithmetic(TypesError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InsufficientAllowance {
            owner: Address::ZERO,
            spender: Address::ZERO,
            required: 10,
            available: 3,
        };
        assert!(err.to_string().contains("required 10"));
    }

    #[test]
    fn test_overflow_converts() {
        assert_eq!(CoreError::overflow(), CoreError::from(TypesError::Overflow));
    }
}
