//! Monetary amounts, timestamps and checked fixed-point arithmetic.
//!
//! Every amount is an integer in the smallest unit of its asset (native
//! currency or token). Timestamps are milliseconds supplied by the caller.

use crate::error::TypesError;

/// Amount in the smallest unit of an asset.
pub type Amount = u128;

/// Milliseconds since an arbitrary epoch, supplied by the caller.
pub type Timestamp = u64;

/// Milliseconds per minute, for periods configured in minutes.
pub const MS_PER_MINUTE: u64 = 60_000;

/// `10^decimals`, failing if it does not fit an [`Amount`].
pub fn pow10(decimals: u32) -> Result<Amount, TypesError> {
    10u128.checked_pow(decimals).ok_or(TypesError::Overflow)
}

/// `⌊a · b / denominator⌋` with overflow and zero-division checks.
pub fn mul_div(a: Amount, b: Amount, denominator: Amount) -> Result<Amount, TypesError> {
    if denominator == 0 {
        return Err(TypesError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(TypesError::Overflow)?;
    Ok(product / denominator)
}

/// `⌈a · b / denominator⌉` with overflow and zero-division checks.
pub fn mul_div_ceil(a: Amount, b: Amount, denominator: Amount) -> Result<Amount, TypesError> {
    if denominator == 0 {
        return Err(TypesError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(TypesError::Overflow)?;
    let quotient = product / denominator;
    if product % denominator == 0 {
        Ok(quotient)
    } else {
        quotient.checked_add(1).ok_or(TypesError::Overflow)
    }
}

/// Fixed-point fraction `value / 10^decimals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize, borsh::BorshDeserialize))]
pub struct Coefficient {
    pub value: u64,
    pub decimals: u32,
}

impl Coefficient {
    pub const ZERO: Self = Self { value: 0, decimals: 0 };

    /// Create a coefficient, rejecting a denominator that overflows.
    pub fn new(value: u64, decimals: u32) -> Result<Self, TypesError> {
        pow10(decimals).map_err(|_| TypesError::InvalidCoefficient { value, decimals })?;
        Ok(Self { value, decimals })
    }

    /// `10^decimals`
    pub fn denominator(&self) -> Result<Amount, TypesError> {
        pow10(self.decimals)
    }

    /// `⌊amount · value / 10^decimals⌋`
    pub fn apply(&self, amount: Amount) -> Result<Amount, TypesError> {
        mul_div(amount, Amount::from(self.value), self.denominator()?)
    }

    /// Whether the fraction is strictly below one.
    pub fn is_below_one(&self) -> Result<bool, TypesError> {
        Ok(Amount::from(self.value) < self.denominator()?)
    }

    /// Whether `self + other ≤ 1`, compared over `10^max(decimals)`.
    pub fn fits_with(&self, other: &Coefficient) -> Result<bool, TypesError> {
        let decimals = self.decimals.max(other.decimals);
        let one = pow10(decimals)?;
        // A numerator that overflows is already far above one
        let scaled = |c: &Coefficient| {
            pow10(decimals - c.decimals)
                .ok()
                .and_then(|scale| Amount::from(c.value).checked_mul(scale))
        };
        Ok(match (scaled(self), scaled(other)) {
            (Some(a), Some(b)) => a.checked_add(b).is_some_and(|sum| sum <= one),
            _ => false,
        })
    }
}
