//! ACDM Types - Core type definitions shared by the ACDM crates.
//!
//! This crate provides:
//! - Addresses (20-byte, Bech32m encoded)
//! - Hashes (32-byte, blake3 digests)
//! - Monetary amounts, timestamps and checked fixed-point arithmetic

pub mod address;
pub mod amount;
pub mod hash;
pub mod error;

#[cfg(any(feature = "serde", feature = "borsh"))]
mod serialization;

pub use address::Address;
pub use amount::{mul_div, mul_div_ceil, pow10, Amount, Coefficient, Timestamp, MS_PER_MINUTE};
pub use hash::Hash;
pub use error::TypesError;
