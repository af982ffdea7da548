//! Error types for the RSA-UTXO protocol layer
//!
//! Provides structured error handling for key generation, limb decomposition,
//! hashing and accumulator operations. Mismatches (a foreign UTXO, a wrong
//! membership proof) are reported as `false`, never as an error.

use num_bigint::BigUint;
use thiserror::Error;

/// Error types for protocol operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A malformed argument rejected at the operation boundary
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// A number-theoretic precondition does not hold (non-invertible value,
    /// exponent not coprime with the totient, degenerate modulus)
    #[error("Arithmetic precondition failed in {operation}: {reason}")]
    ArithmeticPrecondition { operation: String, reason: String },

    /// Integer does not fit in the requested limb layout
    #[error("Value of {bits} bits does not fit in {count} limbs of {width} bits")]
    RangeOverflow { bits: u64, width: usize, count: usize },

    /// Integer is not a canonical element of the hash field
    #[error("Value of {bits} bits is not below the hash field modulus")]
    FieldOverflow { bits: u64 },

    /// Hash parameters could not be derived
    #[error("Hash initialization failed: {0}")]
    HashInit(String),

    /// A shared state lock was poisoned by a panicking holder
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl ProtocolError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ProtocolError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn precondition(operation: &str, reason: impl Into<String>) -> Self {
        ProtocolError::ArithmeticPrecondition {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Input validation utilities
pub mod validation {
    use super::*;

    /// Smallest RSA modulus accepted by key generation
    pub const MIN_KEY_BITS: u64 = 16;

    /// Smallest prime size the sampler can honor (top and low bit set)
    pub const MIN_PRIME_BITS: u64 = 2;

    /// Validate a limb layout: both width and count must be non-zero
    pub fn validate_limb_layout(width: usize, count: usize) -> ProtocolResult<()> {
        if width == 0 {
            return Err(ProtocolError::invalid("limb width", "must be at least 1 bit"));
        }
        if count == 0 {
            return Err(ProtocolError::invalid("limb count", "must be at least 1 limb"));
        }
        Ok(())
    }

    /// Validate that a layout provides at least `required` limbs
    pub fn validate_limb_count(count: usize, required: usize, purpose: &str) -> ProtocolResult<()> {
        if count < required {
            return Err(ProtocolError::invalid(
                purpose,
                format!("needs at least {} limbs, got {}", required, count),
            ));
        }
        Ok(())
    }

    /// Validate a requested bit length against a lower bound
    pub fn validate_bit_length(bits: u64, min: u64, field: &str) -> ProtocolResult<()> {
        if bits < min {
            return Err(ProtocolError::invalid(
                field,
                format!("bit length {} is below the minimum of {}", bits, min),
            ));
        }
        Ok(())
    }

    /// Validate a Rabin-Miller candidate (must be >= 2)
    pub fn validate_candidate(n: &BigUint) -> ProtocolResult<()> {
        if *n < BigUint::from(2u8) {
            return Err(ProtocolError::invalid(
                "rabin-miller candidate",
                "n must be greater than or equal to 2",
            ));
        }
        Ok(())
    }

    /// Validate the number of hash inputs against the sponge rate
    pub fn validate_hash_arity(len: usize, rate: usize) -> ProtocolResult<()> {
        if len == 0 || len > rate {
            return Err(ProtocolError::invalid(
                "hash inputs",
                format!("expected 1..={} field elements, got {}", rate, len),
            ));
        }
        Ok(())
    }

    /// Validate an exponent that must not collapse the accumulator (x != 0)
    pub fn validate_nonzero(x: &BigUint, field: &str) -> ProtocolResult<()> {
        if x.bits() == 0 {
            return Err(ProtocolError::invalid(field, "must be non-zero"));
        }
        Ok(())
    }

    /// Validate an accumulator prime or secret (must be >= 2)
    pub fn validate_member(x: &BigUint, field: &str) -> ProtocolResult<()> {
        if *x < BigUint::from(2u8) {
            return Err(ProtocolError::invalid(field, "must be at least 2"));
        }
        Ok(())
    }
}
