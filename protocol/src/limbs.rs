//! Limb Codec
//!
//! Converts arbitrary-precision integers to and from the fixed-width limb
//! and bit vectors consumed by finite-field circuits.
//!
//! # Layout
//! A limb vector of `k` limbs of width `n` represents
//! `x = sum(limb[i] * 2^(n*i))`, least-significant limb first. RSA circuits
//! commonly use 64-bit limbs: 16 limbs for 1024-bit and 32 limbs for
//! 2048-bit integers.
//!
//! # Overflow
//! [`to_limbs`] silently drops bits above `n*k`, which is what circuit
//! witness generators have historically done. [`to_limbs_checked`] rejects
//! such values with [`ProtocolError::RangeOverflow`]. [`LimbLayout`] carries
//! the choice as an explicit [`OverflowPolicy`].

use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{validation::validate_limb_layout, ProtocolError, ProtocolResult};

/// Limb width used by the RSA circuits
pub const LIMB_WIDTH: usize = 64;
/// Limb count for 1024-bit integers at [`LIMB_WIDTH`]
pub const LIMBS_1024: usize = 16;
/// Limb count for 2048-bit integers at [`LIMB_WIDTH`]
pub const LIMBS_2048: usize = 32;

/// What to do when an integer does not fit in `width * count` bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Fail with [`ProtocolError::RangeOverflow`]
    #[default]
    Reject,
    /// Drop the high-order bits
    Truncate,
}

impl FromStr for OverflowPolicy {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(OverflowPolicy::Reject),
            "truncate" => Ok(OverflowPolicy::Truncate),
            other => Err(ProtocolError::invalid(
                "overflow policy",
                format!("expected 'reject' or 'truncate', got '{}'", other),
            )),
        }
    }
}

/// A validated limb layout: `count` limbs of `width` bits each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimbLayout {
    width: usize,
    count: usize,
    overflow: OverflowPolicy,
}

impl LimbLayout {
    /// Create a layout that rejects overflowing values
    pub fn new(width: usize, count: usize) -> ProtocolResult<Self> {
        validate_limb_layout(width, count)?;
        Ok(Self {
            width,
            count,
            overflow: OverflowPolicy::Reject,
        })
    }

    /// 16 x 64-bit limbs
    pub fn rsa_1024() -> Self {
        Self {
            width: LIMB_WIDTH,
            count: LIMBS_1024,
            overflow: OverflowPolicy::Reject,
        }
    }

    /// 32 x 64-bit limbs
    pub fn rsa_2048() -> Self {
        Self {
            width: LIMB_WIDTH,
            count: LIMBS_2048,
            overflow: OverflowPolicy::Reject,
        }
    }

    /// Replace the overflow policy
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn overflow(&self) -> OverflowPolicy {
        self.overflow
    }

    /// Number of bits representable by this layout
    pub fn capacity_bits(&self) -> u64 {
        (self.width as u64) * (self.count as u64)
    }

    /// Decompose `x` according to the layout's overflow policy
    pub fn decompose(&self, x: &BigUint) -> ProtocolResult<Vec<BigUint>> {
        match self.overflow {
            OverflowPolicy::Reject => to_limbs_checked(self.width, self.count, x),
            OverflowPolicy::Truncate => to_limbs(self.width, self.count, x),
        }
    }

    /// Recompose limbs produced by [`LimbLayout::decompose`]
    pub fn recompose(&self, limbs: &[BigUint]) -> ProtocolResult<BigUint> {
        if limbs.len() != self.count {
            return Err(ProtocolError::invalid(
                "limbs",
                format!("expected {} limbs, got {}", self.count, limbs.len()),
            ));
        }
        from_limbs(self.width, limbs)
    }
}

fn limb_mask(n: usize) -> BigUint {
    (BigUint::one() << n) - BigUint::one()
}

/// Decompose `x` into `k` limbs of `n` bits, least-significant first.
///
/// Bits above `n * k` are dropped without error.
pub fn to_limbs(n: usize, k: usize, x: &BigUint) -> ProtocolResult<Vec<BigUint>> {
    validate_limb_layout(n, k)?;

    let mask = limb_mask(n);
    let mut rest = x.clone();
    let mut limbs = Vec::with_capacity(k);
    for _ in 0..k {
        limbs.push(&rest & &mask);
        rest >>= n;
    }

    if !rest.is_zero() {
        tracing::debug!(
            bits = x.bits(),
            capacity = (n as u64) * (k as u64),
            "limb decomposition truncated high-order bits"
        );
    }

    Ok(limbs)
}

/// Decompose `x` into `k` limbs of `n` bits, failing if `x >= 2^(n*k)`.
pub fn to_limbs_checked(n: usize, k: usize, x: &BigUint) -> ProtocolResult<Vec<BigUint>> {
    validate_limb_layout(n, k)?;

    if x.bits() > (n as u64) * (k as u64) {
        return Err(ProtocolError::RangeOverflow {
            bits: x.bits(),
            width: n,
            count: k,
        });
    }
    to_limbs(n, k, x)
}

/// Recompose `sum(limb[i] * 2^(n*i))`. Every limb must be below `2^n`.
pub fn from_limbs(n: usize, limbs: &[BigUint]) -> ProtocolResult<BigUint> {
    validate_limb_layout(n, limbs.len().max(1))?;

    let mut acc = BigUint::zero();
    for limb in limbs.iter().rev() {
        if limb.bits() > n as u64 {
            return Err(ProtocolError::RangeOverflow {
                bits: limb.bits(),
                width: n,
                count: 1,
            });
        }
        acc = (acc << n) | limb;
    }
    Ok(acc)
}

/// The low `bit_length` bits of `x`, least-significant first.
pub fn to_bits(x: &BigUint, bit_length: usize) -> Vec<u8> {
    (0..bit_length as u64).map(|i| u8::from(x.bit(i))).collect()
}

/// Inverse of [`to_bits`]. Any non-zero entry counts as a set bit.
pub fn from_bits(bits: &[u8]) -> BigUint {
    let mut x = BigUint::zero();
    for (i, bit) in bits.iter().enumerate() {
        if *bit != 0 {
            x.set_bit(i as u64, true);
        }
    }
    x
}
