//! Rabin-Miller witness generation
//!
//! Prepares the inputs of a Rabin-Miller primality circuit: the candidate
//! `n`, the odd factor `d` and exponent `r` with `n - 1 = d * 2^r`, and `k`
//! random bases. This module does not decide primality itself.
//!
//! Bases for candidates above `2^64` are drawn from `[2, 2^64]` because the
//! circuit only accepts 64-bit bases.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use serde::Serialize;

use crate::error::{validation::validate_candidate, ProtocolResult};
use crate::primes::random_int;
use crate::witness::{decimal, decimal_seq};

/// Bit width of the bases accepted by the Rabin-Miller circuit
pub const MAX_BASE_BITS: usize = 64;

/// Rabin-Miller circuit inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RabinMillerInput {
    /// Candidate
    #[serde(with = "decimal")]
    pub n: BigUint,
    /// Bases
    #[serde(serialize_with = "decimal_seq::serialize")]
    pub a: Vec<BigUint>,
    /// Odd factor of `n - 1`
    #[serde(with = "decimal")]
    pub d: BigUint,
    /// Power of two dividing `n - 1`
    pub r: u64,
}

impl RabinMillerInput {
    /// `d` odd, `d * 2^r == n - 1`, and every base in its admissible range
    pub fn is_well_formed(&self) -> bool {
        let two = BigUint::from(2u8);
        if self.n < two {
            return false;
        }
        let n_minus_one = &self.n - 1u32;
        let decomposition_ok = self.d.bit(0) && (&self.d << self.r) == n_minus_one;

        let (low, high) = base_range(&self.n);
        decomposition_ok && self.a.iter().all(|a| *a >= low && *a <= high)
    }
}

/// Split `m` into `(d, r)` with `m = d * 2^r` and `d` odd. `m = 0` yields `(0, 0)`.
pub fn split_power_of_two(m: &BigUint) -> (BigUint, u64) {
    match m.trailing_zeros() {
        Some(r) => (m >> r, r),
        None => (BigUint::zero(), 0),
    }
}

/// Inclusive range the bases are drawn from for candidate `n`
fn base_range(n: &BigUint) -> (BigUint, BigUint) {
    let two = BigUint::from(2u8);
    let cap = BigUint::one() << MAX_BASE_BITS;
    if *n <= BigUint::from(4u8) {
        (two.clone(), two)
    } else if *n > cap {
        (two, cap)
    } else {
        (two, n - 2u32)
    }
}

/// Generate Rabin-Miller circuit inputs for candidate `n` with `k` bases.
///
/// # Errors
/// [`crate::ProtocolError::InvalidInput`] when `n < 2`.
pub fn generate_rabin_miller_input<R: RngCore + CryptoRng + ?Sized>(
    n: &BigUint,
    k: usize,
    rng: &mut R,
) -> ProtocolResult<RabinMillerInput> {
    validate_candidate(n)?;

    let (d, r) = split_power_of_two(&(n - 1u32));
    let (low, high) = base_range(n);

    let a = (0..k)
        .map(|_| random_int(rng, &low, &high))
        .collect::<ProtocolResult<Vec<_>>>()?;

    tracing::debug!(bits = n.bits(), k, r, "generated rabin-miller input");

    Ok(RabinMillerInput {
        n: n.clone(),
        a,
        d,
        r,
    })
}
