//! Random prime and integer source
//!
//! Random candidates are sampled with the requested top bits and the low bit
//! set, sieved by trial division over small primes, then tested with
//! Miller-Rabin rounds using random bases.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use crate::error::{
    validation::{validate_bit_length, MIN_PRIME_BITS},
    ProtocolError, ProtocolResult,
};
use crate::primality::split_power_of_two;

/// Miller-Rabin rounds per candidate (error probability <= 4^-40)
pub const MILLER_RABIN_ROUNDS: usize = 40;

const SMALL_PRIMES: [u32; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Probabilistic primality test.
pub fn is_probable_prime<R: RngCore + CryptoRng + ?Sized>(n: &BigUint, rng: &mut R) -> bool {
    if *n < BigUint::from(2u8) {
        return false;
    }
    for p in SMALL_PRIMES {
        if (n % p).is_zero() {
            return *n == BigUint::from(p);
        }
    }

    let one = BigUint::one();
    let n_minus_one = n - &one;
    let (d, r) = split_power_of_two(&n_minus_one);
    let two = BigUint::from(2u8);

    'rounds: for _ in 0..MILLER_RABIN_ROUNDS {
        // n > 97 here, so [2, n - 2] is non-empty
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..r {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'rounds;
            }
        }
        return false;
    }
    true
}

/// A uniformly random prime of exactly `bits` bits.
pub fn random_prime<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    bits: u64,
) -> ProtocolResult<BigUint> {
    sample_prime(rng, bits, 1)
}

/// A random prime of exactly `bits` bits with its two top bits set, so the
/// product of two such primes has exactly `2 * bits` bits.
pub fn random_rsa_prime<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    bits: u64,
) -> ProtocolResult<BigUint> {
    sample_prime(rng, bits, 2)
}

/// A random prime of exactly `bits` bits that is strictly below `bound`.
///
/// Out-of-range candidates are discarded before any primality test.
pub fn random_prime_below<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    bits: u64,
    bound: &BigUint,
) -> ProtocolResult<BigUint> {
    validate_bit_length(bits, MIN_PRIME_BITS, "prime bit length")?;
    let smallest = (BigUint::one() << (bits - 1)) | BigUint::one();
    if *bound <= smallest {
        return Err(ProtocolError::invalid(
            "prime bound",
            format!("no {}-bit odd candidate lies below the bound", bits),
        ));
    }
    sample(rng, bits, 1, Some(bound))
}

fn sample_prime<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    bits: u64,
    top_bits: u64,
) -> ProtocolResult<BigUint> {
    validate_bit_length(bits, MIN_PRIME_BITS.max(top_bits + 1), "prime bit length")?;
    sample(rng, bits, top_bits, None)
}

fn sample<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    bits: u64,
    top_bits: u64,
    bound: Option<&BigUint>,
) -> ProtocolResult<BigUint> {
    let mut attempts = 0usize;
    loop {
        attempts += 1;
        let mut candidate = rng.gen_biguint(bits);
        for i in 0..top_bits {
            candidate.set_bit(bits - 1 - i, true);
        }
        candidate.set_bit(0, true);

        if bound.is_some_and(|b| candidate >= *b) {
            continue;
        }
        if is_probable_prime(&candidate, rng) {
            tracing::trace!(bits, attempts, "sampled random prime");
            return Ok(candidate);
        }
    }
}

/// A uniformly random integer in `[low, high]`.
pub fn random_int<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    low: &BigUint,
    high: &BigUint,
) -> ProtocolResult<BigUint> {
    if low > high {
        return Err(ProtocolError::invalid(
            "random range",
            format!("low bound {} exceeds high bound {}", low, high),
        ));
    }
    Ok(rng.gen_biguint_range(low, &(high + 1u32)))
}

/// `gcd(a, b) == 1`
pub fn coprime(a: &BigUint, b: &BigUint) -> bool {
    a.gcd(b).is_one()
}
