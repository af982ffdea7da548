//! RSA-65537 Trapdoor
//!
//! Fixed-exponent RSA used as a commitment scheme: a UTXO commitment is the
//! encryption `m^65537 mod N` of its secret, and only the holder of `d` can
//! open it.
//!
//! # Key generation
//! `p` and `q` are sampled with their two top bits set so that `N = p*q` has
//! exactly the requested bit length. Pairs with `p == q` or with
//! `gcd(65537, phi(N)) != 1` are rejected and regenerated, up to
//! [`MAX_KEYGEN_ATTEMPTS`] times.

use std::fmt;

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use crate::error::{
    validation::{validate_bit_length, MIN_KEY_BITS},
    ProtocolError, ProtocolResult,
};
use crate::limbs::LimbLayout;
use crate::primes::{coprime, random_rsa_prime};
use crate::witness::PowModInput;

/// Fixed public exponent
pub const PUBLIC_EXPONENT: u32 = 65537;

/// Prime pairs tried before key generation gives up
pub const MAX_KEYGEN_ATTEMPTS: usize = 64;

/// RSA keypair with `e = 65537`
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    n: BigUint,
    e: BigUint,
    d: BigUint,
    bit_length: u64,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("n", &self.n)
            .field("e", &self.e)
            .field("d", &"<redacted>")
            .field("bit_length", &self.bit_length)
            .finish()
    }
}

impl KeyPair {
    /// Generate a keypair whose modulus has exactly `bit_length` bits.
    ///
    /// # Errors
    /// - `InvalidInput` when `bit_length` is below [`MIN_KEY_BITS`]
    /// - `ArithmeticPrecondition` when no admissible prime pair was found
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(
        bit_length: u64,
        rng: &mut R,
    ) -> ProtocolResult<Self> {
        validate_bit_length(bit_length, MIN_KEY_BITS, "key bit length")?;

        let p_bits = bit_length.div_ceil(2);
        let q_bits = bit_length / 2;

        for attempt in 1..=MAX_KEYGEN_ATTEMPTS {
            let p = random_rsa_prime(rng, p_bits)?;
            let q = random_rsa_prime(rng, q_bits)?;

            match Self::from_primes(&p, &q) {
                Ok(key) => {
                    tracing::debug!(bit_length, attempt, "generated RSA-65537 keypair");
                    return Ok(key);
                }
                Err(err) => {
                    tracing::debug!(attempt, %err, "rejected prime pair");
                }
            }
        }

        tracing::warn!(bit_length, "key generation exhausted its attempts");
        Err(ProtocolError::precondition(
            "key generation",
            format!(
                "no admissible prime pair after {} attempts",
                MAX_KEYGEN_ATTEMPTS
            ),
        ))
    }

    /// Build a keypair from known primes.
    pub fn from_primes(p: &BigUint, q: &BigUint) -> ProtocolResult<Self> {
        if p == q {
            return Err(ProtocolError::precondition("key generation", "p == q"));
        }
        let two = BigUint::from(2u8);
        if *p < two || *q < two {
            return Err(ProtocolError::invalid("rsa primes", "must be at least 2"));
        }

        let n = p * q;
        let phi = (p - 1u32) * (q - 1u32);
        let e = BigUint::from(PUBLIC_EXPONENT);

        if !coprime(&e, &phi) {
            return Err(ProtocolError::precondition(
                "key generation",
                "public exponent is not coprime with phi(N)",
            ));
        }
        let d = (&e % &phi).modinv(&phi).ok_or_else(|| {
            ProtocolError::precondition("key generation", "public exponent has no inverse")
        })?;

        Ok(Self {
            bit_length: n.bits(),
            n,
            e,
            d,
        })
    }

    /// `m^e mod N`. Values `m >= N` wrap around.
    pub fn encrypt(&self, m: &BigUint) -> BigUint {
        m.modpow(&self.e, &self.n)
    }

    /// `c^d mod N`
    pub fn decrypt(&self, c: &BigUint) -> BigUint {
        c.modpow(&self.d, &self.n)
    }

    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    pub fn public_exponent(&self) -> &BigUint {
        &self.e
    }

    pub(crate) fn private_exponent(&self) -> &BigUint {
        &self.d
    }

    /// Bit length of `N`
    pub fn bit_length(&self) -> u64 {
        self.bit_length
    }

    /// Inputs of the constant-exponent `m^65537 mod N` circuit
    pub fn pow_mod_input(&self, m: &BigUint, layout: &LimbLayout) -> ProtocolResult<PowModInput> {
        Ok(PowModInput {
            base: layout.decompose(m)?,
            exp: self.e.clone(),
            modulus: layout.decompose(&self.n)?,
            expected: layout.decompose(&self.encrypt(m))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primes::random_prime;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_known_primes() {
        // phi = 3120, coprime with 65537
        let key = KeyPair::from_primes(&BigUint::from(61u32), &BigUint::from(53u32)).unwrap();
        assert_eq!(key.modulus(), &BigUint::from(3233u32));
        let m = BigUint::from(65u32);
        assert_eq!(key.decrypt(&key.encrypt(&m)), m);
    }

    #[test]
    fn test_exponent_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let key = KeyPair::generate(256, &mut rng).unwrap();
        let two = BigUint::from(2u8);
        assert_eq!(key.decrypt(&key.encrypt(&two)), two);
    }

    #[test]
    fn test_generated_modulus_has_exact_size() {
        let mut rng = StdRng::seed_from_u64(2);
        for bits in [16u64, 17, 64, 512] {
            let key = KeyPair::generate(bits, &mut rng).unwrap();
            assert_eq!(key.bit_length(), bits);
            assert_eq!(key.modulus().bits(), bits);
        }
    }

    #[test]
    fn test_round_trip_random_primes() {
        let mut rng = StdRng::seed_from_u64(3);
        let key = KeyPair::generate(512, &mut rng).unwrap();
        for _ in 0..4 {
            let m = random_prime(&mut rng, 256).unwrap();
            assert_eq!(key.decrypt(&key.encrypt(&m)), m);
        }
    }

    #[test]
    fn test_small_key_round_trip() {
        let mut rng = StdRng::seed_from_u64(4);
        let key = KeyPair::generate(16, &mut rng).unwrap();
        let n: u64 = key.modulus().try_into().unwrap();
        for m in [0u64, 1, 2, 3, 17, n - 1] {
            let m = BigUint::from(m);
            assert_eq!(key.decrypt(&key.encrypt(&m)), m);
        }
    }

    #[test]
    fn test_rejects_equal_primes() {
        let p = BigUint::from(61u32);
        let err = KeyPair::from_primes(&p, &p).unwrap_err();
        assert!(matches!(err, ProtocolError::ArithmeticPrecondition { .. }));
    }

    #[test]
    fn test_rejects_exponent_sharing_factor_with_phi() {
        // 917519 = 14 * 65537 + 1 is prime, so 65537 divides p - 1
        let p = BigUint::from(917519u32);
        let q = BigUint::from(61u32);
        let err = KeyPair::from_primes(&p, &q).unwrap_err();
        assert!(err.to_string().contains("coprime"));
    }

    #[test]
    fn test_rejects_tiny_bit_length() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(KeyPair::generate(8, &mut rng).is_err());
    }

    #[test]
    fn test_debug_redacts_private_exponent() {
        let key = KeyPair::from_primes(&BigUint::from(61u32), &BigUint::from(53u32)).unwrap();
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&key.private_exponent().to_string()));
    }

    #[test]
    fn test_pow_mod_input() {
        let mut rng = StdRng::seed_from_u64(6);
        let key = KeyPair::generate(128, &mut rng).unwrap();
        let layout = LimbLayout::new(64, 2).unwrap();
        let m = BigUint::from(123456789u64);
        let input = key.pow_mod_input(&m, &layout).unwrap();
        assert_eq!(input.exp, BigUint::from(PUBLIC_EXPONENT));
        assert_eq!(layout.recompose(&input.expected).unwrap(), key.encrypt(&m));
        assert_eq!(layout.recompose(&input.modulus).unwrap(), *key.modulus());
    }
}
