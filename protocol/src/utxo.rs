//! UTXO Commitment Scheme
//!
//! A UTXO binds a random prime secret to the public commitment
//! `secret^65537 mod N` under its owner's keypair.
//!
//! # Derived hashes
//! - secret hash: `H(secret_limb[0], secret_limb[1])`, a public fingerprint
//!   of the secret
//! - nullifier hash: `H(d_limb[0], secret_limb[0])`, published on spend; it
//!   can only be produced with the private exponent that opens the
//!   commitment, and publishing it twice marks a double spend
//!
//! The secret is never exposed outside the crate; only the commitment and
//! the derived hashes leave a [`Utxo`].

use std::fmt;

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use crate::error::{validation::validate_limb_count, ProtocolResult};
use crate::hash::hash2;
use crate::limbs::LimbLayout;
use crate::primes::random_prime_below;
use crate::rsa::KeyPair;
use crate::witness::UtxoSpendInput;

/// An unspent output committed under a keypair
#[derive(Clone, PartialEq, Eq)]
pub struct Utxo<'k> {
    key: &'k KeyPair,
    secret: BigUint,
    commitment: BigUint,
}

impl fmt::Debug for Utxo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utxo")
            .field("commitment", &self.commitment)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl<'k> Utxo<'k> {
    /// Mint a UTXO with a fresh prime secret of `key.bit_length()` bits.
    ///
    /// The secret is sampled below `N`, so the commitment always opens to
    /// the secret itself.
    pub fn mint<R: RngCore + CryptoRng + ?Sized>(
        key: &'k KeyPair,
        rng: &mut R,
    ) -> ProtocolResult<Self> {
        let secret = random_prime_below(rng, key.bit_length(), key.modulus())?;
        let commitment = key.encrypt(&secret);
        tracing::debug!(bits = key.bit_length(), "minted UTXO");

        Ok(Self {
            key,
            secret,
            commitment,
        })
    }

    /// Public commitment `secret^65537 mod N`
    pub fn commitment(&self) -> &BigUint {
        &self.commitment
    }

    /// Keypair the commitment was encrypted under
    pub fn key_pair(&self) -> &KeyPair {
        self.key
    }

    pub(crate) fn secret(&self) -> &BigUint {
        &self.secret
    }

    /// `H(secret_limb[0], secret_limb[1])` over `chunk_count` limbs of `chunk_size` bits
    pub fn secret_hash(&self, chunk_size: usize, chunk_count: usize) -> ProtocolResult<BigUint> {
        self.secret_hash_with(&LimbLayout::new(chunk_size, chunk_count)?)
    }

    /// [`Utxo::secret_hash`] under an explicit layout
    pub fn secret_hash_with(&self, layout: &LimbLayout) -> ProtocolResult<BigUint> {
        secret_hash_of(&self.secret, layout)
    }

    /// `H(d_limb[0], secret_limb[0])` over `chunk_count` limbs of `chunk_size` bits
    pub fn nullifier_hash(&self, chunk_size: usize, chunk_count: usize) -> ProtocolResult<BigUint> {
        self.nullifier_hash_with(&LimbLayout::new(chunk_size, chunk_count)?)
    }

    /// [`Utxo::nullifier_hash`] under an explicit layout
    pub fn nullifier_hash_with(&self, layout: &LimbLayout) -> ProtocolResult<BigUint> {
        let d_limbs = layout.decompose(self.key.private_exponent())?;
        let secret_limbs = layout.decompose(&self.secret)?;
        hash2(&d_limbs[0], &secret_limbs[0])
    }

    /// Inputs of the UTXO spend circuit
    pub fn spend_input(&self, layout: &LimbLayout) -> ProtocolResult<UtxoSpendInput> {
        Ok(UtxoSpendInput {
            modulus: layout.decompose(self.key.modulus())?,
            commitment: layout.decompose(&self.commitment)?,
            secret: layout.decompose(&self.secret)?,
            d: layout.decompose(self.key.private_exponent())?,
            secret_hash: self.secret_hash_with(layout)?,
            nullifier_hash: self.nullifier_hash_with(layout)?,
        })
    }
}

/// Secret hash of an arbitrary plaintext, shared with UTXO checking
pub(crate) fn secret_hash_of(secret: &BigUint, layout: &LimbLayout) -> ProtocolResult<BigUint> {
    validate_limb_count(layout.count(), 2, "secret hash layout")?;
    let limbs = layout.decompose(secret)?;
    hash2(&limbs[0], &limbs[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::limbs::OverflowPolicy;
    use rand::{rngs::StdRng, SeedableRng};

    fn key(seed: u64, bits: u64) -> KeyPair {
        let mut rng = StdRng::seed_from_u64(seed);
        KeyPair::generate(bits, &mut rng).unwrap()
    }

    #[test]
    fn test_mint_commitment_opens_to_secret() {
        let key = key(10, 256);
        let mut rng = StdRng::seed_from_u64(11);
        let utxo = Utxo::mint(&key, &mut rng).unwrap();

        assert!(utxo.secret() < key.modulus());
        assert_eq!(utxo.secret().bits(), 256);
        assert_eq!(utxo.commitment(), &key.encrypt(utxo.secret()));
        assert_eq!(key.decrypt(utxo.commitment()), *utxo.secret());
    }

    #[test]
    fn test_secret_hash_deterministic() {
        let key = key(12, 256);
        let mut rng = StdRng::seed_from_u64(13);
        let utxo = Utxo::mint(&key, &mut rng).unwrap();
        assert_eq!(
            utxo.secret_hash(64, 4).unwrap(),
            utxo.secret_hash(64, 4).unwrap()
        );
    }

    #[test]
    fn test_distinct_mints_have_distinct_hashes() {
        let key = key(14, 256);
        let mut rng = StdRng::seed_from_u64(15);
        let a = Utxo::mint(&key, &mut rng).unwrap();
        let b = Utxo::mint(&key, &mut rng).unwrap();
        assert_ne!(a.commitment(), b.commitment());
        assert_ne!(a.secret_hash(64, 4).unwrap(), b.secret_hash(64, 4).unwrap());
        assert_ne!(
            a.nullifier_hash(64, 4).unwrap(),
            b.nullifier_hash(64, 4).unwrap()
        );
    }

    #[test]
    fn test_nullifier_binds_private_exponent() {
        let key = key(16, 256);
        let mut rng = StdRng::seed_from_u64(17);
        let utxo = Utxo::mint(&key, &mut rng).unwrap();
        let layout = LimbLayout::new(64, 4).unwrap();

        let d_limbs = layout.decompose(key.private_exponent()).unwrap();
        let s_limbs = layout.decompose(utxo.secret()).unwrap();
        let expected = hash2(&d_limbs[0], &s_limbs[0]).unwrap();
        assert_eq!(utxo.nullifier_hash(64, 4).unwrap(), expected);
    }

    #[test]
    fn test_secret_hash_needs_two_limbs() {
        let key = key(18, 64);
        let mut rng = StdRng::seed_from_u64(19);
        let utxo = Utxo::mint(&key, &mut rng).unwrap();
        assert!(utxo.secret_hash(64, 1).is_err());
        assert!(utxo.nullifier_hash(64, 1).is_ok());
    }

    #[test]
    fn test_layout_too_small_is_range_overflow() {
        let key = key(20, 256);
        let mut rng = StdRng::seed_from_u64(21);
        let utxo = Utxo::mint(&key, &mut rng).unwrap();

        let err = utxo.secret_hash(64, 2).unwrap_err();
        assert!(matches!(err, ProtocolError::RangeOverflow { .. }));

        // truncation keeps the two low limbs, matching the full layout
        let truncating = LimbLayout::new(64, 2)
            .unwrap()
            .with_overflow(OverflowPolicy::Truncate);
        assert_eq!(
            utxo.secret_hash_with(&truncating).unwrap(),
            utxo.secret_hash(64, 4).unwrap()
        );
    }

    #[test]
    fn test_spend_input_consistency() {
        let key = key(22, 256);
        let mut rng = StdRng::seed_from_u64(23);
        let utxo = Utxo::mint(&key, &mut rng).unwrap();
        let layout = LimbLayout::new(64, 4).unwrap();

        let input = utxo.spend_input(&layout).unwrap();
        assert_eq!(input.secret_hash, utxo.secret_hash(64, 4).unwrap());
        assert_eq!(input.nullifier_hash, utxo.nullifier_hash(64, 4).unwrap());
        assert_eq!(layout.recompose(&input.commitment).unwrap(), *utxo.commitment());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let key = key(24, 64);
        let mut rng = StdRng::seed_from_u64(25);
        let utxo = Utxo::mint(&key, &mut rng).unwrap();
        let rendered = format!("{:?}", utxo);
        assert!(!rendered.contains(&utxo.secret().to_string()));
    }
}
