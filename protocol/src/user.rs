//! User Protocol
//!
//! A user owns one RSA-65537 keypair, mints UTXOs under it and checks
//! whether a UTXO opens under it.

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use crate::error::{ProtocolError, ProtocolResult};
use crate::limbs::LimbLayout;
use crate::rsa::KeyPair;
use crate::utxo::{secret_hash_of, Utxo};

/// A registered protocol participant
#[derive(Debug)]
pub struct User {
    key: KeyPair,
}

impl User {
    /// Register a user with a fresh keypair of `bit_length` bits.
    pub fn register<R: RngCore + CryptoRng + ?Sized>(
        bit_length: u64,
        rng: &mut R,
    ) -> ProtocolResult<Self> {
        let key = KeyPair::generate(bit_length, rng)?;
        tracing::info!(bit_length, "registered user");
        Ok(Self { key })
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key
    }

    /// Mint a UTXO committed under this user's keypair.
    pub fn mint_utxo<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> ProtocolResult<Utxo<'_>> {
        Utxo::mint(&self.key, rng)
    }

    /// Whether `utxo` opens under this user's keypair.
    ///
    /// Decrypts the commitment, recomputes the secret hash from the plaintext
    /// and compares it with the UTXO's secret hash. A mismatch is `Ok(false)`.
    pub fn check_utxo(
        &self,
        utxo: &Utxo<'_>,
        chunk_size: usize,
        chunk_count: usize,
    ) -> ProtocolResult<bool> {
        self.check_utxo_with(utxo, &LimbLayout::new(chunk_size, chunk_count)?)
    }

    /// [`User::check_utxo`] under an explicit layout
    pub fn check_utxo_with(&self, utxo: &Utxo<'_>, layout: &LimbLayout) -> ProtocolResult<bool> {
        // a secret wider than the layout belongs to a larger foreign key
        let expected = match utxo.secret_hash_with(layout) {
            Ok(hash) => hash,
            Err(ProtocolError::RangeOverflow { .. }) => return Ok(false),
            Err(err) => return Err(err),
        };
        let opened: BigUint = self.key.decrypt(utxo.commitment());

        match secret_hash_of(&opened, layout) {
            Ok(actual) => Ok(actual == expected),
            // the real secret fits the layout, so an overflowing plaintext cannot match
            Err(ProtocolError::RangeOverflow { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
