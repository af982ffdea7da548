//! RSA Accumulator
//!
//! Accumulated value `A = g^(secret * x_1 * ... * x_k) mod N` over a modulus
//! whose factorization the accumulator manager knows.
//!
//! # Proofs
//! [`Accumulator::generate_proof`] returns `A^(x^-1 mod phi(N))` and
//! [`Accumulator::verify_proof`] checks `proof^x == A`. The pair is a
//! decryption-style consistency check against the *current* `A`: it succeeds
//! for any `x` invertible modulo `phi(N)`, whether or not `x` was ever
//! accumulated. It is not a cumulative set-membership proof.
//!
//! # Spend flow
//! A sender folds a fresh member into a private commitment `C = A^x`
//! ([`Accumulator::commit`]); the manager opens it with
//! `W = C^(secret^-1 mod phi(N))` ([`Accumulator::spend_witness`]) and the
//! spend circuit checks `W^secret == C`.
//!
//! # Concurrency
//! [`Accumulator::accumulate`] takes `&mut self`. Share an accumulator across
//! threads through [`SharedAccumulator`], which serializes mutation behind a
//! write lock.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use crate::error::{
    validation::{validate_member, validate_nonzero},
    ProtocolError, ProtocolResult,
};
use crate::hash::hash2;
use crate::limbs::LimbLayout;
use crate::primes::random_prime;
use crate::witness::{AccumulatorSpendInput, PowModInput};

/// Bit lengths of the accumulator's random primes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulatorBits {
    pub g: u64,
    pub p: u64,
    pub q: u64,
    pub secret: u64,
}

impl Default for AccumulatorBits {
    /// 2048-bit generator, 1024-bit factors, 128-bit secret
    fn default() -> Self {
        Self {
            g: 2048,
            p: 1024,
            q: 1024,
            secret: 128,
        }
    }
}

/// RSA accumulator state
#[derive(Clone)]
pub struct Accumulator {
    g: BigUint,
    secret: BigUint,
    n: BigUint,
    phi: BigUint,
    value: BigUint,
    members: usize,
}

impl fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("g", &self.g)
            .field("n", &self.n)
            .field("value", &self.value)
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

impl Accumulator {
    /// Sample `g`, `p`, `q` and `secret` as independent random primes and set
    /// `A = g^secret mod N`.
    pub fn initialize<R: RngCore + CryptoRng + ?Sized>(
        bits: AccumulatorBits,
        rng: &mut R,
    ) -> ProtocolResult<Self> {
        let g = random_prime(rng, bits.g)?;
        let p = random_prime(rng, bits.p)?;
        let mut q = random_prime(rng, bits.q)?;
        while q == p {
            q = random_prime(rng, bits.q)?;
        }
        let secret = random_prime(rng, bits.secret)?;

        let acc = Self::from_parts(g, p, q, secret)?;
        tracing::info!(modulus_bits = acc.n.bits(), "initialized RSA accumulator");
        Ok(acc)
    }

    /// Build an accumulator from known parameters.
    pub fn from_parts(g: BigUint, p: BigUint, q: BigUint, secret: BigUint) -> ProtocolResult<Self> {
        validate_member(&p, "accumulator prime p")?;
        validate_member(&q, "accumulator prime q")?;
        validate_member(&secret, "accumulator secret")?;
        if p == q {
            return Err(ProtocolError::precondition("accumulator setup", "p == q"));
        }

        let n = &p * &q;
        let phi = (&p - 1u32) * (&q - 1u32);
        let value = g.modpow(&secret, &n);

        Ok(Self {
            g,
            secret,
            n,
            phi,
            value,
            members: 0,
        })
    }

    /// Current accumulated value `A`
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    pub fn generator(&self) -> &BigUint {
        &self.g
    }

    /// Number of members folded in since initialization
    pub fn members(&self) -> usize {
        self.members
    }

    /// `A <- A^x mod N`. Accumulating 1 leaves `A` unchanged.
    pub fn accumulate(&mut self, x: &BigUint) -> ProtocolResult<()> {
        validate_nonzero(x, "accumulated member")?;
        self.value = self.value.modpow(x, &self.n);
        self.members += 1;
        tracing::debug!(members = self.members, "accumulated member");
        Ok(())
    }

    /// `A^(x^-1 mod phi(N)) mod N`
    ///
    /// # Errors
    /// `ArithmeticPrecondition` when `x` is zero or not invertible modulo `phi(N)`.
    pub fn generate_proof(&self, x: &BigUint) -> ProtocolResult<BigUint> {
        let y = self.invert_mod_phi(x, "proof generation")?;
        Ok(self.value.modpow(&y, &self.n))
    }

    /// `proof^x mod N == A`
    pub fn verify_proof(&self, x: &BigUint, proof: &BigUint) -> bool {
        proof.modpow(x, &self.n) == self.value
    }

    /// `A^x mod N`, without mutating `A`
    pub fn commit(&self, x: &BigUint) -> ProtocolResult<BigUint> {
        validate_nonzero(x, "committed member")?;
        Ok(self.value.modpow(x, &self.n))
    }

    /// `C^(secret^-1 mod phi(N)) mod N`
    pub fn spend_witness(&self, commitment: &BigUint) -> ProtocolResult<BigUint> {
        let inverse = self.invert_mod_phi(&self.secret, "spend witness")?;
        Ok(commitment.modpow(&inverse, &self.n))
    }

    /// `W^secret mod N == C`
    pub fn verify_spend(&self, commitment: &BigUint, witness: &BigUint) -> bool {
        witness.modpow(&self.secret, &self.n) == *commitment
    }

    /// Inputs of the `g^secret mod N` circuit that produced the initial `A`
    pub fn pow_mod_input(&self, layout: &LimbLayout) -> ProtocolResult<PowModInput> {
        Ok(PowModInput {
            base: layout.decompose(&self.g)?,
            exp: self.secret.clone(),
            modulus: layout.decompose(&self.n)?,
            expected: layout.decompose(&self.g.modpow(&self.secret, &self.n))?,
        })
    }

    /// Commit `x`, open the commitment and package the spend circuit inputs.
    ///
    /// The nullifier hash is `H(witness_limb[0], witness_limb[1])`.
    pub fn spend_input(&self, x: &BigUint, layout: &LimbLayout) -> ProtocolResult<AccumulatorSpendInput> {
        let commitment = self.commit(x)?;
        let witness = self.spend_witness(&commitment)?;
        debug_assert!(self.verify_spend(&commitment, &witness));

        let witness_limbs = layout.decompose(&witness)?;
        if witness_limbs.len() < 2 {
            return Err(ProtocolError::invalid(
                "spend layout",
                "needs at least 2 limbs for the nullifier hash",
            ));
        }
        let nullifier_hash = hash2(&witness_limbs[0], &witness_limbs[1])?;

        Ok(AccumulatorSpendInput {
            modulus: layout.decompose(&self.n)?,
            witness: witness_limbs,
            secret: self.secret.clone(),
            commitment: layout.decompose(&commitment)?,
            nullifier_hash,
        })
    }

    fn invert_mod_phi(&self, x: &BigUint, operation: &str) -> ProtocolResult<BigUint> {
        (x % &self.phi)
            .modinv(&self.phi)
            .ok_or_else(|| ProtocolError::precondition(operation, "value is not invertible modulo phi(N)"))
    }
}

/// Thread-safe handle serializing mutation of one accumulator
#[derive(Debug, Clone)]
pub struct SharedAccumulator {
    inner: Arc<RwLock<Accumulator>>,
}

impl SharedAccumulator {
    pub fn new(acc: Accumulator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(acc)),
        }
    }

    fn read(&self) -> ProtocolResult<RwLockReadGuard<'_, Accumulator>> {
        self.inner
            .read()
            .map_err(|_| ProtocolError::LockPoisoned("accumulator".to_string()))
    }

    fn write(&self) -> ProtocolResult<RwLockWriteGuard<'_, Accumulator>> {
        self.inner
            .write()
            .map_err(|_| ProtocolError::LockPoisoned("accumulator".to_string()))
    }

    /// See [`Accumulator::accumulate`]
    pub fn accumulate(&self, x: &BigUint) -> ProtocolResult<()> {
        self.write()?.accumulate(x)
    }

    /// See [`Accumulator::generate_proof`]
    pub fn generate_proof(&self, x: &BigUint) -> ProtocolResult<BigUint> {
        self.read()?.generate_proof(x)
    }

    /// See [`Accumulator::verify_proof`]
    pub fn verify_proof(&self, x: &BigUint, proof: &BigUint) -> ProtocolResult<bool> {
        Ok(self.read()?.verify_proof(x, proof))
    }

    /// Snapshot of the current accumulated value
    pub fn value(&self) -> ProtocolResult<BigUint> {
        Ok(self.read()?.value().clone())
    }

    /// Run `f` against a consistent view of the accumulator
    pub fn with<T>(&self, f: impl FnOnce(&Accumulator) -> T) -> ProtocolResult<T> {
        let guard = self.read()?;
        Ok(f(&guard))
    }
}
