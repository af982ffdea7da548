//! Poseidon Hash Adapter
//!
//! Algebraic hash over the Pallas base field used for UTXO secret hashes and
//! nullifiers. Poseidon is ZK-friendly: the same permutation costs a few
//! hundred constraints inside a circuit, versus tens of thousands for SHA256.
//!
//! # Construction
//! - Width 3 (rate 2, capacity 1), S-box `x^5`
//! - 8 full rounds split around 56 partial rounds
//! - Round constants: SHA3-256 expansion of a domain tag, reduced into the
//!   field from 64 uniform bytes
//! - MDS: Cauchy matrix `M[i][j] = 1 / (x_i + y_j)`
//! - The capacity element carries the input count, so `H(x)` and `H(x, 0)`
//!   differ
//!
//! # Initialization
//! Parameters are derived once per process and cached behind a lock.
//! A failed derivation caches nothing and the next call retries.
//!
//! # Usage
//! ```ignore
//! use num_bigint::BigUint;
//! use rsa_utxo_protocol::hash::hash2;
//!
//! let h = hash2(&BigUint::from(1000u32), &BigUint::from(12345u32))?;
//! ```

use std::sync::{Arc, RwLock};

use ff::{Field, FromUniformBytes, PrimeField};
use num_bigint::BigUint;
use pasta_curves::Fp;
use sha3::{Digest, Sha3_256};

use crate::error::{validation::validate_hash_arity, ProtocolError, ProtocolResult};

/// t = 3 (2 inputs + 1 capacity)
pub const POSEIDON_WIDTH: usize = 3;
/// r = 2 (number of inputs per permutation)
pub const POSEIDON_RATE: usize = 2;
/// S-box exponent: x^5
pub const POSEIDON_ALPHA: u64 = 5;

/// Number of full rounds (for security)
pub const FULL_ROUNDS: usize = 8;
/// Number of partial rounds (for efficiency)
pub const PARTIAL_ROUNDS: usize = 56;

const DOMAIN_TAG: &[u8] = b"rsa-utxo/poseidon/t3/alpha5";

/// Field elements are canonical little-endian 32-byte encodings
pub trait HashField: PrimeField<Repr = [u8; 32]> + FromUniformBytes<64> {}
impl<F: PrimeField<Repr = [u8; 32]> + FromUniformBytes<64>> HashField for F {}

/// Derived Poseidon parameters
#[derive(Debug, Clone)]
pub struct PoseidonParams<F: HashField> {
    round_constants: Vec<[F; POSEIDON_WIDTH]>,
    mds: [[F; POSEIDON_WIDTH]; POSEIDON_WIDTH],
}

impl<F: HashField> PoseidonParams<F> {
    /// Derive round constants and the MDS matrix.
    pub fn derive() -> ProtocolResult<Self> {
        let total_rounds = FULL_ROUNDS + PARTIAL_ROUNDS;
        let round_constants = (0..total_rounds)
            .map(|round| {
                let mut constants = [F::ZERO; POSEIDON_WIDTH];
                for (i, c) in constants.iter_mut().enumerate() {
                    *c = expand_constant(round as u64, i as u64);
                }
                constants
            })
            .collect();

        Ok(Self {
            round_constants,
            mds: mds_matrix()?,
        })
    }

    /// Apply the permutation in place.
    pub fn permute(&self, state: &mut [F; POSEIDON_WIDTH]) {
        let rc = &self.round_constants;
        let total_rounds = FULL_ROUNDS + PARTIAL_ROUNDS;

        for i in 0..POSEIDON_WIDTH {
            state[i] += rc[0][i];
        }

        for round in 0..total_rounds {
            let is_full_round =
                round < FULL_ROUNDS / 2 || round >= FULL_ROUNDS / 2 + PARTIAL_ROUNDS;

            if is_full_round {
                for s in state.iter_mut() {
                    *s = sbox(*s);
                }
            } else {
                state[0] = sbox(state[0]);
            }

            let mut next = [F::ZERO; POSEIDON_WIDTH];
            for (i, out) in next.iter_mut().enumerate() {
                for j in 0..POSEIDON_WIDTH {
                    *out += self.mds[i][j] * state[j];
                }
            }
            *state = next;

            if round + 1 < total_rounds {
                for i in 0..POSEIDON_WIDTH {
                    state[i] += rc[round + 1][i];
                }
            }
        }
    }

    /// Hash 1..=2 field elements. Output is the first element of the final state.
    pub fn hash(&self, inputs: &[F]) -> ProtocolResult<F> {
        validate_hash_arity(inputs.len(), POSEIDON_RATE)?;

        let mut state = [F::ZERO; POSEIDON_WIDTH];
        state[..inputs.len()].copy_from_slice(inputs);
        state[POSEIDON_WIDTH - 1] = F::from(inputs.len() as u64);

        self.permute(&mut state);
        Ok(state[0])
    }
}

fn sbox<F: PrimeField>(x: F) -> F {
    let x2 = x.square();
    let x4 = x2.square();
    x4 * x
}

fn expand_constant<F: HashField>(round: u64, position: u64) -> F {
    let mut wide = [0u8; 64];
    for (half, chunk) in wide.chunks_mut(32).enumerate() {
        let digest = Sha3_256::new()
            .chain_update(DOMAIN_TAG)
            .chain_update(round.to_le_bytes())
            .chain_update(position.to_le_bytes())
            .chain_update([half as u8])
            .finalize();
        chunk.copy_from_slice(&digest);
    }
    F::from_uniform_bytes(&wide)
}

/// Cauchy matrix over distinct small x_i = i + 1, y_j = j + t + 1
fn mds_matrix<F: HashField>() -> ProtocolResult<[[F; POSEIDON_WIDTH]; POSEIDON_WIDTH]> {
    let mut matrix = [[F::ZERO; POSEIDON_WIDTH]; POSEIDON_WIDTH];
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, entry) in row.iter_mut().enumerate() {
            let x = F::from((i + 1) as u64);
            let y = F::from((j + POSEIDON_WIDTH + 1) as u64);
            *entry = Option::from((x + y).invert()).ok_or_else(|| {
                ProtocolError::HashInit(format!("MDS entry ({}, {}) is not invertible", i, j))
            })?;
        }
    }
    Ok(matrix)
}

// ============================================================================
// PROCESS-WIDE PARAMETER CACHE
// ============================================================================

static POSEIDON: RwLock<Option<Arc<PoseidonParams<Fp>>>> = RwLock::new(None);

fn poisoned<T>(_: T) -> ProtocolError {
    ProtocolError::LockPoisoned("poseidon parameter cache".to_string())
}

/// Shared Poseidon parameters, derived on first use.
pub fn poseidon() -> ProtocolResult<Arc<PoseidonParams<Fp>>> {
    {
        let guard = POSEIDON.read().map_err(poisoned)?;
        if let Some(params) = guard.as_ref() {
            return Ok(Arc::clone(params));
        }
    }

    let mut guard = POSEIDON.write().map_err(poisoned)?;

    // Double-check after acquiring write lock
    if let Some(params) = guard.as_ref() {
        return Ok(Arc::clone(params));
    }

    tracing::info!("Deriving Poseidon parameters...");
    let params = Arc::new(PoseidonParams::<Fp>::derive()?);
    *guard = Some(Arc::clone(&params));
    tracing::info!("Poseidon parameters cached");

    Ok(params)
}

/// Whether the shared parameters are currently cached
pub fn is_initialized() -> ProtocolResult<bool> {
    Ok(POSEIDON.read().map_err(poisoned)?.is_some())
}

/// Drop the cached parameters; the next hash re-derives them.
pub fn reset() -> ProtocolResult<()> {
    let mut guard = POSEIDON.write().map_err(poisoned)?;
    *guard = None;
    Ok(())
}

// ============================================================================
// INTEGER INTERFACE
// ============================================================================

/// Embed an integer as a field element; fails unless `x < p`.
pub fn to_field<F: HashField>(x: &BigUint) -> ProtocolResult<F> {
    let bits = x.bits();
    if bits > 256 {
        return Err(ProtocolError::FieldOverflow { bits });
    }
    let mut repr = [0u8; 32];
    let bytes = x.to_bytes_le();
    repr[..bytes.len()].copy_from_slice(&bytes);
    Option::from(F::from_repr(repr)).ok_or(ProtocolError::FieldOverflow { bits })
}

/// Canonical integer value of a field element
pub fn from_field<F: HashField>(f: &F) -> BigUint {
    BigUint::from_bytes_le(&f.to_repr())
}

/// Modulus of the hash field
pub fn field_modulus() -> BigUint {
    from_field(&-Fp::ONE) + 1u32
}

/// Poseidon hash of 1..=2 integers, each below [`field_modulus`].
pub fn hash(inputs: &[BigUint]) -> ProtocolResult<BigUint> {
    let params = poseidon()?;
    let elements = inputs
        .iter()
        .map(to_field::<Fp>)
        .collect::<ProtocolResult<Vec<_>>>()?;
    Ok(from_field(&params.hash(&elements)?))
}

/// `H(x, y)`
pub fn hash2(x: &BigUint, y: &BigUint) -> ProtocolResult<BigUint> {
    hash(&[x.clone(), y.clone()])
}
