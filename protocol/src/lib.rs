//! RSA-UTXO Protocol Layer
//!
//! Plaintext half of a privacy-preserving UTXO protocol whose spend and
//! membership proofs are checked by external arithmetic circuits.
//!
//! # Modules
//! - `limbs`: big integer <-> fixed-width limb and bit vectors
//! - `primality`: Rabin-Miller witness records for the primality circuit
//! - `hash`: Poseidon over the Pallas base field, lazily initialized
//! - `rsa`: RSA-65537 keypairs used as a commitment trapdoor
//! - `utxo`: commitments, secret hashes and nullifier hashes
//! - `user`: registration, minting and UTXO checking
//! - `accumulator`: RSA accumulator with decryption-style proofs
//! - `witness`: serializable circuit input records
//!
//! # Example
//! ```ignore
//! use rand::rngs::OsRng;
//! use rsa_utxo_protocol::User;
//!
//! let user = User::register(1024, &mut OsRng)?;
//! let utxo = user.mint_utxo(&mut OsRng)?;
//! assert!(user.check_utxo(&utxo, 64, 16)?);
//! ```

pub mod accumulator;
pub mod error;
pub mod hash;
pub mod limbs;
pub mod primality;
pub mod primes;
pub mod rsa;
pub mod user;
pub mod utxo;
pub mod witness;

#[cfg(test)]
mod tests;

// Protocol exports
pub use accumulator::{Accumulator, AccumulatorBits, SharedAccumulator};
pub use rsa::{KeyPair, PUBLIC_EXPONENT};
pub use user::User;
pub use utxo::Utxo;

// Circuit encoding
pub use limbs::{from_bits, from_limbs, to_bits, to_limbs, to_limbs_checked, LimbLayout, OverflowPolicy};
pub use primality::{generate_rabin_miller_input, RabinMillerInput};
pub use witness::{AccumulatorSpendInput, PowModInput, UtxoSpendInput};

// Error handling
pub use error::validation;
pub use error::{ProtocolError, ProtocolResult};

// Re-export the hash field and big integers
pub use num_bigint::BigUint;
pub use pasta_curves::Fp;
