//! Circuit witness records
//!
//! Flat records of named integer and limb-array fields handed to an external
//! constraint-system evaluator. Big integers serialize as decimal strings,
//! which circuit witness calculators accept without precision loss.
//!
//! # Records
//! - [`PowModInput`]: `base^exp mod modulus` (RSA encryption, accumulator setup)
//! - [`UtxoSpendInput`]: spend of an RSA-65537 UTXO
//! - [`AccumulatorSpendInput`]: spend against the RSA accumulator; the
//!   incremental Merkle path is appended by the tree owner
//! - [`crate::primality::RabinMillerInput`]: Rabin-Miller primality inputs

use num_bigint::BigUint;
use serde::Serialize;

/// Serialize a [`BigUint`] as a decimal string
pub mod decimal {
    use num_bigint::BigUint;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }
}

/// Serialize a sequence of [`BigUint`] as decimal strings
pub mod decimal_seq {
    use num_bigint::BigUint;
    use serde::Serializer;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(
        values: &Vec<BigUint>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.to_str_radix(10)))
    }
}

/// Inputs of a modular exponentiation circuit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PowModInput {
    /// Base limbs
    #[serde(serialize_with = "decimal_seq::serialize")]
    pub base: Vec<BigUint>,
    /// Exponent (a single field element)
    #[serde(with = "decimal")]
    pub exp: BigUint,
    /// Modulus limbs
    #[serde(serialize_with = "decimal_seq::serialize")]
    pub modulus: Vec<BigUint>,
    /// Expected `base^exp mod modulus` limbs
    #[serde(serialize_with = "decimal_seq::serialize")]
    pub expected: Vec<BigUint>,
}

/// Inputs of the RSA-65537 UTXO spend circuit
///
/// `secret_hash` and `nullifier_hash` are elements of the Pallas base field
/// (`pasta_curves::Fp`), computed by [`crate::hash`]: width-3 Poseidon with
/// SHA3-256-derived round constants and a Cauchy MDS matrix. A circuit
/// consuming them must use the same field and derivation; circomlib's BN254
/// Poseidon produces different values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoSpendInput {
    #[serde(serialize_with = "decimal_seq::serialize")]
    pub modulus: Vec<BigUint>,
    #[serde(serialize_with = "decimal_seq::serialize")]
    pub commitment: Vec<BigUint>,
    #[serde(serialize_with = "decimal_seq::serialize")]
    pub secret: Vec<BigUint>,
    /// Private decryption exponent limbs
    #[serde(serialize_with = "decimal_seq::serialize")]
    pub d: Vec<BigUint>,
    #[serde(with = "decimal")]
    pub secret_hash: BigUint,
    #[serde(with = "decimal")]
    pub nullifier_hash: BigUint,
}

/// Inputs of the accumulator spend circuit
///
/// `nullifier_hash` uses the same Pallas-field Poseidon as [`UtxoSpendInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorSpendInput {
    #[serde(rename = "N", serialize_with = "decimal_seq::serialize")]
    pub modulus: Vec<BigUint>,
    #[serde(serialize_with = "decimal_seq::serialize")]
    pub witness: Vec<BigUint>,
    #[serde(with = "decimal")]
    pub secret: BigUint,
    #[serde(serialize_with = "decimal_seq::serialize")]
    pub commitment: Vec<BigUint>,
    #[serde(with = "decimal")]
    pub nullifier_hash: BigUint,
}
