//! End-to-end protocol run
//!
//! Registers a user, mints and checks a UTXO, builds an RSA accumulator and
//! collects every circuit input record produced along the way.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use rsa_utxo_protocol::{
    generate_rabin_miller_input, primes::random_prime, Accumulator, AccumulatorSpendInput,
    PowModInput, RabinMillerInput, User, UtxoSpendInput,
};

use crate::config::Config;
use crate::output::write_json;

/// Records produced by one run
#[derive(Debug, Clone)]
pub struct Records {
    /// `m^65537 mod N` for a random prime message under the user's key
    pub rsa_pow_mod: PowModInput,
    /// Rabin-Miller inputs for the user's modulus size
    pub rabin_miller: RabinMillerInput,
    pub utxo_spend: UtxoSpendInput,
    /// `g^secret mod N` that produced the accumulator's initial value
    pub accumulator_pow_mod: PowModInput,
    pub accumulator_spend: AccumulatorSpendInput,
}

impl Records {
    /// Write every record under `dir`, returning the written paths.
    pub fn write_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(vec![
            write_json(dir, "rsa_pow_mod.json", &self.rsa_pow_mod)?,
            write_json(dir, "rabin_miller.json", &self.rabin_miller)?,
            write_json(dir, "utxo_spend.json", &self.utxo_spend)?,
            write_json(dir, "accumulator_pow_mod.json", &self.accumulator_pow_mod)?,
            write_json(dir, "accumulator_spend.json", &self.accumulator_spend)?,
        ])
    }
}

/// Drives the protocol with one configuration
#[derive(Debug, Clone)]
pub struct Harness {
    config: Config,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run every protocol step. Blocking: key and prime searches dominate.
    pub fn run<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> Result<Records> {
        let config = &self.config;
        let layout = config.utxo_layout()?;

        tracing::info!(bits = config.key_bits, "Registering user...");
        let user = User::register(config.key_bits, rng).context("user registration failed")?;
        let key = user.key_pair();

        let utxo = user.mint_utxo(rng).context("minting failed")?;
        let owned = user.check_utxo_with(&utxo, &layout)?;
        ensure!(owned, "freshly minted UTXO does not open under its owner's key");
        tracing::info!("UTXO minted and checked");

        let message = random_prime(rng, config.key_bits - 1)?;
        let rsa_pow_mod = key.pow_mod_input(&message, &layout)?;

        let candidate = random_prime(rng, config.key_bits / 2)?;
        let rabin_miller = generate_rabin_miller_input(&candidate, config.rabin_miller_rounds, rng)?;

        let utxo_spend = utxo.spend_input(&layout)?;

        tracing::info!("Initializing accumulator...");
        let acc_layout = config.accumulator_layout()?;
        let mut acc = Accumulator::initialize(config.accumulator, rng).context("accumulator setup failed")?;
        let accumulator_pow_mod = acc.pow_mod_input(&acc_layout)?;

        let member = random_prime(rng, config.member_bits)?;
        let proof = acc.generate_proof(&member)?;
        ensure!(acc.verify_proof(&member, &proof), "membership proof did not verify");

        acc.accumulate(&member)?;
        let accumulator_spend = acc.spend_input(&next_member(&member), &acc_layout)?;
        tracing::info!(members = acc.members(), "Accumulator records generated");

        Ok(Records {
            rsa_pow_mod,
            rabin_miller,
            utxo_spend,
            accumulator_pow_mod,
            accumulator_spend,
        })
    }
}

// Odd successor, so a spend never reuses the accumulated member
fn next_member(x: &BigUint) -> BigUint {
    x + 2u32
}
