//! Configuration Module
//!
//! All settings come from environment variables (optionally seeded from a
//! `.env` file). Every variable is optional; a present but malformed value
//! fails at startup instead of surfacing halfway through a key search.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use rsa_utxo_protocol::{AccumulatorBits, LimbLayout, OverflowPolicy};

/// Witness generator settings
#[derive(Debug, Clone)]
pub struct Config {
    /// RSA modulus size for the registered user (default: 1024)
    pub key_bits: u64,

    /// Limb width in bits (default: 64)
    pub chunk_size: usize,

    /// Limbs per RSA-sized integer (default: 16)
    pub chunk_count: usize,

    /// Accumulator prime sizes (default: 2048 / 1024 / 1024 / 128)
    pub accumulator: AccumulatorBits,

    /// Size of the member folded into the accumulator (default: 128)
    pub member_bits: u64,

    /// Bases per Rabin-Miller record (default: 5)
    pub rabin_miller_rounds: usize,

    /// Limb overflow handling (default: reject)
    pub limb_overflow: OverflowPolicy,

    /// Where JSON records are written (default: circuit_input)
    pub output_dir: PathBuf,

    /// development, staging or production
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// # Optional Environment Variables
    ///
    /// - `KEY_BITS`, `CHUNK_SIZE`, `CHUNK_COUNT`
    /// - `ACC_G_BITS`, `ACC_P_BITS`, `ACC_Q_BITS`, `ACC_SECRET_BITS`, `ACC_MEMBER_BITS`
    /// - `RABIN_MILLER_ROUNDS`
    /// - `LIMB_OVERFLOW`: reject | truncate
    /// - `OUTPUT_DIR`
    /// - `ENVIRONMENT`: development | staging | production
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let environment = match lookup("ENVIRONMENT")
            .unwrap_or_else(|| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let limb_overflow = match lookup("LIMB_OVERFLOW") {
            Some(raw) => raw
                .parse::<OverflowPolicy>()
                .context("LIMB_OVERFLOW must be 'reject' or 'truncate'")?,
            None => OverflowPolicy::default(),
        };

        let config = Config {
            key_bits: parse_or(&lookup, "KEY_BITS", 1024)?,
            chunk_size: parse_or(&lookup, "CHUNK_SIZE", 64)?,
            chunk_count: parse_or(&lookup, "CHUNK_COUNT", 16)?,
            accumulator: AccumulatorBits {
                g: parse_or(&lookup, "ACC_G_BITS", 2048)?,
                p: parse_or(&lookup, "ACC_P_BITS", 1024)?,
                q: parse_or(&lookup, "ACC_Q_BITS", 1024)?,
                secret: parse_or(&lookup, "ACC_SECRET_BITS", 128)?,
            },
            member_bits: parse_or(&lookup, "ACC_MEMBER_BITS", 128)?,
            rabin_miller_rounds: parse_or(&lookup, "RABIN_MILLER_ROUNDS", 5)?,
            limb_overflow,
            output_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("circuit_input")),
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks that individual parsing cannot catch
    pub fn validate(&self) -> Result<()> {
        if self.chunk_count < 2 {
            bail!("CHUNK_COUNT must be at least 2, got {}", self.chunk_count);
        }
        if self.is_production() && self.limb_overflow == OverflowPolicy::Truncate {
            bail!("LIMB_OVERFLOW=truncate is not allowed in production");
        }
        let layout = self.utxo_layout().context("CHUNK_SIZE and CHUNK_COUNT must be non-zero")?;
        if self.limb_overflow == OverflowPolicy::Reject && layout.capacity_bits() < self.key_bits {
            bail!(
                "{} limbs of {} bits cannot hold a {}-bit key",
                self.chunk_count,
                self.chunk_size,
                self.key_bits
            );
        }
        Ok(())
    }

    /// Layout for the user's RSA values
    pub fn utxo_layout(&self) -> Result<LimbLayout> {
        Ok(LimbLayout::new(self.chunk_size, self.chunk_count)?.with_overflow(self.limb_overflow))
    }

    /// Layout wide enough for the accumulator's generator and modulus
    pub fn accumulator_layout(&self) -> Result<LimbLayout> {
        let bits = self
            .accumulator
            .g
            .max(self.accumulator.p + self.accumulator.q);
        let width = self.chunk_size.max(1) as u64;
        let count = bits.div_ceil(width).max(2);
        Ok(LimbLayout::new(self.chunk_size, count as usize)?.with_overflow(self.limb_overflow))
    }

    /// Whether this is a production run
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number, got '{}'", key, raw)),
        None => Ok(default),
    }
}
