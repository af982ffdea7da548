//! RSA-UTXO Witness Generator
//!
//! Runs the protocol layer end to end and writes the circuit input records
//! as JSON for an external witness calculator.
//!
//! ## Modules
//!
//! - `config`: environment-driven settings
//! - `harness`: the end-to-end protocol run
//! - `output`: JSON record emission
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rand::rngs::OsRng;
//! use rsa_utxo_witness::{Config, Harness};
//!
//! let config = Config::from_env()?;
//! let records = Harness::new(config.clone()).run(&mut OsRng)?;
//! records.write_all(&config.output_dir)?;
//! ```

pub mod config;
pub mod harness;
pub mod output;

// Re-exports for convenience
pub use config::{Config, Environment};
pub use harness::{Harness, Records};
pub use output::write_json;
