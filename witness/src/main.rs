//! RSA-UTXO Witness Generator
//!
//! ```text
//! Config (env / .env)
//!        │
//!        ▼
//! Harness::run ── User ── Utxo ── KeyPair
//!        │     └─ Accumulator
//!        ▼
//! OUTPUT_DIR/*.json ──▶ external witness calculator
//! ```

use anyhow::Context;
use rand::rngs::OsRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rsa_utxo_witness::{Config, Harness};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG=debug,rsa_utxo_protocol=trace
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "rsa_utxo_witness=info,rsa_utxo_protocol=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RSA-UTXO witness generator");

    let config = Config::from_env()?;
    tracing::info!(
        key_bits = config.key_bits,
        chunk_size = config.chunk_size,
        chunk_count = config.chunk_count,
        environment = ?config.environment,
        "Configuration loaded"
    );

    let harness = Harness::new(config.clone());
    let records = tokio::task::spawn_blocking(move || harness.run(&mut OsRng))
        .await
        .context("protocol run panicked")??;

    let paths = records.write_all(&config.output_dir)?;
    for path in &paths {
        tracing::info!("Wrote {}", path.display());
    }
    tracing::info!(count = paths.len(), "Circuit inputs written to {}", config.output_dir.display());

    Ok(())
}
