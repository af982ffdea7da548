//! JSON emission of circuit input records

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// Serialize `record` as pretty JSON to `dir/name`, creating `dir` if needed.
pub fn write_json<T: Serialize>(dir: &Path, name: &str, record: &T) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join(name);
    let json = serde_json::to_string_pretty(record).with_context(|| format!("failed to serialize {}", name))?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;

    tracing::debug!(path = %path.display(), "wrote circuit input");
    Ok(path)
}
