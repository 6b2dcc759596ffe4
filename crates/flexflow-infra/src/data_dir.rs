//! Data directory resolution.
//!
//! The data directory holds `config.toml` and the SQLite database.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "FLEXFLOW_DATA_DIR";

/// Resolve the data directory.
///
/// Priority:
/// 1. `explicit`, when the caller was given one (e.g. `--data-dir`)
/// 2. `FLEXFLOW_DATA_DIR` environment variable
/// 3. `~/.flexflow`
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }

    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".flexflow");
    }

    // Last resort: current directory
    PathBuf::from(".flexflow")
}
