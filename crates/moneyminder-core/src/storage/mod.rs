mod config;
pub mod json_path;
pub mod kv;

pub use config::{AppConfig, LoggingConfig, SchedulerConfig};
pub use kv::{FileStore, KeyValueStore, MemoryStore};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the data directory.
///
/// `MONEYMINDER_DATA_DIR` wins when set. Otherwise this is
/// `~/.config/moneyminder[-dev]/`, with `MONEYMINDER_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("MONEYMINDER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("MONEYMINDER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("moneyminder-dev")
            } else {
                base_dir.join("moneyminder")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
