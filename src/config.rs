//! Storage configuration
//!
//! All on-disk locations used by the service flow from [`StorageConfig`];
//! nothing is created implicitly at import time. Directories are created
//! once at server start (or before a CLI train run).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default upload ceiling: 5 MB, matching the public contract.
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// Where results and temporary uploads live, and how large an upload may be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for persisted winning models and prediction tables
    pub results_dir: PathBuf,
    /// Directory for raw uploaded datasets
    pub temp_dir: PathBuf,
    /// Upload size ceiling in bytes
    pub max_upload_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            results_dir: std::env::var("RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./results")),
            temp_dir: std::env::var("TEMP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./temp_data")),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
        }
    }
}

impl StorageConfig {
    /// Config rooted at a single base directory, used by tests and the CLI.
    pub fn rooted(base: &Path) -> Self {
        Self {
            results_dir: base.join("results"),
            temp_dir: base.join("temp_data"),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }

    /// Create both directories if they do not exist yet.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.results_dir)?;
        std::fs::create_dir_all(&self.temp_dir)?;
        Ok(())
    }
}
