//! Application state shared across handlers

use crate::config::StorageConfig;

/// State handed to every request handler.
pub struct AppState {
    pub storage: StorageConfig,
}

impl AppState {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }
}
