// Application state management
// Shared by every handler behind `Arc<RwLock<_>>`; the lock serializes
// read-modify-write cycles on the collection file.

use super::persistence::ItemStore;
use crate::config::{Config, DEFAULT_MAX_UPLOAD_BYTES};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Handle passed to every handler
pub type SharedState = Arc<RwLock<AppState>>;

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Backing storage for items and uploads
    pub store: ItemStore,
    /// Largest accepted image upload, in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create application state over an existing store
    pub fn new(store: ItemStore) -> Self {
        Self {
            store,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Create application state from configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            store: ItemStore::from_config(&config.storage),
            max_upload_bytes: config.storage.max_upload_bytes,
        }
    }

    /// Override the upload size limit
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Wrap into the shared handle used by the router
    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }
}
