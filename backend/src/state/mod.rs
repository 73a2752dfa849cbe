// State management module
// Handles the item model, the file-backed collection and shared handler state

/// Shared handler state
pub mod app_state;
/// Item record and collection helpers
pub mod item;
/// Collection file storage
pub mod persistence;

pub use app_state::{AppState, SharedState};
pub use item::Item;
pub use persistence::{ItemStore, PersistenceError};
