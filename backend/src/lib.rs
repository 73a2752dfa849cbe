//! Item Service Backend Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
/// Application state management
///
/// Handles the item model, collection persistence and shared handler state.
pub mod state;

pub use api::router as build_router;
