//! Service layer for business logic
//!
//! This module contains service abstractions that separate file handling
//! from HTTP handlers, making the code more modular and testable.

pub mod uploads;
