//! Database models for the liquor inventory platform
//!
//! Re-exports the models and report shapes from the shared crate

pub use shared::models::*;
