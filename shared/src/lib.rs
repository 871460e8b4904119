//! Shared types, models and the reconciliation engine for the liquor
//! inventory platform
//!
//! The backend loads snapshots from storage and serves the reports; all
//! reconciliation math lives here so it can be tested without a database.

pub mod error;
pub mod models;
pub mod reconciliation;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
