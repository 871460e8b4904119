//! HTTP handlers

pub mod health;
pub mod reconciliation;

pub use health::health_check;
pub use reconciliation::{get_merma_report, get_restock_report};
