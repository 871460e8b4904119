//! Business logic services for the liquor inventory platform

pub mod reconciliation;
pub mod snapshot;

pub use reconciliation::ReconciliationService;
pub use snapshot::SnapshotLoader;
