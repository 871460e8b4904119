//! Route definitions for the liquor inventory platform

use axum::{routing::get, Router};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Branch-scoped reports
        .nest("/branches", branch_routes())
}

/// Report routes for one branch
fn branch_routes() -> Router<AppState> {
    Router::new()
        .route("/:branch_id/restock", get(handlers::get_restock_report))
        .route("/:branch_id/merma", get(handlers::get_merma_report))
}
