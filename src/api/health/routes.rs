// Health route definitions

use axum::{
    routing::get,
    Router,
};

use crate::config::state::AppState;
use crate::database::DatabaseHandle;
use super::handler;

/// Creates router with the service status and database health endpoints
pub fn health_routes<D: DatabaseHandle>() -> Router<AppState<D>> {
    Router::new()
        .route("/status", get(handler::status_handler::<D>))
        .route("/db/health", get(handler::health_check::<D>))
}
