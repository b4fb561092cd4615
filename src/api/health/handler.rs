// Health handlers

use serde_json::json;
use axum::{http::StatusCode, extract::State};
use tracing::{instrument, info, warn};

use crate::config::state::AppState;
use crate::database::DatabaseHandle;
use crate::utils::response_handler::HandlerResponse;

/// Returns API status information
#[instrument(skip(state))]
pub async fn status_handler<D: DatabaseHandle>(State(state): State<AppState<D>>) -> HandlerResponse {
    info!("Status endpoint called");

    HandlerResponse::new(StatusCode::OK)
        .data(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "status": "healthy",
            "environment": state.environment.environment.as_ref()
        }))
        .message("API is running successfully")
}

/// Health check endpoint that verifies database connectivity
#[instrument(skip(state))]
pub async fn health_check<D: DatabaseHandle>(State(state): State<AppState<D>>) -> HandlerResponse {
    info!("Database health check called");

    match state.database.get_connection().await {
        Ok(_) => HandlerResponse::new(StatusCode::OK)
            .data(json!({ "database": "connected" }))
            .message("Database connection healthy"),
        Err(e) => {
            warn!("Database health check failed: {:#}", e);
            HandlerResponse::new(StatusCode::SERVICE_UNAVAILABLE)
                .data(json!({ "database": "disconnected", "error": e.to_string() }))
                .message("Database connection failed")
        }
    }
}
