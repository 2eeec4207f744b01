//! Health check endpoint.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use canon_engine::wire::HEALTH_PATH;
use serde::Serialize;

use crate::db;
use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(HEALTH_PATH, get(health_check))
        .route("/", get(root))
}

/// Health check handler. Unhealthy while the database is unreachable.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, label) = match db::ping(&state.pool).await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Root handler.
async fn root() -> &'static str {
    "Canon Snapshot Store"
}
