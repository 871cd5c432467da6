//! Health check endpoints

use crate::state::HasServices;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness: primary store and search index both reachable
pub async fn ready<S: HasServices>(State(state): State<S>) -> impl IntoResponse {
    let (db_ok, search_ok) = state.check_ready().await;

    if db_ok && search_ok {
        (StatusCode::OK, "ready")
    } else {
        tracing::warn!(db_ok, search_ok, "Readiness check failed");
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    }
}
