//! API handlers.

pub mod jobs;
pub mod projects;
pub mod youtube;

use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

/// Health check endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "reel-api",
    }))
}

/// Readiness check endpoint.
pub async fn ready() -> StatusCode {
    StatusCode::OK
}
