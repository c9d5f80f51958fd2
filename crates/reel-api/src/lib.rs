//! HTTP API for Reelforge.
//!
//! Thin axum surface over the orchestrator, scheduler and store. Stage and
//! upload failures never surface here as errors; clients observe them by
//! polling project status.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
