//! API routes.

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::handlers::jobs::{create_job, delete_job, disable_job, enable_job, list_jobs};
use crate::handlers::projects::{
    cancel_project, create_project, get_project, list_projects, list_voices, regenerate_audio,
    regenerate_video, retry_project, update_cast, update_youtube_metadata,
};
use crate::handlers::youtube::{disconnect, get_auth_url, get_connection, handle_callback};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let project_routes = Router::new()
        .route("/projects", post(create_project))
        .route("/projects", get(list_projects))
        .route("/projects/:project_id", get(get_project))
        .route("/projects/:project_id/cancel", post(cancel_project))
        .route("/projects/:project_id/retry", post(retry_project))
        // Regeneration reuses the stored script/cast
        .route("/projects/:project_id/regenerate-audio", post(regenerate_audio))
        .route("/projects/:project_id/regenerate-video", post(regenerate_video))
        .route("/projects/:project_id/cast", put(update_cast))
        .route(
            "/projects/:project_id/youtube-metadata",
            put(update_youtube_metadata),
        )
        .route("/voices", get(list_voices));

    let job_routes = Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs", get(list_jobs))
        .route("/jobs/:job_id/enable", post(enable_job))
        .route("/jobs/:job_id/disable", post(disable_job))
        .route("/jobs/:job_id", delete(delete_job));

    let youtube_routes = Router::new()
        .route("/youtube/auth-url", get(get_auth_url))
        .route("/youtube/callback", get(handle_callback))
        .route("/youtube/connection", get(get_connection))
        .route("/youtube/connection", delete(disconnect));

    let api_routes = Router::new()
        .merge(project_routes)
        .merge(job_routes)
        .merge(youtube_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Generated assets are served from the configured media directory;
    // absolute asset URLs never hit this mount.
    let static_service = ServeDir::new(&state.config.static_dir);

    Router::new()
        .nest("/api", api_routes)
        .nest_service(&state.config.static_base, static_service)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
