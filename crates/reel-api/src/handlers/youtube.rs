//! YouTube connection API handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
}

#[derive(Serialize)]
pub struct ConnectionResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
}

/// The redirect URL that starts the OAuth authorization flow.
pub async fn get_auth_url(State(state): State<AppState>) -> ApiResult<Json<AuthUrlResponse>> {
    let auth_url = state.youtube.authorize_url()?;
    Ok(Json(AuthUrlResponse { auth_url }))
}

/// OAuth callback: exchange the code and persist the connection.
pub async fn handle_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Json<ConnectionResponse>> {
    if query.code.is_empty() {
        return Err(ApiError::bad_request("Missing authorization code"));
    }

    let connection = state.youtube.exchange_code(&query.code).await?;
    state.store.connections().set(&connection).await?;

    Ok(Json(ConnectionResponse {
        connected: true,
        channel_title: connection.channel_title,
    }))
}

/// Current connection status; polled by clients, no side effects.
pub async fn get_connection(State(state): State<AppState>) -> ApiResult<Json<ConnectionResponse>> {
    let connection = state.store.connections().get().await?;
    Ok(Json(match connection {
        Some(conn) => ConnectionResponse {
            connected: true,
            channel_title: conn.channel_title,
        },
        None => ConnectionResponse {
            connected: false,
            channel_title: None,
        },
    }))
}

/// Revoke the stored credential and forget the connection.
pub async fn disconnect(State(state): State<AppState>) -> ApiResult<Json<ConnectionResponse>> {
    let connection = state
        .store
        .connections()
        .get()
        .await?
        .ok_or_else(|| ApiError::not_found("No YouTube connection"))?;

    // The stored credential is cleared even when the provider refuses the
    // revocation; the account owner can always revoke from their side.
    if let Err(e) = state.youtube.revoke(&connection).await {
        warn!("Token revocation failed, clearing connection anyway: {}", e);
    }
    state.store.connections().clear().await?;

    info!(channel_id = %connection.channel_id, "YouTube account disconnected");
    Ok(Json(ConnectionResponse {
        connected: false,
        channel_title: None,
    }))
}
