//! YouTube connector error types.

use thiserror::Error;

/// Result type for YouTube operations.
pub type YouTubeResult<T> = Result<T, YouTubeError>;

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("No YouTube account connected")]
    NotConnected,

    #[error("OAuth configuration error: {0}")]
    Config(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("YouTube API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Store error: {0}")]
    Store(#[from] reel_store::StoreError),
}

impl YouTubeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn token_exchange(msg: impl Into<String>) -> Self {
        Self::TokenExchange(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }
}
