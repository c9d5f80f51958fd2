//! Application state.

use std::sync::Arc;

use reel_pipeline::Orchestrator;
use reel_stages::{build_registry, StageConfig};
use reel_store::Store;
use reel_youtube::{OAuthConfig, UploadStage, YouTubeClient};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Store,
    pub orchestrator: Orchestrator,
    pub youtube: YouTubeClient,
    pub voice_pool: Vec<String>,
}

impl AppState {
    /// Create application state from environment configuration.
    ///
    /// An unreachable store here is fatal by design: neither the API nor
    /// the scheduler may start against nothing.
    pub async fn from_env(config: ApiConfig) -> Result<Self, reel_store::StoreError> {
        let store = Store::connect(&config.database_url).await?;
        let stage_config = StageConfig::from_env();
        let youtube = YouTubeClient::new(OAuthConfig::from_env());
        Ok(Self::new(config, store, stage_config, youtube))
    }

    /// Assemble state from already-built parts (used by tests).
    pub fn new(
        config: ApiConfig,
        store: Store,
        stage_config: StageConfig,
        youtube: YouTubeClient,
    ) -> Self {
        let registry = build_registry(&stage_config).register(Arc::new(UploadStage::new(
            youtube.clone(),
            store.clone(),
            config.media_base_url(),
        )));
        let orchestrator = Orchestrator::new(store.clone(), registry);

        Self {
            config,
            store,
            orchestrator,
            youtube,
            voice_pool: stage_config.voice_pool,
        }
    }
}
