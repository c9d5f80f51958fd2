//! Production stage implementations for Reelforge.
//!
//! Each stage wraps a call to the external generation service behind the
//! pipeline's [`Stage`](reel_pipeline::Stage) contract. The generation
//! algorithms themselves are opaque; this crate only knows the wire shape.

pub mod audio;
pub mod casting;
pub mod client;
pub mod config;
pub mod image;
pub mod script;
pub mod video;

pub use audio::AudioStage;
pub use casting::CastingStage;
pub use client::GenerationClient;
pub use config::StageConfig;
pub use image::ImageStage;
pub use script::ScriptStage;
pub use video::VideoStage;

use std::sync::Arc;

use reel_models::{Project, Script};
use reel_pipeline::{StageError, StageRegistry};

/// Registry with the five generation stages wired from config.
///
/// The upload stage lives with the platform connector and is registered
/// separately.
pub fn build_registry(config: &StageConfig) -> StageRegistry {
    let client = GenerationClient::new(config.service_url.clone());

    StageRegistry::new()
        .register(Arc::new(ScriptStage::new(client.clone())))
        .register(Arc::new(CastingStage::new(config.voice_pool.clone())))
        .register(Arc::new(ImageStage::new(client.clone())))
        .register(Arc::new(AudioStage::new(client.clone())))
        .register(Arc::new(VideoStage::new(client)))
}

/// The project's script, required by every stage past script generation.
pub(crate) fn require_script(project: &Project) -> Result<&Script, StageError> {
    match &project.script {
        Some(script) if !script.is_empty() => Ok(script),
        Some(_) => Err(StageError::execution("Project script is empty")),
        None => Err(StageError::execution("Project has no script yet")),
    }
}
