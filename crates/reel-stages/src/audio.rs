//! Scene audio synthesis stage.

use async_trait::async_trait;
use tracing::info;

use reel_models::{Asset, AssetType, Project, ProjectStatus};
use reel_pipeline::{Stage, StageError, StageOutput};

use crate::client::GenerationClient;
use crate::require_script;

/// Synthesizes narration audio per scene with the cast's voices.
///
/// Safe to re-run: audio is keyed by scene index and overwrites the
/// previous attempt's output for that scene.
pub struct AudioStage {
    client: GenerationClient,
}

impl AudioStage {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Stage for AudioStage {
    fn status(&self) -> ProjectStatus {
        ProjectStatus::GeneratingAudio
    }

    async fn execute(&self, project: &Project) -> Result<StageOutput, StageError> {
        let script = require_script(project)?;
        let cast = project
            .cast
            .as_ref()
            .ok_or_else(|| StageError::execution("Project has no cast before audio generation"))?;

        let mut assets = Vec::with_capacity(script.len());
        for (i, scene) in script.scenes.iter().enumerate() {
            let voice = cast.get(&scene.speaker).ok_or_else(|| {
                StageError::execution(format!("No voice assigned for speaker '{}'", scene.speaker))
            })?;

            let url = self
                .client
                .synthesize_speech(&scene.line, &voice.voice_id, &voice.pitch, &voice.rate)
                .await?;
            assets.push(Asset::new(AssetType::Audio, url).for_scene(i as u32));
        }

        info!(project_id = %project.id, clips = assets.len(), "Scene audio generated");
        Ok(StageOutput::none().with_assets(assets))
    }
}
