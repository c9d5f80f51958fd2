//! Scene image synthesis stage.

use async_trait::async_trait;
use tracing::info;

use reel_models::{Asset, AssetType, Project, ProjectStatus};
use reel_pipeline::{Stage, StageError, StageOutput};

use crate::client::GenerationClient;
use crate::require_script;

/// Synthesizes one still image per scene.
///
/// Safe to re-run: images are keyed by scene index and overwrite the
/// previous attempt's output for that scene.
pub struct ImageStage {
    client: GenerationClient,
}

impl ImageStage {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Stage for ImageStage {
    fn status(&self) -> ProjectStatus {
        ProjectStatus::GeneratingImages
    }

    async fn execute(&self, project: &Project) -> Result<StageOutput, StageError> {
        let script = require_script(project)?;
        let (width, height) = project.video_format.dimensions();

        let mut assets = Vec::with_capacity(script.len());
        for (i, scene) in script.scenes.iter().enumerate() {
            let url = self
                .client
                .generate_image(&scene.line, i as u32, width, height)
                .await?;
            assets.push(Asset::new(AssetType::Image, url).for_scene(i as u32));
        }

        info!(project_id = %project.id, images = assets.len(), "Scene images generated");
        Ok(StageOutput::none().with_assets(assets))
    }
}
