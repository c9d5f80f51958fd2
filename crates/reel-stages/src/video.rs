//! Video composition stage.

use async_trait::async_trait;
use tracing::info;

use reel_models::{Asset, AssetType, Project, ProjectStatus};
use reel_pipeline::{Stage, StageError, StageOutput};

use crate::client::GenerationClient;

/// Composes scene images and audio into the final video.
///
/// Safe to re-run: there is a single video asset per project and it is
/// overwritten by each run.
pub struct VideoStage {
    client: GenerationClient,
}

impl VideoStage {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }

    /// Asset URLs of one type ordered by scene index.
    fn ordered_urls(project: &Project, asset_type: AssetType) -> Vec<String> {
        let mut assets: Vec<&Asset> = project.assets_of_type(asset_type);
        assets.sort_by_key(|a| a.scene_index);
        assets.iter().map(|a| a.url.clone()).collect()
    }
}

#[async_trait]
impl Stage for VideoStage {
    fn status(&self) -> ProjectStatus {
        ProjectStatus::GeneratingVideo
    }

    async fn execute(&self, project: &Project) -> Result<StageOutput, StageError> {
        let images = Self::ordered_urls(project, AssetType::Image);
        let audio = Self::ordered_urls(project, AssetType::Audio);

        if images.is_empty() {
            return Err(StageError::execution("No scene images to compose"));
        }
        if audio.is_empty() {
            return Err(StageError::execution("No audio files to compose into video"));
        }
        if images.len() != audio.len() {
            return Err(StageError::execution(format!(
                "Scene asset mismatch: {} images vs {} audio clips",
                images.len(),
                audio.len()
            )));
        }

        let (width, height) = project.video_format.dimensions();
        let url = self
            .client
            .compose_video(&images, &audio, width, height)
            .await?;

        info!(project_id = %project.id, "Video composed");
        Ok(StageOutput::none().with_assets(vec![Asset::new(AssetType::Video, url)]))
    }
}
