//! Script generation stage.

use async_trait::async_trait;
use tracing::info;

use reel_models::{Project, ProjectStatus, Script};
use reel_pipeline::{Stage, StageError, StageOutput};

use crate::client::GenerationClient;

/// Generates the project's script from its prompt.
///
/// Safe to re-run: the whole script is produced in one call and replaces
/// any previous value.
pub struct ScriptStage {
    client: GenerationClient,
}

impl ScriptStage {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Stage for ScriptStage {
    fn status(&self) -> ProjectStatus {
        ProjectStatus::GeneratingScript
    }

    async fn execute(&self, project: &Project) -> Result<StageOutput, StageError> {
        let scenes = self
            .client
            .generate_script(&project.script_prompt, project.category.as_deref())
            .await?;

        if scenes.is_empty() {
            return Err(StageError::execution(
                "Script service returned an empty script",
            ));
        }

        info!(project_id = %project.id, scenes = scenes.len(), "Script generated");
        Ok(StageOutput::none().with_script(Script::new(scenes)))
    }
}
