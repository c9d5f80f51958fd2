//! Voice casting stage.

use async_trait::async_trait;
use tracing::info;

use reel_models::{CastList, Project, ProjectStatus, VoiceAssignment};
use reel_pipeline::{Stage, StageError, StageOutput};

use crate::require_script;

/// Assigns a voice to every speaker in the script.
///
/// Assignment is deterministic (round-robin over the configured pool in
/// speaker appearance order), so re-running produces the same cast. A cast
/// already covering the script, e.g. edited by the user before a retry, is
/// kept as-is.
pub struct CastingStage {
    voice_pool: Vec<String>,
}

impl CastingStage {
    pub fn new(voice_pool: Vec<String>) -> Self {
        Self { voice_pool }
    }
}

#[async_trait]
impl Stage for CastingStage {
    fn status(&self) -> ProjectStatus {
        ProjectStatus::Casting
    }

    async fn execute(&self, project: &Project) -> Result<StageOutput, StageError> {
        let script = require_script(project)?;

        if self.voice_pool.is_empty() {
            return Err(StageError::execution("No voices configured for casting"));
        }

        if let Some(existing) = &project.cast {
            if existing.covers(script) {
                return Ok(StageOutput::none().with_cast(existing.clone()));
            }
        }

        let mut cast = CastList::default();
        for (i, speaker) in script.speakers().into_iter().enumerate() {
            let voice = &self.voice_pool[i % self.voice_pool.len()];
            cast.insert(speaker, VoiceAssignment::new(voice));
        }

        info!(project_id = %project.id, speakers = cast.0.len(), "Cast assigned");
        Ok(StageOutput::none().with_cast(cast))
    }
}
