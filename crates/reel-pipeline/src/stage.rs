//! The stage contract every production step implements.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use reel_models::{Asset, CastList, Project, ProjectStatus, Script};

/// Typed failure from a stage.
///
/// A stage failure is terminal for the project: the orchestrator records it
/// and stops. There is no implicit retry loop, because re-running an
/// external generation call without being asked can repeat a billed,
/// non-idempotent operation.
#[derive(Debug, Error)]
pub enum StageError {
    /// An external generation/upload step failed.
    #[error("{0}")]
    Execution(String),

    /// Upload was attempted without a connected platform account.
    #[error("YouTube account not connected")]
    AuthRequired,
}

impl StageError {
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }
}

/// What a stage produced.
///
/// Everything in the output is persisted together with the status advance
/// in a single atomic write, so a crash can only ever lose the whole stage.
#[derive(Debug, Default)]
pub struct StageOutput {
    /// Generated script (script stage only)
    pub script: Option<Script>,
    /// Voice assignments (casting stage only)
    pub cast: Option<CastList>,
    /// New assets, keyed by (type, scene) when merged into the project
    pub assets: Vec<Asset>,
    /// Uploaded video ID (upload stage only)
    pub youtube_video_id: Option<String>,
    /// Watch URL (upload stage only)
    pub youtube_url: Option<String>,
}

impl StageOutput {
    /// Output with nothing in it.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    pub fn with_cast(mut self, cast: CastList) -> Self {
        self.cast = Some(cast);
        self
    }

    pub fn with_assets(mut self, assets: Vec<Asset>) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_upload(mut self, video_id: impl Into<String>, url: impl Into<String>) -> Self {
        self.youtube_video_id = Some(video_id.into());
        self.youtube_url = Some(url.into());
        self
    }
}

/// A production stage.
///
/// Restart-safety contract: the orchestrator delivers at-least-once
/// execution per stage, never per pipeline. After a crash the stage for the
/// recorded status runs again from the top, so implementations must be safe
/// to re-run against the same project state: overwrite your own outputs,
/// never assume a previous partial run left usable state behind.
#[async_trait]
pub trait Stage: Send + Sync {
    /// The lifecycle state this stage runs in.
    fn status(&self) -> ProjectStatus;

    /// Run the stage against the current project state.
    async fn execute(&self, project: &Project) -> Result<StageOutput, StageError>;
}

/// Stage implementations keyed by the status they run in.
#[derive(Default)]
pub struct StageRegistry {
    stages: HashMap<ProjectStatus, Arc<dyn Stage>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stage under its own status. Replaces any previous
    /// registration for that status.
    pub fn register(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.insert(stage.status(), stage);
        self
    }

    /// The stage registered for a status.
    pub fn get(&self, status: ProjectStatus) -> Option<Arc<dyn Stage>> {
        self.stages.get(&status).map(Arc::clone)
    }

    /// Statuses that have no registered stage but need one.
    pub fn missing_stages(&self) -> Vec<ProjectStatus> {
        [
            ProjectStatus::GeneratingScript,
            ProjectStatus::Casting,
            ProjectStatus::GeneratingImages,
            ProjectStatus::GeneratingAudio,
            ProjectStatus::GeneratingVideo,
            ProjectStatus::UploadingYoutube,
        ]
        .into_iter()
        .filter(|s| !self.stages.contains_key(s))
        .collect()
    }
}
