//! Pipeline orchestrator.
//!
//! Drives each project through the fixed stage order, persisting every
//! transition as a single atomic row write before the next stage begins.
//! Distinct projects run as independent tasks; within one project stages
//! are strictly sequential, and a per-project run guard keeps the
//! orchestrator the only writer of that project's record.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use metrics::counter;
use tracing::{error, info, warn};

use reel_models::{
    AssetType, CastList, JobId, Project, ProjectId, ProjectStatus, Script, VideoFormat,
    YouTubeMetadata,
};
use reel_store::Store;

use crate::error::{PipelineError, PipelineResult};
use crate::stage::{StageOutput, StageRegistry};

/// Error message recorded when a cancel request is observed.
pub const CANCELLED_MESSAGE: &str = "Cancelled by user";

/// Parameters for creating a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub script_prompt: String,
    pub category: Option<String>,
    pub auto_upload: bool,
    pub video_format: VideoFormat,
    pub job_id: Option<JobId>,
}

/// Stage to restart from when regenerating a finished project's media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regenerate {
    Audio,
    Video,
}

/// The production pipeline orchestrator.
///
/// Cheap to clone; clones share the run guards and cancel flags.
#[derive(Clone)]
pub struct Orchestrator {
    store: Store,
    stages: Arc<StageRegistry>,
    running: Arc<Mutex<HashSet<ProjectId>>>,
    cancel_requested: Arc<Mutex<HashSet<ProjectId>>>,
}

impl Orchestrator {
    /// Create a new orchestrator over a store and a stage registry.
    pub fn new(store: Store, stages: StageRegistry) -> Self {
        let missing = stages.missing_stages();
        if !missing.is_empty() {
            warn!(?missing, "Stage registry is incomplete; projects reaching these states will fail to advance");
        }
        Self {
            store,
            stages: Arc::new(stages),
            running: Arc::new(Mutex::new(HashSet::new())),
            cancel_requested: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Create a project in `Draft` and persist it. Does not start the
    /// pipeline; pair with [`Orchestrator::start`].
    pub async fn create_project(&self, new: NewProject) -> PipelineResult<Project> {
        let mut project = Project::new(new.title, new.script_prompt)
            .with_auto_upload(new.auto_upload)
            .with_video_format(new.video_format);
        if let Some(category) = new.category {
            project = project.with_category(category);
        }
        if let Some(job_id) = new.job_id {
            project = project.with_job(job_id);
        }

        self.store.projects().create(&project).await?;
        counter!("reel_projects_created_total").increment(1);
        Ok(project)
    }

    /// Spawn a background task driving the project to a terminal state.
    pub fn start(&self, id: ProjectId) {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            match orchestrator.drive(&id).await {
                Ok(project) => {
                    info!(project_id = %id, status = %project.status, "Pipeline finished")
                }
                // Another driver already owns this project; nothing to do.
                Err(PipelineError::AlreadyRunning(_)) => {}
                Err(e) => error!(project_id = %id, "Pipeline error: {}", e),
            }
        });
    }

    /// Drive a project from its current recorded status to a terminal
    /// state, returning the final record.
    ///
    /// Safe to call after a crash: the loop re-invokes the stage for the
    /// recorded status and continues from there. Concurrent calls for the
    /// same project are rejected with [`PipelineError::AlreadyRunning`].
    pub async fn drive(&self, id: &ProjectId) -> PipelineResult<Project> {
        if !self.claim(id) {
            return Err(PipelineError::AlreadyRunning(id.clone()));
        }
        let result = self.drive_claimed(id).await;
        self.release(id);
        result
    }

    async fn drive_claimed(&self, id: &ProjectId) -> PipelineResult<Project> {
        let projects = self.store.projects();

        loop {
            let project = projects.get_required(id).await?;

            if project.status.is_terminal() {
                // Drop any cancel request that lost the race against
                // completion, so it cannot leak onto a later retry.
                self.take_cancel_request(id);
                return Ok(project);
            }

            // Stage boundary: cancellation wins before any further work.
            if self.take_cancel_request(id) {
                info!(project_id = %id, "Cancel request observed at stage boundary");
                let failed = project.fail(CANCELLED_MESSAGE);
                projects.update(&failed).await?;
                return Ok(failed);
            }

            // Draft has no stage; step into the first working state.
            if project.status == ProjectStatus::Draft {
                let Some(next) = project.status.next_in_pipeline(project.auto_upload) else {
                    return Ok(project);
                };
                let project = project.advance_to(next);
                projects.update(&project).await?;
                continue;
            }

            let stage = self
                .stages
                .get(project.status)
                .ok_or(PipelineError::NoStageRegistered(project.status))?;

            info!(project_id = %id, stage = %project.status, "Running stage");

            match stage.execute(&project).await {
                Ok(output) => {
                    let Some(next) = project.status.next_in_pipeline(project.auto_upload) else {
                        return Ok(project);
                    };
                    counter!("reel_stages_completed_total", "stage" => project.status.as_str())
                        .increment(1);
                    // One atomic write: stage output plus the advance. A
                    // crash before this line means the stage never happened.
                    let updated = Self::apply_output(project, output).advance_to(next);
                    projects.update(&updated).await?;
                }
                Err(e) => {
                    warn!(project_id = %id, stage = %project.status, "Stage failed: {}", e);
                    counter!("reel_stages_failed_total", "stage" => project.status.as_str())
                        .increment(1);
                    let failed = project.fail(e.to_string());
                    projects.update(&failed).await?;
                    return Ok(failed);
                }
            }
        }
    }

    /// Merge a stage's output into the project record.
    ///
    /// Assets are upserted by (type, scene): a re-run stage overwrites its
    /// own outputs instead of duplicating them, and assets from earlier
    /// stages are never removed.
    fn apply_output(mut project: Project, output: StageOutput) -> Project {
        if let Some(script) = output.script {
            project.script = Some(script);
        }
        if let Some(cast) = output.cast {
            project.cast = Some(cast);
        }
        for asset in output.assets {
            project
                .assets
                .retain(|a| !(a.asset_type == asset.asset_type && a.scene_index == asset.scene_index));
            project.assets.push(asset);
        }
        if let Some(video_id) = output.youtube_video_id {
            project.youtube_video_id = Some(video_id);
        }
        if let Some(url) = output.youtube_url {
            project.youtube_url = Some(url);
        }
        project
    }

    /// Resume every project left in a non-terminal state.
    ///
    /// Called once at startup. Each project re-runs the stage for its
    /// recorded status; stages are required to tolerate that (at-least-once
    /// per stage).
    pub async fn resume_incomplete(&self) -> PipelineResult<usize> {
        let open = self.store.projects().list_non_terminal().await?;
        let count = open.len();
        if count > 0 {
            info!("Resuming {} incomplete project(s)", count);
        }
        for project in open {
            self.start(project.id);
        }
        Ok(count)
    }

    /// Request cancellation of a project.
    ///
    /// Best-effort: an in-flight external stage call is not interrupted;
    /// the flag is observed at the next stage boundary. When no driver is
    /// active the project fails immediately.
    pub async fn cancel(&self, id: &ProjectId) -> PipelineResult<()> {
        let project = self.store.projects().get_required(id).await?;
        if project.status.is_terminal() {
            return Err(PipelineError::invalid_state(format!(
                "project is already {}",
                project.status
            )));
        }

        self.cancel_requested
            .lock()
            .expect("cancel flag lock poisoned")
            .insert(id.clone());

        // No driver running means we are at a boundary right now.
        if self.claim(id) {
            if self.take_cancel_request(id) {
                let project = self.store.projects().get_required(id).await?;
                if !project.status.is_terminal() {
                    let failed = project.fail(CANCELLED_MESSAGE);
                    self.store.projects().update(&failed).await?;
                }
            }
            self.release(id);
        }
        Ok(())
    }

    /// Explicit retry of a failed project: reset to `Draft`, clear the
    /// error, keep already-produced assets, and re-drive. Never automatic.
    pub async fn retry(&self, id: &ProjectId) -> PipelineResult<Project> {
        if self.is_running(id) {
            return Err(PipelineError::AlreadyRunning(id.clone()));
        }
        let project = self.store.projects().get_required(id).await?;
        if project.status != ProjectStatus::Failed {
            return Err(PipelineError::invalid_state(format!(
                "retry requires a failed project, status is {}",
                project.status
            )));
        }

        let reset = project.reset_for_retry();
        self.store.projects().update(&reset).await?;
        self.start(reset.id.clone());
        Ok(reset)
    }

    /// Re-run composition from a chosen stage on a settled project,
    /// reusing the stored script and cast. The stage overwrites its own
    /// assets when it runs again.
    pub async fn regenerate(&self, id: &ProjectId, from: Regenerate) -> PipelineResult<Project> {
        if self.is_running(id) {
            return Err(PipelineError::AlreadyRunning(id.clone()));
        }
        let mut project = self.store.projects().get_required(id).await?;
        if !project.status.is_terminal() {
            return Err(PipelineError::invalid_state(format!(
                "regeneration requires a settled project, status is {}",
                project.status
            )));
        }
        if project.script.is_none() {
            return Err(PipelineError::invalid_state(
                "project has no script to regenerate from",
            ));
        }

        let target = match from {
            Regenerate::Audio => {
                if project.cast.is_none() {
                    return Err(PipelineError::invalid_state(
                        "project needs a cast before regenerating audio",
                    ));
                }
                ProjectStatus::GeneratingAudio
            }
            Regenerate::Video => {
                if project.assets_of_type(AssetType::Audio).is_empty() {
                    return Err(PipelineError::invalid_state(
                        "no audio files to compose into video",
                    ));
                }
                ProjectStatus::GeneratingVideo
            }
        };

        project.error_message = None;
        let reset = project.advance_to(target);
        self.store.projects().update(&reset).await?;
        self.start(reset.id.clone());
        Ok(reset)
    }

    /// Replace the cast on a settled project (voice changes are applied by
    /// a subsequent audio regeneration). Rejected mid-pipeline.
    pub async fn update_cast(&self, id: &ProjectId, cast: CastList) -> PipelineResult<Project> {
        if self.is_running(id) {
            return Err(PipelineError::AlreadyRunning(id.clone()));
        }
        let mut project = self.store.projects().get_required(id).await?;
        if !project.status.is_terminal() {
            return Err(PipelineError::invalid_state(
                "cast can only be edited once the pipeline has settled",
            ));
        }
        match &project.script {
            Some(script) if cast.covers(script) => {}
            Some(_) => {
                return Err(PipelineError::invalid_state(
                    "cast does not cover every speaker in the script",
                ))
            }
            None => {
                return Err(PipelineError::invalid_state("project has no script yet"));
            }
        }

        project.cast = Some(cast);
        project.updated_at = chrono::Utc::now();
        self.store.projects().update(&project).await?;
        Ok(project)
    }

    /// Set the upload metadata used by the upload stage. Rejected once the
    /// upload has started.
    pub async fn update_youtube_metadata(
        &self,
        id: &ProjectId,
        metadata: YouTubeMetadata,
    ) -> PipelineResult<Project> {
        let mut project = self.store.projects().get_required(id).await?;
        if matches!(
            project.status,
            ProjectStatus::UploadingYoutube | ProjectStatus::Published
        ) {
            return Err(PipelineError::invalid_state(
                "upload metadata is frozen once the upload has started",
            ));
        }

        project.youtube_metadata = Some(metadata);
        project.updated_at = chrono::Utc::now();
        self.store.projects().update(&project).await?;
        Ok(project)
    }

    /// The script of a project, if set. Convenience for handlers.
    pub async fn script(&self, id: &ProjectId) -> PipelineResult<Option<Script>> {
        Ok(self.store.projects().get_required(id).await?.script)
    }

    fn claim(&self, id: &ProjectId) -> bool {
        self.running
            .lock()
            .expect("run guard lock poisoned")
            .insert(id.clone())
    }

    fn release(&self, id: &ProjectId) {
        self.running
            .lock()
            .expect("run guard lock poisoned")
            .remove(id);
    }

    fn is_running(&self, id: &ProjectId) -> bool {
        self.running
            .lock()
            .expect("run guard lock poisoned")
            .contains(id)
    }

    fn take_cancel_request(&self, id: &ProjectId) -> bool {
        self.cancel_requested
            .lock()
            .expect("cancel flag lock poisoned")
            .remove(id)
    }
}
