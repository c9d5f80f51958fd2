//! Project model and production lifecycle states.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::asset::{Asset, AssetType};
use crate::format::VideoFormat;
use crate::job::JobId;
use crate::script::{CastList, Script};
use crate::youtube::YouTubeMetadata;

/// Unique identifier for a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Generate a new random project ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Production lifecycle state of a project.
///
/// States advance strictly along the pipeline order; the only edge out of
/// order is the failure edge, which any non-terminal state may take.
/// Unknown values are rejected at the serde boundary rather than defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Created, pipeline not started yet
    #[default]
    Draft,
    /// Script generation in progress
    GeneratingScript,
    /// Voice casting in progress
    Casting,
    /// Per-scene image synthesis in progress
    GeneratingImages,
    /// Per-scene audio synthesis in progress
    GeneratingAudio,
    /// Final video composition in progress
    GeneratingVideo,
    /// Pipeline finished, no upload requested
    Completed,
    /// YouTube upload in progress
    UploadingYoutube,
    /// Uploaded to YouTube
    Published,
    /// Pipeline stopped on an error
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::GeneratingScript => "generating_script",
            ProjectStatus::Casting => "casting",
            ProjectStatus::GeneratingImages => "generating_images",
            ProjectStatus::GeneratingAudio => "generating_audio",
            ProjectStatus::GeneratingVideo => "generating_video",
            ProjectStatus::Completed => "completed",
            ProjectStatus::UploadingYoutube => "uploading_youtube",
            ProjectStatus::Published => "published",
            ProjectStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProjectStatus::Completed | ProjectStatus::Published | ProjectStatus::Failed
        )
    }

    /// Check if a production stage runs while the project is in this state.
    ///
    /// `Draft` has no stage (the pipeline advances out of it immediately)
    /// and terminal states run nothing.
    pub fn is_stage(&self) -> bool {
        matches!(
            self,
            ProjectStatus::GeneratingScript
                | ProjectStatus::Casting
                | ProjectStatus::GeneratingImages
                | ProjectStatus::GeneratingAudio
                | ProjectStatus::GeneratingVideo
                | ProjectStatus::UploadingYoutube
        )
    }

    /// The state that follows this one in the fixed pipeline order.
    ///
    /// Returns `None` for terminal states. With `auto_upload` the success
    /// path out of `GeneratingVideo` goes straight to `UploadingYoutube`;
    /// without it the project settles at `Completed` and the upload edge is
    /// skipped entirely.
    pub fn next_in_pipeline(&self, auto_upload: bool) -> Option<ProjectStatus> {
        match self {
            ProjectStatus::Draft => Some(ProjectStatus::GeneratingScript),
            ProjectStatus::GeneratingScript => Some(ProjectStatus::Casting),
            ProjectStatus::Casting => Some(ProjectStatus::GeneratingImages),
            ProjectStatus::GeneratingImages => Some(ProjectStatus::GeneratingAudio),
            ProjectStatus::GeneratingAudio => Some(ProjectStatus::GeneratingVideo),
            ProjectStatus::GeneratingVideo => {
                if auto_upload {
                    Some(ProjectStatus::UploadingYoutube)
                } else {
                    Some(ProjectStatus::Completed)
                }
            }
            ProjectStatus::UploadingYoutube => Some(ProjectStatus::Published),
            ProjectStatus::Completed | ProjectStatus::Published | ProjectStatus::Failed => None,
        }
    }

    /// Position of this state in the linear pipeline order.
    ///
    /// `Failed` has no position; it is reachable from anywhere non-terminal.
    pub fn pipeline_position(&self) -> Option<usize> {
        match self {
            ProjectStatus::Draft => Some(0),
            ProjectStatus::GeneratingScript => Some(1),
            ProjectStatus::Casting => Some(2),
            ProjectStatus::GeneratingImages => Some(3),
            ProjectStatus::GeneratingAudio => Some(4),
            ProjectStatus::GeneratingVideo => Some(5),
            ProjectStatus::Completed => Some(6),
            ProjectStatus::UploadingYoutube => Some(7),
            ProjectStatus::Published => Some(8),
            ProjectStatus::Failed => None,
        }
    }

    /// Check whether a direct transition to `next` is legal.
    ///
    /// Legal moves: one step forward in pipeline order, the failure edge
    /// from any non-terminal state, or the explicit retry reset
    /// `Failed -> Draft`.
    pub fn can_transition_to(&self, next: ProjectStatus, auto_upload: bool) -> bool {
        if next == ProjectStatus::Failed {
            return !self.is_terminal();
        }
        if *self == ProjectStatus::Failed {
            return next == ProjectStatus::Draft;
        }
        self.next_in_pipeline(auto_upload) == Some(next)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit of work producing one video.
///
/// Mutated exclusively by the orchestrator as stages complete; read by
/// everyone else through status polling.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    /// Unique project ID
    pub id: ProjectId,

    /// Human-readable title
    pub title: String,

    /// Free-text prompt the script is generated from
    pub script_prompt: String,

    /// Optional classification tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Current lifecycle state
    #[serde(default)]
    pub status: ProjectStatus,

    /// Output format for the composed video
    #[serde(default)]
    pub video_format: VideoFormat,

    /// Generated script; set exactly once by the script stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,

    /// Speaker -> voice assignments; set by the casting stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<CastList>,

    /// Generated assets; append-only, never trimmed on failure
    #[serde(default)]
    pub assets: Vec<Asset>,

    /// Error message; set only when status becomes `failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Upload to YouTube after composition succeeds
    #[serde(default)]
    pub auto_upload: bool,

    /// Upload configuration for YouTube
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_metadata: Option<YouTubeMetadata>,

    /// YouTube video ID once published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_video_id: Option<String>,

    /// Watch URL once published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,

    /// Scheduled job that created this project, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,

    /// Creation timestamp (immutable)
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project in `Draft`.
    pub fn new(title: impl Into<String>, script_prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            title: title.into(),
            script_prompt: script_prompt.into(),
            category: None,
            status: ProjectStatus::Draft,
            video_format: VideoFormat::default(),
            script: None,
            cast: None,
            assets: Vec::new(),
            error_message: None,
            auto_upload: false,
            youtube_metadata: None,
            youtube_video_id: None,
            youtube_url: None,
            job_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the category tag.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Request upload after composition.
    pub fn with_auto_upload(mut self, auto_upload: bool) -> Self {
        self.auto_upload = auto_upload;
        self
    }

    /// Set the video format.
    pub fn with_video_format(mut self, format: VideoFormat) -> Self {
        self.video_format = format;
        self
    }

    /// Attribute this project to a scheduled job.
    pub fn with_job(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Move to the given status, bumping `updated_at`.
    pub fn advance_to(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self.updated_at = Utc::now();
        self
    }

    /// Mark as failed with an error message.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = ProjectStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
        self
    }

    /// Reset a failed project for an explicit retry.
    ///
    /// Clears the error and returns to `Draft`; already-produced assets are
    /// kept (stages overwrite their own outputs when re-run).
    pub fn reset_for_retry(mut self) -> Self {
        self.status = ProjectStatus::Draft;
        self.error_message = None;
        self.updated_at = Utc::now();
        self
    }

    /// Assets of one type, in insertion order.
    pub fn assets_of_type(&self, asset_type: AssetType) -> Vec<&Asset> {
        self.assets
            .iter()
            .filter(|a| a.asset_type == asset_type)
            .collect()
    }

    /// Check if audio has been produced (cast edits are rejected after this).
    pub fn has_audio(&self) -> bool {
        self.assets
            .iter()
            .any(|a| a.asset_type == AssetType::Audio)
    }
}
