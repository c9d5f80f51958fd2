//! Scheduled job model (recurring production requests).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::format::VideoFormat;

/// Unique identifier for a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
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

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A recurring production request.
///
/// `last_run_at`/`next_run_at` are maintained by the scheduler; everything
/// else is set by the API caller. Disabling is always an explicit external
/// action, never an implicit reaction to failure.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScheduledJob {
    /// Unique job ID
    pub id: JobId,

    /// Human-readable name
    pub name: String,

    /// 5-field cron expression (minute granularity, UTC)
    pub cron_expression: String,

    /// Topic category seeded into created projects
    pub topic_category: String,

    /// Video format for created projects
    #[serde(default)]
    pub video_format: VideoFormat,

    /// Whether created projects upload automatically
    #[serde(default)]
    pub auto_upload: bool,

    /// Whether the scheduler considers this job at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Last time the scheduler ran this job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,

    /// Earliest due time consistent with the cron expression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl ScheduledJob {
    /// Create a new enabled job. `next_run_at` is left for the scheduler
    /// (or the creating handler) to compute from the cron expression.
    pub fn new(
        name: impl Into<String>,
        cron_expression: impl Into<String>,
        topic_category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            name: name.into(),
            cron_expression: cron_expression.into(),
            topic_category: topic_category.into(),
            video_format: VideoFormat::default(),
            auto_upload: false,
            enabled: true,
            last_run_at: None,
            next_run_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the video format.
    pub fn with_video_format(mut self, format: VideoFormat) -> Self {
        self.video_format = format;
        self
    }

    /// Request auto-upload on created projects.
    pub fn with_auto_upload(mut self, auto_upload: bool) -> Self {
        self.auto_upload = auto_upload;
        self
    }

    /// Check if the job is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_run_at.is_some_and(|t| t <= now)
    }

    /// Record a run and the recomputed next due time.
    pub fn record_run(mut self, now: DateTime<Utc>, next_run_at: Option<DateTime<Utc>>) -> Self {
        self.last_run_at = Some(now);
        self.next_run_at = next_run_at;
        self.updated_at = Utc::now();
        self
    }

    /// Advance the next due time without recording a run (skipped or failed
    /// occurrence; a missed tick is not replayed).
    pub fn reschedule(mut self, next_run_at: Option<DateTime<Utc>>) -> Self {
        self.next_run_at = next_run_at;
        self.updated_at = Utc::now();
        self
    }

    /// Flip the enabled flag.
    pub fn set_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self.updated_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_job_creation() {
        let job = ScheduledJob::new("daily shorts", "0 2 * * *", "tech").with_auto_upload(true);
        assert!(job.enabled);
        assert!(job.auto_upload);
        assert!(job.last_run_at.is_none());
        assert!(job.next_run_at.is_none());
    }

    #[test]
    fn test_is_due() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut job = ScheduledJob::new("j", "* * * * *", "tech");
        assert!(!job.is_due(now), "no next_run_at means never due");

        job.next_run_at = Some(now - chrono::Duration::minutes(1));
        assert!(job.is_due(now));

        let disabled = job.clone().set_enabled(false);
        assert!(!disabled.is_due(now), "disabled jobs are never due");
    }

    #[test]
    fn test_record_run() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 6, 2, 2, 0, 0).unwrap();
        let job = ScheduledJob::new("j", "0 2 * * *", "tech").record_run(now, Some(next));
        assert_eq!(job.last_run_at, Some(now));
        assert_eq!(job.next_run_at, Some(next));
    }
}
