//! Scheduled job API handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use reel_models::{JobId, ScheduledJob, VideoFormat};
use reel_scheduler::CronExpression;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    pub cron_expression: String,
    #[validate(length(min = 1, message = "topic_category must not be empty"))]
    pub topic_category: String,
    #[serde(default)]
    pub video_format: VideoFormat,
    #[serde(default)]
    pub auto_upload: bool,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub id: String,
    pub name: String,
    pub cron_expression: String,
    pub topic_category: String,
    pub video_format: String,
    pub auto_upload: bool,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl JobResponse {
    fn from_job(job: &ScheduledJob) -> Self {
        Self {
            id: job.id.to_string(),
            name: job.name.clone(),
            cron_expression: job.cron_expression.clone(),
            topic_category: job.topic_category.clone(),
            video_format: job.video_format.to_string(),
            auto_upload: job.auto_upload,
            enabled: job.enabled,
            last_run_at: job.last_run_at,
            next_run_at: job.next_run_at,
            created_at: job.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct JobListResponse {
    pub items: Vec<JobResponse>,
}

/// Create a recurring production job.
///
/// A malformed cron expression rejects the request before anything is
/// persisted; existing jobs are unaffected.
pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<Json<JobResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let cron = CronExpression::parse(&request.cron_expression)
        .map_err(|e| ApiError::bad_request(format!("Invalid cron expression: {e}")))?;

    let mut job = ScheduledJob::new(request.name, request.cron_expression, request.topic_category)
        .with_video_format(request.video_format)
        .with_auto_upload(request.auto_upload);
    job.next_run_at = cron.next_after(Utc::now());

    state.store.jobs().create(&job).await?;
    info!(job_id = %job.id, name = %job.name, "Scheduled job created");

    Ok(Json(JobResponse::from_job(&job)))
}

/// List all scheduled jobs.
pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<JobListResponse>> {
    let jobs = state.store.jobs().list().await?;
    Ok(Json(JobListResponse {
        items: jobs.iter().map(JobResponse::from_job).collect(),
    }))
}

/// Enable a job. The next due time is recomputed from now, so a long
/// disabled spell does not fire a backlog.
pub async fn enable_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let id = JobId::from(job_id);
    let job = state.store.jobs().get_required(&id).await?;

    let next_run = CronExpression::parse(&job.cron_expression)
        .ok()
        .and_then(|cron| cron.next_after(Utc::now()));
    let job = job.set_enabled(true).reschedule(next_run);

    state.store.jobs().update(&job).await?;
    Ok(Json(JobResponse::from_job(&job)))
}

/// Disable a job. Takes effect on the next tick; never happens implicitly.
pub async fn disable_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let id = JobId::from(job_id);
    let job = state.store.jobs().get_required(&id).await?.set_enabled(false);
    state.store.jobs().update(&job).await?;
    Ok(Json(JobResponse::from_job(&job)))
}

/// Delete a job. Projects it already created are untouched.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = JobId::from(job_id);
    state.store.jobs().delete(&id).await?;
    Ok(Json(serde_json::json!({
        "message": "Job deleted",
        "job_id": id.to_string(),
    })))
}
