//! Project API handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use reel_models::{
    Asset, CastList, Project, ProjectId, VideoFormat, YouTubeMetadata,
};
use reel_pipeline::{NewProject, Regenerate};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "script_prompt must not be empty"))]
    pub script_prompt: String,
    pub category: Option<String>,
    #[serde(default)]
    pub auto_upload: bool,
    #[serde(default)]
    pub video_format: VideoFormat,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

/// Project summary for list views and creation responses.
#[derive(Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub video_format: String,
    pub auto_upload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectResponse {
    fn from_project(project: &Project) -> Self {
        Self {
            id: project.id.to_string(),
            title: project.title.clone(),
            status: project.status.to_string(),
            category: project.category.clone(),
            video_format: project.video_format.to_string(),
            auto_upload: project.auto_upload,
            error_message: project.error_message.clone(),
            youtube_video_id: project.youtube_video_id.clone(),
            youtube_url: project.youtube_url.clone(),
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct AssetResponse {
    pub id: String,
    pub asset_type: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_index: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl AssetResponse {
    fn from_asset(asset: &Asset, static_base: &str) -> Self {
        Self {
            id: asset.id.clone(),
            asset_type: asset.asset_type.to_string(),
            url: asset.public_url(static_base),
            scene_index: asset.scene_index,
            created_at: asset.created_at,
        }
    }
}

/// Full project state for polling clients.
#[derive(Serialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<reel_models::Script>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<CastList>,
    pub assets: Vec<AssetResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_metadata: Option<YouTubeMetadata>,
}

#[derive(Serialize)]
pub struct ProjectListResponse {
    pub items: Vec<ProjectResponse>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Create a new project and start its pipeline.
pub async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let project = state
        .orchestrator
        .create_project(NewProject {
            title: request.title,
            script_prompt: request.script_prompt,
            category: request.category,
            auto_upload: request.auto_upload,
            video_format: request.video_format,
            job_id: None,
        })
        .await?;

    state.orchestrator.start(project.id.clone());
    info!(project_id = %project.id, "Project created");

    Ok(Json(ProjectResponse::from_project(&project)))
}

/// List projects, newest first.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ProjectListResponse>> {
    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, 100);

    let (projects, total) = state.store.projects().list(page, page_size).await?;
    Ok(Json(ProjectListResponse {
        items: projects.iter().map(ProjectResponse::from_project).collect(),
        total,
        page,
        page_size,
    }))
}

/// Full current state of one project, safe to poll.
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ProjectDetailResponse>> {
    let id = ProjectId::from(project_id);
    let project = state.store.projects().get_required(&id).await?;

    let assets = project
        .assets
        .iter()
        .map(|a| AssetResponse::from_asset(a, &state.config.static_base))
        .collect();

    Ok(Json(ProjectDetailResponse {
        script: project.script.clone(),
        cast: project.cast.clone(),
        assets,
        youtube_metadata: project.youtube_metadata.clone(),
        project: ProjectResponse::from_project(&project),
    }))
}

/// Request cancellation; observed at the next stage boundary.
pub async fn cancel_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = ProjectId::from(project_id);
    state.orchestrator.cancel(&id).await?;
    Ok(Json(serde_json::json!({
        "message": "Cancellation requested",
        "project_id": id.to_string(),
    })))
}

/// Explicitly retry a failed project from the start.
pub async fn retry_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ProjectResponse>> {
    let id = ProjectId::from(project_id);
    let project = state.orchestrator.retry(&id).await?;
    Ok(Json(ProjectResponse::from_project(&project)))
}

/// Regenerate audio (and the downstream video) with the current cast.
pub async fn regenerate_audio(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = ProjectId::from(project_id);
    state.orchestrator.regenerate(&id, Regenerate::Audio).await?;
    Ok(Json(serde_json::json!({
        "message": "Audio regeneration started",
        "project_id": id.to_string(),
    })))
}

/// Recompose the video from existing audio and images.
pub async fn regenerate_video(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = ProjectId::from(project_id);
    state.orchestrator.regenerate(&id, Regenerate::Video).await?;
    Ok(Json(serde_json::json!({
        "message": "Video regeneration started",
        "project_id": id.to_string(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct CastUpdateRequest {
    pub cast: CastList,
}

/// Replace the cast on a settled project.
pub async fn update_cast(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(request): Json<CastUpdateRequest>,
) -> ApiResult<Json<ProjectDetailResponse>> {
    let id = ProjectId::from(project_id);
    if request.cast.is_empty() {
        return Err(ApiError::Validation("cast must not be empty".to_string()));
    }

    let project = state.orchestrator.update_cast(&id, request.cast).await?;
    let assets = project
        .assets
        .iter()
        .map(|a| AssetResponse::from_asset(a, &state.config.static_base))
        .collect();
    Ok(Json(ProjectDetailResponse {
        script: project.script.clone(),
        cast: project.cast.clone(),
        assets,
        youtube_metadata: project.youtube_metadata.clone(),
        project: ProjectResponse::from_project(&project),
    }))
}

/// Set the upload metadata used by the upload stage.
pub async fn update_youtube_metadata(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(metadata): Json<YouTubeMetadata>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = ProjectId::from(project_id);
    if metadata.title.is_empty() || metadata.title.len() > 100 {
        return Err(ApiError::Validation(
            "title must be 1-100 characters".to_string(),
        ));
    }

    state
        .orchestrator
        .update_youtube_metadata(&id, metadata)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Metadata saved",
        "project_id": id.to_string(),
    })))
}

#[derive(Serialize)]
pub struct VoiceListResponse {
    pub voices: Vec<String>,
}

/// Voices available for cast assignments.
pub async fn list_voices(State(state): State<AppState>) -> Json<VoiceListResponse> {
    Json(VoiceListResponse {
        voices: state.voice_pool.clone(),
    })
}
