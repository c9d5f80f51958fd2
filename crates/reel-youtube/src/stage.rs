//! YouTube upload stage.

use async_trait::async_trait;
use tracing::info;

use reel_models::{AssetType, Project, ProjectStatus, YouTubeMetadata};
use reel_pipeline::{Stage, StageError, StageOutput};
use reel_store::Store;

use crate::oauth::YouTubeClient;

/// Token refresh buffer so an upload never starts on a token about to
/// lapse mid-call.
const REFRESH_BUFFER_MINUTES: i64 = 5;

/// Uploads the composed video to the connected YouTube account.
///
/// A disconnected account is a typed `AuthRequired` failure: the project
/// fails visibly instead of silently skipping the upload. Safe to re-run;
/// a crash between upload and persistence re-uploads the same video (the
/// at-least-once contract every stage carries).
pub struct UploadStage {
    client: YouTubeClient,
    store: Store,
    /// Base for resolving relative asset locations into fetchable URLs
    media_base: String,
}

impl UploadStage {
    pub fn new(client: YouTubeClient, store: Store, media_base: impl Into<String>) -> Self {
        Self {
            client,
            store,
            media_base: media_base.into(),
        }
    }
}

#[async_trait]
impl Stage for UploadStage {
    fn status(&self) -> ProjectStatus {
        ProjectStatus::UploadingYoutube
    }

    async fn execute(&self, project: &Project) -> Result<StageOutput, StageError> {
        let connections = self.store.connections();
        let connection = connections
            .get()
            .await
            .map_err(|e| StageError::execution(format!("Connection lookup failed: {e}")))?
            .ok_or(StageError::AuthRequired)?;

        let connection = if connection.needs_refresh(REFRESH_BUFFER_MINUTES) {
            let refreshed = self
                .client
                .refresh(connection)
                .await
                .map_err(|e| StageError::execution(format!("Token refresh failed: {e}")))?;
            connections
                .set(&refreshed)
                .await
                .map_err(|e| StageError::execution(format!("Persisting token failed: {e}")))?;
            refreshed
        } else {
            connection
        };

        let video = project
            .assets_of_type(AssetType::Video)
            .into_iter()
            .next()
            .ok_or_else(|| StageError::execution("No composed video to upload"))?;

        let metadata = project
            .youtube_metadata
            .clone()
            .unwrap_or_else(|| YouTubeMetadata::for_title(&project.title));

        let media_url = video.public_url(&self.media_base);
        let media = self
            .client
            .fetch_media(&media_url)
            .await
            .map_err(|e| StageError::execution(format!("Fetching composed video failed: {e}")))?;

        let video_id = self
            .client
            .upload_video(&connection.access_token, &metadata.to_upload_body(), media)
            .await
            .map_err(|e| StageError::execution(format!("YouTube upload failed: {e}")))?;

        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        info!(project_id = %project.id, video_id = %video_id, "Project published");
        Ok(StageOutput::none().with_upload(video_id, watch_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::OAuthConfig;
    use reel_models::Asset;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn stage_with_server(server: &MockServer, store: Store) -> UploadStage {
        let config = OAuthConfig {
            client_id: "client".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost/cb".into(),
            auth_base: server.uri(),
            token_base: server.uri(),
            api_base: server.uri(),
            upload_base: server.uri(),
        };
        UploadStage::new(YouTubeClient::new(config), store, server.uri())
    }

    #[tokio::test]
    async fn test_disconnected_account_is_auth_required() {
        let server = MockServer::start().await;
        let store = Store::connect("sqlite::memory:").await.unwrap();
        let stage = stage_with_server(&server, store).await;

        let mut project = Project::new("t", "p").with_auto_upload(true);
        project.assets.push(Asset::new(AssetType::Video, "final.mp4"));

        let err = stage.execute(&project).await.unwrap_err();
        assert!(matches!(err, StageError::AuthRequired));
    }

    #[tokio::test]
    async fn test_upload_happy_path() {
        let server = MockServer::start().await;
        let store = Store::connect("sqlite::memory:").await.unwrap();

        let connection = reel_models::YouTubeConnection::new("UC1", "at", "rt", 3600);
        store.connections().set(&connection).await.unwrap();

        Mock::given(method("GET"))
            .and(path("/media/final.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 32]))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("location", format!("{}/session", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/session"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "vid-7"})),
            )
            .mount(&server)
            .await;

        let stage = stage_with_server(&server, store).await;
        let mut project = Project::new("My Short", "p").with_auto_upload(true);
        project
            .assets
            .push(Asset::new(AssetType::Video, "media/final.mp4"));

        let output = stage.execute(&project).await.unwrap();
        assert_eq!(output.youtube_video_id.as_deref(), Some("vid-7"));
        assert_eq!(
            output.youtube_url.as_deref(),
            Some("https://www.youtube.com/watch?v=vid-7")
        );
    }

    #[tokio::test]
    async fn test_missing_video_asset_fails() {
        let server = MockServer::start().await;
        let store = Store::connect("sqlite::memory:").await.unwrap();
        let connection = reel_models::YouTubeConnection::new("UC1", "at", "rt", 3600);
        store.connections().set(&connection).await.unwrap();

        let stage = stage_with_server(&server, store).await;
        let project = Project::new("t", "p").with_auto_upload(true);

        let err = stage.execute(&project).await.unwrap_err();
        assert!(err.to_string().contains("No composed video"));
    }
}
