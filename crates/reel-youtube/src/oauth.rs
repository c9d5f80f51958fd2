//! OAuth2 authorization-code flow and YouTube API client.
//!
//! Covers the connector surface: authorization URL, code exchange,
//! token refresh, revocation, and the resumable video upload. Token
//! payloads are stored as received; encryption at rest is out of scope.

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;
use url::Url;

use reel_models::YouTubeConnection;

use crate::error::{YouTubeError, YouTubeResult};

/// Scopes requested for upload access.
const SCOPES: &str =
    "https://www.googleapis.com/auth/youtube.upload https://www.googleapis.com/auth/youtube.readonly";

/// OAuth and API endpoint configuration.
///
/// The base URLs are overridable so tests can point the client at a mock
/// server.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_base: String,
    pub token_base: String,
    pub api_base: String,
    pub upload_base: String,
}

impl OAuthConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            client_id: std::env::var("YOUTUBE_CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("YOUTUBE_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: std::env::var("YOUTUBE_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:8000/api/youtube/callback".to_string()),
            auth_base: std::env::var("YOUTUBE_AUTH_BASE")
                .unwrap_or_else(|_| "https://accounts.google.com".to_string()),
            token_base: std::env::var("YOUTUBE_TOKEN_BASE")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com".to_string()),
            api_base: std::env::var("YOUTUBE_API_BASE")
                .unwrap_or_else(|_| "https://www.googleapis.com".to_string()),
            upload_base: std::env::var("YOUTUBE_UPLOAD_BASE")
                .unwrap_or_else(|_| "https://www.googleapis.com".to_string()),
        }
    }

    /// Check that the credentials needed for the flow are present.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

/// YouTube OAuth and upload client.
#[derive(Clone)]
pub struct YouTubeClient {
    config: OAuthConfig,
    http: Client,
}

impl YouTubeClient {
    /// Create a client with the given configuration.
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Build the redirect URL that starts the authorization-code flow.
    pub fn authorize_url(&self) -> YouTubeResult<String> {
        if !self.config.is_configured() {
            return Err(YouTubeError::config("YouTube OAuth credentials not set"));
        }

        let mut url = Url::parse(&format!("{}/o/oauth2/v2/auth", self.config.auth_base))
            .map_err(|e| YouTubeError::config(format!("Invalid auth base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPES)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        Ok(url.into())
    }

    /// Exchange an authorization code for tokens and resolve the bound
    /// channel. The returned connection is ready to persist.
    pub async fn exchange_code(&self, code: &str) -> YouTubeResult<YouTubeConnection> {
        let response = self
            .http
            .post(format!("{}/token", self.config.token_base))
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YouTubeError::token_exchange(body));
        }

        let token: TokenResponse = response.json().await?;
        let refresh_token = token.refresh_token.ok_or_else(|| {
            YouTubeError::token_exchange("No refresh token granted; re-consent is required")
        })?;

        let (channel_id, channel_title) = self.fetch_channel(&token.access_token).await?;

        info!(channel_id = %channel_id, "YouTube account connected");
        Ok(
            YouTubeConnection::new(channel_id, token.access_token, refresh_token, token.expires_in)
                .with_channel_title(channel_title),
        )
    }

    /// Refresh an expired access token, returning the updated connection.
    pub async fn refresh(&self, connection: YouTubeConnection) -> YouTubeResult<YouTubeConnection> {
        let response = self
            .http
            .post(format!("{}/token", self.config.token_base))
            .form(&[
                ("refresh_token", connection.refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YouTubeError::token_exchange(body));
        }

        let token: TokenResponse = response.json().await?;
        Ok(connection.with_refreshed_token(token.access_token, token.expires_in))
    }

    /// Revoke the refresh credential. A revocation the provider has
    /// already forgotten about is treated as success.
    pub async fn revoke(&self, connection: &YouTubeConnection) -> YouTubeResult<()> {
        let response = self
            .http
            .post(format!("{}/revoke", self.config.token_base))
            .form(&[("token", connection.refresh_token.as_str())])
            .send()
            .await?;

        if response.status().is_success() || response.status() == 400 {
            Ok(())
        } else {
            Err(YouTubeError::api(format!(
                "Revocation failed with {}",
                response.status()
            )))
        }
    }

    /// Upload a video through the resumable protocol and return its ID.
    pub async fn upload_video(
        &self,
        access_token: &str,
        metadata_body: &serde_json::Value,
        media: Vec<u8>,
    ) -> YouTubeResult<String> {
        let init = self
            .http
            .post(format!(
                "{}/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status",
                self.config.upload_base
            ))
            .bearer_auth(access_token)
            .json(metadata_body)
            .send()
            .await?;

        if !init.status().is_success() {
            let status = init.status();
            let body = init.text().await.unwrap_or_default();
            return Err(YouTubeError::api(format!(
                "Upload session rejected with {status}: {body}"
            )));
        }

        let session_url = init
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| YouTubeError::api("Upload session missing Location header"))?;

        let response = self
            .http
            .put(&session_url)
            .bearer_auth(access_token)
            .header(CONTENT_TYPE, "video/mp4")
            .body(media)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(YouTubeError::api(format!(
                "Upload failed with {status}: {body}"
            )));
        }

        let uploaded: UploadResponse = response.json().await?;
        info!(video_id = %uploaded.id, "Video uploaded to YouTube");
        Ok(uploaded.id)
    }

    /// Fetch the bytes of a composed video asset.
    pub async fn fetch_media(&self, url: &str) -> YouTubeResult<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(YouTubeError::api(format!(
                "Fetching media from {url} failed with {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_channel(&self, access_token: &str) -> YouTubeResult<(String, String)> {
        let response = self
            .http
            .get(format!(
                "{}/youtube/v3/channels?part=snippet&mine=true",
                self.config.api_base
            ))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(YouTubeError::api(format!(
                "Channel lookup failed with {}",
                response.status()
            )));
        }

        let channels: ChannelListResponse = response.json().await?;
        let channel = channels
            .items
            .into_iter()
            .next()
            .ok_or_else(|| YouTubeError::api("Account has no YouTube channel"))?;
        Ok((channel.id, channel.snippet.title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> OAuthConfig {
        OAuthConfig {
            client_id: "client".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost:8000/api/youtube/callback".into(),
            auth_base: server.uri(),
            token_base: server.uri(),
            api_base: server.uri(),
            upload_base: server.uri(),
        }
    }

    #[tokio::test]
    async fn test_authorize_url_contains_flow_parameters() {
        let server = MockServer::start().await;
        let client = YouTubeClient::new(test_config(&server));

        let url = client.authorize_url().unwrap();
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client"));
        assert!(url.contains("access_type=offline"));
    }

    #[tokio::test]
    async fn test_authorize_url_requires_credentials() {
        let server = MockServer::start().await;
        let mut config = test_config(&server);
        config.client_id.clear();
        let client = YouTubeClient::new(config);
        assert!(matches!(
            client.authorize_url(),
            Err(YouTubeError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_exchange_code_builds_connection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "refresh_token": "rt-1",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/youtube/v3/channels"))
            .and(header("authorization", "Bearer at-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"id": "UC123", "snippet": {"title": "My Channel"}}]
            })))
            .mount(&server)
            .await;

        let client = YouTubeClient::new(test_config(&server));
        let connection = client.exchange_code("auth-code").await.unwrap();
        assert_eq!(connection.channel_id, "UC123");
        assert_eq!(connection.channel_title.as_deref(), Some("My Channel"));
        assert_eq!(connection.refresh_token, "rt-1");
        assert!(!connection.is_token_expired());
    }

    #[tokio::test]
    async fn test_exchange_without_refresh_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let client = YouTubeClient::new(test_config(&server));
        let err = client.exchange_code("auth-code").await.unwrap_err();
        assert!(matches!(err, YouTubeError::TokenExchange(_)));
    }

    #[tokio::test]
    async fn test_refresh_updates_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-2",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let client = YouTubeClient::new(test_config(&server));
        let stale = YouTubeConnection::new("UC123", "at-1", "rt-1", -10);
        let refreshed = client.refresh(stale).await.unwrap();
        assert_eq!(refreshed.access_token, "at-2");
        assert_eq!(refreshed.refresh_token, "rt-1");
        assert!(!refreshed.is_token_expired());
    }

    #[tokio::test]
    async fn test_upload_video_resumable_flow() {
        let server = MockServer::start().await;
        let session_path = "/upload-session/abc";
        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("location", format!("{}{}", server.uri(), session_path)),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(session_path))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "vid-42"})),
            )
            .mount(&server)
            .await;

        let client = YouTubeClient::new(test_config(&server));
        let body = serde_json::json!({"snippet": {"title": "t"}});
        let id = client
            .upload_video("at-1", &body, vec![0u8; 16])
            .await
            .unwrap();
        assert_eq!(id, "vid-42");
    }

    #[tokio::test]
    async fn test_revoke_tolerates_already_revoked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/revoke"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let client = YouTubeClient::new(test_config(&server));
        let connection = YouTubeConnection::new("UC123", "at", "rt", 3600);
        client.revoke(&connection).await.unwrap();
    }
}
