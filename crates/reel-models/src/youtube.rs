//! YouTube connection and upload metadata models.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility of an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyStatus {
    /// Visible to the owner only
    #[default]
    Private,
    /// Visible with the link
    Unlisted,
    /// Publicly listed
    Public,
}

impl PrivacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Private => "private",
            PrivacyStatus::Unlisted => "unlisted",
            PrivacyStatus::Public => "public",
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-account OAuth binding for YouTube uploads.
///
/// Tokens are stored opaque; encryption at rest is outside this core.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct YouTubeConnection {
    /// Channel ID the tokens are bound to
    pub channel_id: String,

    /// Channel display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,

    /// Short-lived bearer token
    pub access_token: String,

    /// Long-lived refresh credential
    pub refresh_token: String,

    /// Access token expiry
    pub token_expires_at: DateTime<Utc>,

    /// Connection timestamp
    pub connected_at: DateTime<Utc>,
}

impl YouTubeConnection {
    /// Create a connection from an OAuth token exchange.
    pub fn new(
        channel_id: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in_secs: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            channel_id: channel_id.into(),
            channel_title: None,
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_expires_at: now + Duration::seconds(expires_in_secs),
            connected_at: now,
        }
    }

    /// Set the channel title.
    pub fn with_channel_title(mut self, title: impl Into<String>) -> Self {
        self.channel_title = Some(title.into());
        self
    }

    /// Check if the access token has expired.
    pub fn is_token_expired(&self) -> bool {
        Utc::now() >= self.token_expires_at
    }

    /// Check if the token should be refreshed, with a safety buffer so an
    /// upload does not start with a token about to lapse mid-call.
    pub fn needs_refresh(&self, buffer_minutes: i64) -> bool {
        Utc::now() >= self.token_expires_at - Duration::minutes(buffer_minutes)
    }

    /// Store a refreshed access token.
    pub fn with_refreshed_token(
        mut self,
        access_token: impl Into<String>,
        expires_in_secs: i64,
    ) -> Self {
        self.access_token = access_token.into();
        self.token_expires_at = Utc::now() + Duration::seconds(expires_in_secs);
        self
    }
}

/// Upload configuration for a project's video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YouTubeMetadata {
    /// Video title (YouTube caps at 100 chars)
    pub title: String,

    /// Video description
    #[serde(default)]
    pub description: String,

    /// Tags attached to the video
    #[serde(default)]
    pub tags: Vec<String>,

    /// YouTube category; "22" is People & Blogs
    #[serde(default = "default_category_id")]
    pub category_id: String,

    /// Upload visibility
    #[serde(default)]
    pub privacy_status: PrivacyStatus,
}

fn default_category_id() -> String {
    "22".to_string()
}

impl YouTubeMetadata {
    /// Metadata with defaults for everything but the title.
    pub fn for_title(title: impl Into<String>) -> Self {
        let mut title = title.into();
        title.truncate(100);
        Self {
            title,
            description: String::new(),
            tags: Vec::new(),
            category_id: default_category_id(),
            privacy_status: PrivacyStatus::default(),
        }
    }

    /// Body for the YouTube `videos.insert` call.
    pub fn to_upload_body(&self) -> serde_json::Value {
        serde_json::json!({
            "snippet": {
                "title": self.title,
                "description": self.description,
                "tags": self.tags,
                "categoryId": self.category_id,
            },
            "status": {
                "privacyStatus": self.privacy_status.as_str(),
                "selfDeclaredMadeForKids": false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_refresh_buffer() {
        let conn = YouTubeConnection::new("UC123", "at", "rt", 600);
        assert!(!conn.is_token_expired());
        // 600s left, 5 minute buffer: fine
        assert!(!conn.needs_refresh(5));
        // 600s left, 15 minute buffer: refresh
        assert!(conn.needs_refresh(15));
    }

    #[test]
    fn test_refreshed_token() {
        let conn = YouTubeConnection::new("UC123", "old", "rt", -10);
        assert!(conn.is_token_expired());

        let refreshed = conn.with_refreshed_token("new", 3600);
        assert_eq!(refreshed.access_token, "new");
        assert!(!refreshed.is_token_expired());
        assert_eq!(refreshed.refresh_token, "rt");
    }

    #[test]
    fn test_metadata_defaults() {
        let meta = YouTubeMetadata::for_title("My Short");
        assert_eq!(meta.category_id, "22");
        assert_eq!(meta.privacy_status, PrivacyStatus::Private);

        let body = meta.to_upload_body();
        assert_eq!(body["snippet"]["title"], "My Short");
        assert_eq!(body["status"]["privacyStatus"], "private");
    }

    #[test]
    fn test_title_truncated_to_youtube_limit() {
        let meta = YouTubeMetadata::for_title("x".repeat(150));
        assert_eq!(meta.title.len(), 100);
    }
}
