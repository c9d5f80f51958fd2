//! Generated asset models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of generated asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Per-scene still image
    Image,
    /// Per-scene narration audio
    Audio,
    /// Composed final video
    Video,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Image => "image",
            AssetType::Audio => "audio",
            AssetType::Video => "video",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A generated media asset attached to a project.
///
/// `url` is either a relative identifier resolvable against the configured
/// static base, or an absolute URL which is passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Asset {
    /// Unique asset ID
    pub id: String,

    /// Asset kind
    pub asset_type: AssetType,

    /// Relative identifier or absolute URL
    pub url: String,

    /// Scene this asset belongs to (absent for the composed video)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_index: Option<u32>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Create a new asset.
    pub fn new(asset_type: AssetType, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            asset_type,
            url: url.into(),
            scene_index: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a scene index.
    pub fn for_scene(mut self, scene_index: u32) -> Self {
        self.scene_index = Some(scene_index);
        self
    }

    /// Resolve the public URL against a static base.
    ///
    /// Absolute URLs pass through unchanged.
    pub fn public_url(&self, static_base: &str) -> String {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            self.url.clone()
        } else {
            format!(
                "{}/{}",
                static_base.trim_end_matches('/'),
                self.url.trim_start_matches('/')
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_url_resolution() {
        let asset = Asset::new(AssetType::Image, "proj-1/images/0.png").for_scene(0);
        assert_eq!(
            asset.public_url("/static"),
            "/static/proj-1/images/0.png"
        );
        assert_eq!(asset.scene_index, Some(0));
    }

    #[test]
    fn test_absolute_url_passthrough() {
        let asset = Asset::new(AssetType::Video, "https://cdn.example.com/final.mp4");
        assert_eq!(
            asset.public_url("/static"),
            "https://cdn.example.com/final.mp4"
        );
    }

    #[test]
    fn test_base_slash_handling() {
        let asset = Asset::new(AssetType::Audio, "/a/0.mp3");
        assert_eq!(asset.public_url("/static/"), "/static/a/0.mp3");
    }
}
