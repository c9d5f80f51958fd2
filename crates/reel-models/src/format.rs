//! Output video formats.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output format for the composed video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoFormat {
    /// 9:16, shorts/reels
    #[default]
    Vertical,
    /// 16:9
    Landscape,
    /// 1:1
    Square,
}

impl VideoFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoFormat::Vertical => "vertical",
            VideoFormat::Landscape => "landscape",
            VideoFormat::Square => "square",
        }
    }

    /// Pixel dimensions used by the composition stage.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            VideoFormat::Vertical => (1080, 1920),
            VideoFormat::Landscape => (1920, 1080),
            VideoFormat::Square => (1080, 1080),
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_vertical() {
        assert_eq!(VideoFormat::default(), VideoFormat::Vertical);
        assert_eq!(VideoFormat::Vertical.dimensions(), (1080, 1920));
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&VideoFormat::Landscape).unwrap();
        assert_eq!(json, "\"landscape\"");
        let back: VideoFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(back, VideoFormat::Landscape);
    }
}
