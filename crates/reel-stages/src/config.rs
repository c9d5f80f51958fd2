//! Stage configuration.

/// Default voice pool used when none is configured.
const DEFAULT_VOICES: [&str; 4] = [
    "en-US-JennyNeural",
    "en-US-GuyNeural",
    "en-GB-SoniaNeural",
    "en-GB-RyanNeural",
];

/// Configuration for the generation stages.
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Base URL of the generation service
    pub service_url: String,
    /// Voices the casting stage assigns from
    pub voice_pool: Vec<String>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8090".to_string(),
            voice_pool: DEFAULT_VOICES.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl StageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            service_url: std::env::var("STAGE_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8090".to_string()),
            voice_pool: std::env::var("VOICE_POOL")
                .map(|s| {
                    s.split(',')
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .collect()
                })
                .ok()
                .filter(|v: &Vec<String>| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_VOICES.iter().map(|v| v.to_string()).collect()),
        }
    }
}
