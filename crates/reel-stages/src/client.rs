//! HTTP client for the generation service.
//!
//! Script, image, speech and composition requests all go to one configured
//! service; what happens behind those endpoints is opaque to this backend.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use reel_models::Scene;
use reel_pipeline::StageError;

/// Client for the external generation service.
#[derive(Clone)]
pub struct GenerationClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ScriptRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ScriptResponse {
    scenes: Vec<Scene>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    scene_index: u32,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    pitch: &'a str,
    rate: &'a str,
}

#[derive(Debug, Serialize)]
struct ComposeRequest<'a> {
    image_urls: &'a [String],
    audio_urls: &'a [String],
    width: u32,
    height: u32,
}

/// Responses carrying a single produced media location.
#[derive(Debug, Deserialize)]
struct MediaResponse {
    url: String,
}

impl GenerationClient {
    /// Create a client for the given service base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    /// Generate a script from a prompt.
    pub async fn generate_script(
        &self,
        prompt: &str,
        category: Option<&str>,
    ) -> Result<Vec<Scene>, StageError> {
        let response: ScriptResponse = self
            .post_json("/script", &ScriptRequest { prompt, category })
            .await?;
        Ok(response.scenes)
    }

    /// Generate one scene image; returns the asset location.
    pub async fn generate_image(
        &self,
        prompt: &str,
        scene_index: u32,
        width: u32,
        height: u32,
    ) -> Result<String, StageError> {
        let response: MediaResponse = self
            .post_json(
                "/image",
                &ImageRequest {
                    prompt,
                    scene_index,
                    width,
                    height,
                },
            )
            .await?;
        Ok(response.url)
    }

    /// Synthesize one line of speech; returns the asset location.
    pub async fn synthesize_speech(
        &self,
        text: &str,
        voice_id: &str,
        pitch: &str,
        rate: &str,
    ) -> Result<String, StageError> {
        let response: MediaResponse = self
            .post_json(
                "/tts",
                &SpeechRequest {
                    text,
                    voice_id,
                    pitch,
                    rate,
                },
            )
            .await?;
        Ok(response.url)
    }

    /// Compose the final video; returns the asset location.
    pub async fn compose_video(
        &self,
        image_urls: &[String],
        audio_urls: &[String],
        width: u32,
        height: u32,
    ) -> Result<String, StageError> {
        let response: MediaResponse = self
            .post_json(
                "/compose",
                &ComposeRequest {
                    image_urls,
                    audio_urls,
                    width,
                    height,
                },
            )
            .await?;
        Ok(response.url)
    }

    async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp, StageError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        debug!("Calling generation service: {}", url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| StageError::execution(format!("Generation service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StageError::execution(format!(
                "Generation service returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StageError::execution(format!("Invalid generation service response: {e}")))
    }
}
