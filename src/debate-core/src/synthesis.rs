//! Speech synthesis providers.
//!
//! Two interchangeable TTS backends behind [`SpeechSynthesizer`]. Which one
//! runs is a pure configuration switch; the pipeline never branches on it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::ApiCredentials;
use crate::error::DebateError;

const OPENAI_DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const OPENAI_SPEECH_MODEL: &str = "tts-1-hd";
const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io";
const ELEVENLABS_MODEL_ID: &str = "eleven_monolingual_v1";
const XI_API_KEY_HEADER: &str = "xi-api-key";

/// Renders text to an audio file on disk.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Write an audio file for `text` at `output_path` and return the path.
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        speed: f32,
        output_path: &Path,
    ) -> Result<PathBuf, DebateError>;
}

impl std::fmt::Debug for dyn SpeechSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SpeechSynthesizer")
    }
}

/// Select a TTS backend by name. Fails at construction, not on first use,
/// when the backend name is unknown or its credentials are missing.
pub fn create_synthesizer(
    provider: &str,
    credentials: &ApiCredentials,
) -> Result<Box<dyn SpeechSynthesizer>, DebateError> {
    match provider {
        "openai" => Ok(Box::new(OpenAiSynthesizer::new(credentials)?)),
        "elevenlabs" => Ok(Box::new(ElevenLabsSynthesizer::new(credentials)?)),
        other => Err(DebateError::Configuration(format!(
            "Unsupported TTS provider: '{}'. Available providers: openai, elevenlabs",
            other
        ))),
    }
}

fn build_http_client() -> Result<reqwest::Client, DebateError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .connect_timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| DebateError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// [`SpeechSynthesizer`] backed by the OpenAI speech endpoint.
pub struct OpenAiSynthesizer {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl OpenAiSynthesizer {
    pub fn new(credentials: &ApiCredentials) -> Result<Self, DebateError> {
        if credentials.api_key.is_empty() {
            return Err(DebateError::Configuration(
                "OpenAI API key is empty".to_string(),
            ));
        }

        Ok(Self {
            http: build_http_client()?,
            api_key: credentials.api_key.clone(),
            api_base: credentials
                .api_base
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_API_BASE.to_string()),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        speed: f32,
        output_path: &Path,
    ) -> Result<PathBuf, DebateError> {
        let body = serde_json::json!({
            "model": OPENAI_SPEECH_MODEL,
            "input": text,
            "voice": voice_id,
            "speed": speed,
        });

        let response = self
            .http
            .post(format!("{}/audio/speech", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let audio = response.bytes().await?;
        tokio::fs::write(output_path, &audio).await?;

        Ok(output_path.to_path_buf())
    }
}

/// [`SpeechSynthesizer`] backed by the ElevenLabs text-to-speech API.
pub struct ElevenLabsSynthesizer {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl ElevenLabsSynthesizer {
    pub fn new(credentials: &ApiCredentials) -> Result<Self, DebateError> {
        if credentials.api_key.is_empty() {
            return Err(DebateError::Configuration(
                "ElevenLabs API key is empty".to_string(),
            ));
        }

        Ok(Self {
            http: build_http_client()?,
            api_key: credentials.api_key.clone(),
            api_base: credentials
                .api_base
                .clone()
                .unwrap_or_else(|| ELEVENLABS_API_BASE.to_string()),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        _speed: f32,
        output_path: &Path,
    ) -> Result<PathBuf, DebateError> {
        // ElevenLabs has no speed parameter on this endpoint; pacing is a
        // property of the voice itself.
        let body = serde_json::json!({
            "text": text,
            "model_id": ELEVENLABS_MODEL_ID,
        });

        let response = self
            .http
            .post(format!(
                "{}/v1/text-to-speech/{}",
                self.api_base, voice_id
            ))
            .header(XI_API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let audio = response.bytes().await?;
        tokio::fs::write(output_path, &audio).await?;

        Ok(output_path.to_path_buf())
    }
}
