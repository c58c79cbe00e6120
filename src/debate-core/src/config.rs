//! Configuration module for loading TOML config files.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::DebateError;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub audio: AudioConfig,
    pub output: OutputConfig,
    /// Prompt templates keyed by stage name. Each template accepts `{motion}`
    /// plus the stage's declared dependency keys.
    pub prompts: BTreeMap<String, String>,
}

/// Chat model settings for text generation.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// TTS backend selection and per-side voice settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// "openai" or "elevenlabs".
    pub provider: String,
    /// Keyed by side name; the side doubles as the voice selector.
    pub voices: BTreeMap<String, VoiceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    pub voice_id: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_speed() -> f32 {
    1.0
}

/// Output naming and transcript settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Pattern with `{order}`, `{side}`, `{stage}` placeholders. `{order}`
    /// accepts a zero-pad width, e.g. `{order:02d}`.
    pub filename_pattern: String,
    #[serde(default)]
    pub include_transcript: bool,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DebateError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DebateError::Configuration(format!("Failed to read config: {}", e)))?;
        Self::from_str(&content)
    }

    /// Load configuration from string content.
    pub fn from_str(content: &str) -> Result<Self, DebateError> {
        toml::from_str(content)
            .map_err(|e| DebateError::Configuration(format!("Failed to parse config: {}", e)))
    }
}

/// API credentials passed explicitly to provider constructors.
///
/// Kept out of [`Config`] so secrets never live next to checked-in settings,
/// and out of the process environment so provider construction is testable
/// in isolation.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    /// Override for the API base URL, if the backend supports one.
    pub api_base: Option<String>,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: None,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Read credentials from the environment (`OPENAI_API_KEY`, optionally
    /// `OPENAI_API_BASE`).
    pub fn from_env() -> Result<Self, DebateError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            DebateError::Configuration("OPENAI_API_KEY is not set".to_string())
        })?;
        let api_base = std::env::var("OPENAI_API_BASE")
            .or_else(|_| std::env::var("OPENAI_BASE_URL"))
            .ok();
        Ok(Self { api_key, api_base })
    }

    /// Read ElevenLabs credentials from the environment
    /// (`ELEVENLABS_API_KEY`, with `ELEVEN_API_KEY` as a fallback).
    ///
    /// No base-URL override: `OPENAI_API_BASE` points at a chat backend and
    /// must never redirect ElevenLabs traffic.
    pub fn elevenlabs_from_env() -> Result<Self, DebateError> {
        let api_key = std::env::var("ELEVENLABS_API_KEY")
            .or_else(|_| std::env::var("ELEVEN_API_KEY"))
            .map_err(|_| {
                DebateError::Configuration("ELEVENLABS_API_KEY is not set".to_string())
            })?;
        Ok(Self {
            api_key,
            api_base: None,
        })
    }

    /// Credentials for the selected TTS backend. The OpenAI backend shares
    /// the chat credentials; ElevenLabs carries its own key and never
    /// inherits the OpenAI base URL.
    pub fn for_tts_provider(
        provider: &str,
        openai: &ApiCredentials,
    ) -> Result<Self, DebateError> {
        match provider {
            "elevenlabs" => Self::elevenlabs_from_env(),
            _ => Ok(openai.clone()),
        }
    }

    /// Read credentials from a JSON secrets file. Accepts several key
    /// spellings so existing secrets files keep working.
    pub fn from_secrets_file<P: AsRef<Path>>(path: P) -> Result<Self, DebateError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            DebateError::Configuration(format!(
                "Failed to read secrets file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let secrets: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| DebateError::Configuration(format!("Failed to parse secrets: {}", e)))?;

        let api_key = ["OPENAI_API_KEY", "openai_api_key", "API_KEY", "api_key"]
            .iter()
            .find_map(|k| secrets.get(k).and_then(|v| v.as_str()))
            .map(str::to_string)
            .ok_or_else(|| {
                DebateError::Configuration("No API key found in secrets file".to_string())
            })?;

        let api_base = ["OPENAI_API_BASE", "openai_api_base"]
            .iter()
            .find_map(|k| secrets.get(k).and_then(|v| v.as_str()))
            .map(str::to_string);

        Ok(Self { api_key, api_base })
    }
}

/// Default configuration embedded in the binary.
pub fn default_config() -> Config {
    let mut voices = BTreeMap::new();
    voices.insert(
        "proposition".to_string(),
        VoiceConfig {
            voice_id: "onyx".to_string(),
            speed: 1.0,
        },
    );
    voices.insert(
        "opposition".to_string(),
        VoiceConfig {
            voice_id: "nova".to_string(),
            speed: 1.0,
        },
    );

    let mut prompts = BTreeMap::new();
    prompts.insert(
        "proposition_opening".to_string(),
        PROPOSITION_OPENING_PROMPT.to_string(),
    );
    prompts.insert(
        "opposition_opening".to_string(),
        OPPOSITION_OPENING_PROMPT.to_string(),
    );
    prompts.insert(
        "proposition_rebuttal".to_string(),
        PROPOSITION_REBUTTAL_PROMPT.to_string(),
    );
    prompts.insert(
        "opposition_rebuttal".to_string(),
        OPPOSITION_REBUTTAL_PROMPT.to_string(),
    );
    prompts.insert(
        "proposition_closing".to_string(),
        PROPOSITION_CLOSING_PROMPT.to_string(),
    );
    prompts.insert(
        "opposition_closing".to_string(),
        OPPOSITION_CLOSING_PROMPT.to_string(),
    );

    Config {
        model: ModelConfig {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
        },
        audio: AudioConfig {
            provider: "openai".to_string(),
            voices,
        },
        output: OutputConfig {
            filename_pattern: "{order:02d}_{side}_{stage}.mp3".to_string(),
            include_transcript: true,
        },
        prompts,
    }
}

const PROPOSITION_OPENING_PROMPT: &str = r#"You are the first speaker for the PROPOSITION in a formal Oxford-style debate.

MOTION: {motion}

Deliver your opening statement in favour of the motion. Define the terms of the
motion as you see them, lay out the proposition's two or three strongest
arguments, and preview the case your side will build. Speak directly to the
audience in a confident, measured register. Output only the spoken words of the
speech, with no stage directions and no formatting markup."#;

const OPPOSITION_OPENING_PROMPT: &str = r#"You are the first speaker for the OPPOSITION in a formal Oxford-style debate.

MOTION: {motion}

Deliver your opening statement against the motion. Challenge the framing the
proposition is likely to adopt, lay out the opposition's two or three strongest
arguments, and preview the case your side will build. Speak directly to the
audience in a confident, measured register. Output only the spoken words of the
speech, with no stage directions and no formatting markup."#;

const PROPOSITION_REBUTTAL_PROMPT: &str = r#"You are the rebuttal speaker for the PROPOSITION in a formal Oxford-style debate.

MOTION: {motion}

The opposition opened with the following statement:

{opposition_opening}

Deliver your rebuttal. Take the opposition's strongest points head on, expose
the weaknesses in their reasoning, and reinforce the proposition's case. Speak
directly to the audience. Output only the spoken words of the speech, with no
stage directions and no formatting markup."#;

const OPPOSITION_REBUTTAL_PROMPT: &str = r#"You are the rebuttal speaker for the OPPOSITION in a formal Oxford-style debate.

MOTION: {motion}

The proposition opened with the following statement:

{proposition_opening}

Deliver your rebuttal. Take the proposition's strongest points head on, expose
the weaknesses in their reasoning, and reinforce the opposition's case. Speak
directly to the audience. Output only the spoken words of the speech, with no
stage directions and no formatting markup."#;

const PROPOSITION_CLOSING_PROMPT: &str = r#"You are the closing speaker for the PROPOSITION in a formal Oxford-style debate.

MOTION: {motion}

The debate so far:

[Proposition opening]
{proposition_opening}

[Opposition opening]
{opposition_opening}

[Proposition rebuttal]
{proposition_rebuttal}

[Opposition rebuttal]
{opposition_rebuttal}

Deliver your closing statement. Weigh the clashes of the debate, explain why
the proposition has won each of them, and leave the audience with a clear
reason to vote for the motion. Output only the spoken words of the speech,
with no stage directions and no formatting markup."#;

const OPPOSITION_CLOSING_PROMPT: &str = r#"You are the closing speaker for the OPPOSITION in a formal Oxford-style debate.

MOTION: {motion}

The debate so far:

[Proposition opening]
{proposition_opening}

[Opposition opening]
{opposition_opening}

[Proposition rebuttal]
{proposition_rebuttal}

[Opposition rebuttal]
{opposition_rebuttal}

Deliver your closing statement. Weigh the clashes of the debate, explain why
the opposition has won each of them, and leave the audience with a clear
reason to vote against the motion. Output only the spoken words of the speech,
with no stage directions and no formatting markup."#;
