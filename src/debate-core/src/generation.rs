//! Text generation provider for debate speeches.
//!
//! Wraps a chat-completion model behind the [`TextGenerator`] trait so the
//! pipeline never sees which backend produced the text.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;

use crate::config::{ApiCredentials, ModelConfig};
use crate::error::DebateError;

/// Produces speech text from a fully-formatted prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// One prompt in, one speech out. No retries at this layer: a lost stage
    /// invalidates everything downstream, so failures surface immediately.
    async fn generate(&self, prompt: &str) -> Result<String, DebateError>;
}

/// [`TextGenerator`] backed by an OpenAI-compatible chat-completion API.
#[derive(Debug)]
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    /// Construct the generator, failing fast on missing credentials so setup
    /// problems surface before any generation work begins.
    pub fn new(credentials: &ApiCredentials, model: &ModelConfig) -> Result<Self, DebateError> {
        if credentials.api_key.is_empty() {
            return Err(DebateError::Configuration(
                "OpenAI API key is empty".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                DebateError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let mut openai_config = OpenAIConfig::new().with_api_key(&credentials.api_key);
        if let Some(api_base) = &credentials.api_base {
            openai_config = openai_config.with_api_base(api_base);
        }

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http_client),
            model: model.model.clone(),
            temperature: model.temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, DebateError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages(vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: prompt.to_string().into(),
                    name: None,
                },
            )])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(DebateError::EmptyCompletion);
        }

        Ok(content)
    }
}
