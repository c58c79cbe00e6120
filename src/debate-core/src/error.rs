//! Error types for the debate pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebateError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No prompt template configured for stage '{stage}'")]
    MissingPrompt { stage: String },

    #[error("Prompt template for stage '{stage}' references unknown key '{key}'")]
    PromptFormatting { stage: String, key: String },

    #[error("Text generation failed for stage '{stage}': {message}")]
    Generation { stage: String, message: String },

    #[error("Speech synthesis failed for stage '{stage}': {message}")]
    Synthesis { stage: String, message: String },

    #[error("No generated text available for stage '{stage}'")]
    MissingContent { stage: String },

    #[error("Model returned empty content")]
    EmptyCompletion,

    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] async_openai::error::OpenAIError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
