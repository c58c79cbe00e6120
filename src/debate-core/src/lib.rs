//! Oxford Debate Core Library
//!
//! Generates a scripted six-speech Oxford-style debate with a chat model and
//! renders each speech to audio through a pluggable TTS backend.

pub mod config;
pub mod error;
pub mod generation;
pub mod normalize;
pub mod pipeline;
pub mod stage;
pub mod synthesis;

pub use config::{
    ApiCredentials, AudioConfig, Config, ModelConfig, OutputConfig, VoiceConfig, default_config,
};
pub use error::DebateError;
pub use generation::{OpenAiGenerator, TextGenerator};
pub use normalize::PeakNormalizer;
pub use pipeline::{Artifact, StagePipeline};
pub use stage::{DebateContent, Phase, Side, SpeechOrderEntry, Stage};
pub use synthesis::{
    ElevenLabsSynthesizer, OpenAiSynthesizer, SpeechSynthesizer, create_synthesizer,
};
