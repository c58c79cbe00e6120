//! Debate pipeline orchestration.
//!
//! Drives the two phases of a run: text generation over the stage dependency
//! graph, then audio synthesis in presentation order. The pipeline owns the
//! [`DebateContent`] during the text phase and treats it as read-only during
//! the audio phase.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::config::Config;
use crate::error::DebateError;
use crate::normalize::PeakNormalizer;
use crate::stage::{DebateContent, Stage, descriptor, generation_order, speech_order};
use crate::synthesis::SpeechSynthesizer;
use crate::generation::TextGenerator;

/// One generated speech on disk.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub stage: Stage,
    pub audio_path: PathBuf,
    pub transcript_path: Option<PathBuf>,
}

/// Orchestrates debate generation end to end.
pub struct StagePipeline {
    motion: String,
    config: Config,
    output_dir: PathBuf,
    generator: Box<dyn TextGenerator>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    normalizer: Option<PeakNormalizer>,
}

impl StagePipeline {
    /// Create a pipeline. The output directory is created here, idempotently,
    /// so no artifact write can race directory creation.
    pub fn new(
        motion: impl Into<String>,
        config: Config,
        output_dir: impl Into<PathBuf>,
        generator: Box<dyn TextGenerator>,
        synthesizer: Box<dyn SpeechSynthesizer>,
    ) -> Result<Self, DebateError> {
        let motion = motion.into();
        if motion.trim().is_empty() {
            return Err(DebateError::Configuration(
                "Debate motion must not be empty".to_string(),
            ));
        }

        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;

        Ok(Self {
            motion,
            config,
            output_dir,
            generator,
            synthesizer,
            normalizer: None,
        })
    }

    /// Enable the optional loudness-normalization post-step.
    pub fn with_normalizer(mut self, normalizer: PeakNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn motion(&self) -> &str {
        &self.motion
    }

    /// Generate all six speeches in dependency order.
    ///
    /// Aborts on the first failing stage; every later stage depends
    /// transitively on earlier ones, so partial content is useless.
    pub async fn generate_debate(&self) -> Result<DebateContent, DebateError> {
        let mut content = DebateContent::default();

        for stage in generation_order() {
            let mut context: Vec<(&'static str, &str)> = Vec::new();
            for dep in descriptor(stage).dependencies {
                let text = content.get(*dep).ok_or_else(|| DebateError::MissingContent {
                    stage: dep.key().to_string(),
                })?;
                context.push((dep.key(), text));
            }

            let template = self.config.prompts.get(stage.key()).ok_or_else(|| {
                DebateError::MissingPrompt {
                    stage: stage.key().to_string(),
                }
            })?;

            let prompt = format_prompt(template, &self.motion, &context).map_err(|key| {
                DebateError::PromptFormatting {
                    stage: stage.key().to_string(),
                    key,
                }
            })?;

            let text = self
                .generator
                .generate(&prompt)
                .await
                .map_err(|e| DebateError::Generation {
                    stage: stage.key().to_string(),
                    message: e.to_string(),
                })?;

            content.insert(stage, text);
        }

        Ok(content)
    }

    /// Synthesize audio for every speech, in presentation order.
    ///
    /// A failing entry aborts the run; artifacts already produced stay on
    /// disk.
    pub async fn generate_audio(
        &self,
        content: &DebateContent,
    ) -> Result<Vec<Artifact>, DebateError> {
        let mut artifacts = Vec::with_capacity(6);

        for entry in speech_order() {
            let stage = entry.stage;
            let text = content.get(stage).ok_or_else(|| DebateError::MissingContent {
                stage: stage.key().to_string(),
            })?;

            let filename = render_filename(
                &self.config.output.filename_pattern,
                entry.order,
                stage.side.as_str(),
                stage.phase.as_str(),
            );
            let output_path = self.output_dir.join(filename);

            // The side name doubles as the voice selector; all three speeches
            // of a side share one voice.
            let voice = self
                .config
                .audio
                .voices
                .get(stage.side.as_str())
                .ok_or_else(|| {
                    DebateError::Configuration(format!(
                        "No voice configured for '{}'",
                        stage.side.as_str()
                    ))
                })?;

            let audio_path = self
                .synthesizer
                .synthesize(text, &voice.voice_id, voice.speed, &output_path)
                .await
                .map_err(|e| DebateError::Synthesis {
                    stage: stage.key().to_string(),
                    message: e.to_string(),
                })?;

            let audio_path = match &self.normalizer {
                Some(normalizer) => normalizer.normalize(&audio_path),
                None => audio_path,
            };

            let transcript_path = if self.config.output.include_transcript {
                Some(self.write_transcript(&audio_path, stage, text)?)
            } else {
                None
            };

            artifacts.push(Artifact {
                stage,
                audio_path,
                transcript_path,
            });
        }

        Ok(artifacts)
    }

    fn write_transcript(
        &self,
        audio_path: &Path,
        stage: Stage,
        text: &str,
    ) -> Result<PathBuf, DebateError> {
        let path = audio_path.with_extension("txt");
        let contents = format!(
            "# {} - {}\n\nMotion: {}\n\n{}\n",
            stage.side.as_str().to_uppercase(),
            stage.phase.as_str().to_uppercase(),
            self.motion,
            text
        );
        fs::write(&path, contents)?;
        Ok(path)
    }
}

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("static regex"));

static ORDER_SPEC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{order(?::0(\d+)d)?\}").expect("static regex"));

/// Format a prompt template, substituting `{motion}` and every context entry
/// by stage key. A placeholder with no matching value is reported as an
/// `Err` carrying the offending key; it signals a template/dependency
/// mismatch, not a transient fault.
fn format_prompt(
    template: &str,
    motion: &str,
    context: &[(&'static str, &str)],
) -> Result<String, String> {
    for capture in PLACEHOLDER_RE.captures_iter(template) {
        let key = &capture[1];
        if key != "motion" && !context.iter().any(|(k, _)| *k == key) {
            return Err(key.to_string());
        }
    }

    let mut prompt = template.replace("{motion}", motion);
    for (key, value) in context {
        prompt = prompt.replace(&format!("{{{}}}", key), value);
    }

    Ok(prompt)
}

/// Render the configured filename pattern. `{order}` accepts an optional
/// zero-pad width in Python format-spec style, e.g. `{order:02d}`.
fn render_filename(pattern: &str, order: usize, side: &str, stage: &str) -> String {
    let rendered = ORDER_SPEC_RE.replace_all(pattern, |caps: &regex::Captures<'_>| {
        let width = caps
            .get(1)
            .and_then(|w| w.as_str().parse::<usize>().ok())
            .unwrap_or(0);
        format!("{:0width$}", order, width = width)
    });

    rendered.replace("{side}", side).replace("{stage}", stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AudioConfig, ModelConfig, OutputConfig, VoiceConfig};
    use crate::stage::{Phase, Side};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    /// Returns "<stage> text" per call, following generation order, and
    /// records every prompt it sees in a shared log.
    struct ScriptedGenerator {
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedGenerator {
        fn new() -> Self {
            Self {
                prompts: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
            Arc::clone(&self.prompts)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, DebateError> {
            let mut prompts = self.prompts.lock().unwrap();
            let stage = generation_order()[prompts.len()];
            prompts.push(prompt.to_string());
            Ok(format!("{} text", stage.key()))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, DebateError> {
            Err(DebateError::EmptyCompletion)
        }
    }

    /// Writes a 1-byte placeholder file per synthesized speech.
    struct PlaceholderSynthesizer;

    #[async_trait]
    impl SpeechSynthesizer for PlaceholderSynthesizer {
        async fn synthesize(
            &self,
            _text: &str,
            _voice_id: &str,
            _speed: f32,
            output_path: &Path,
        ) -> Result<PathBuf, DebateError> {
            fs::write(output_path, [0u8])?;
            Ok(output_path.to_path_buf())
        }
    }

    fn test_config() -> Config {
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
            "Open for the motion: {motion}".to_string(),
        );
        prompts.insert(
            "opposition_opening".to_string(),
            "Open against the motion: {motion}".to_string(),
        );
        prompts.insert(
            "proposition_rebuttal".to_string(),
            "Motion: {motion}\nRebut this: {opposition_opening}".to_string(),
        );
        prompts.insert(
            "opposition_rebuttal".to_string(),
            "Motion: {motion}\nRebut this: {proposition_opening}".to_string(),
        );
        prompts.insert(
            "proposition_closing".to_string(),
            "Motion: {motion}\n{proposition_opening}\n{opposition_opening}\n{proposition_rebuttal}\n{opposition_rebuttal}".to_string(),
        );
        prompts.insert(
            "opposition_closing".to_string(),
            "Motion: {motion}\n{proposition_opening}\n{opposition_opening}\n{proposition_rebuttal}\n{opposition_rebuttal}".to_string(),
        );

        Config {
            model: ModelConfig {
                model: "test-model".to_string(),
                temperature: 0.0,
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

    fn test_pipeline(config: Config, dir: &Path) -> StagePipeline {
        StagePipeline::new(
            "AI will do more good than harm",
            config,
            dir,
            Box::new(ScriptedGenerator::new()),
            Box::new(PlaceholderSynthesizer),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_motion_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = StagePipeline::new(
            "   ",
            test_config(),
            dir.path(),
            Box::new(ScriptedGenerator::new()),
            Box::new(PlaceholderSynthesizer),
        );
        assert!(matches!(result, Err(DebateError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_generate_debate_covers_all_stages() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(test_config(), dir.path());

        let content = pipeline.generate_debate().await.unwrap();
        assert_eq!(content.len(), 6);
        for stage in generation_order() {
            let text = content.get(stage).unwrap();
            assert!(!text.trim().is_empty());
            assert_eq!(text, format!("{} text", stage.key()));
        }
    }

    #[tokio::test]
    async fn test_prompt_context_contains_prior_speeches_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ScriptedGenerator::new();
        let log = generator.prompt_log();

        let pipeline = StagePipeline::new(
            "AI will do more good than harm",
            test_config(),
            dir.path(),
            Box::new(generator),
            Box::new(PlaceholderSynthesizer),
        )
        .unwrap();

        let content = pipeline.generate_debate().await.unwrap();
        let prompts = log.lock().unwrap().clone();
        let order = generation_order();
        assert_eq!(prompts.len(), 6);

        // Prompt for proposition_rebuttal (index 2 in generation order)
        // carries the opposition opening verbatim.
        assert_eq!(order[2].key(), "proposition_rebuttal");
        let opp_opening = content
            .get(Stage::new(Side::Opposition, Phase::Opening))
            .unwrap();
        assert!(prompts[2].contains(opp_opening));

        // The proposition closing (index 4) carries all four prior speeches.
        assert_eq!(order[4].key(), "proposition_closing");
        for prior in &order[..4] {
            assert!(prompts[4].contains(content.get(*prior).unwrap()));
        }
    }

    #[tokio::test]
    async fn test_missing_template_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.prompts.remove("opposition_closing");

        let pipeline = test_pipeline(config, dir.path());
        let err = pipeline.generate_debate().await.unwrap_err();
        assert!(
            matches!(err, DebateError::MissingPrompt { ref stage } if stage == "opposition_closing")
        );
    }

    #[tokio::test]
    async fn test_template_with_unknown_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.prompts.insert(
            "proposition_opening".to_string(),
            "Motion: {motion}, but also {opposition_rebuttal}".to_string(),
        );

        let pipeline = test_pipeline(config, dir.path());
        let err = pipeline.generate_debate().await.unwrap_err();
        assert!(matches!(
            err,
            DebateError::PromptFormatting { ref stage, ref key }
                if stage == "proposition_opening" && key == "opposition_rebuttal"
        ));
    }

    #[tokio::test]
    async fn test_generator_failure_wrapped_with_stage() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = StagePipeline::new(
            "AI will do more good than harm",
            test_config(),
            dir.path(),
            Box::new(FailingGenerator),
            Box::new(PlaceholderSynthesizer),
        )
        .unwrap();

        let err = pipeline.generate_debate().await.unwrap_err();
        assert!(
            matches!(err, DebateError::Generation { ref stage, .. } if stage == "proposition_opening")
        );
    }

    #[tokio::test]
    async fn test_generate_audio_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(test_config(), dir.path());

        let content = pipeline.generate_debate().await.unwrap();
        let artifacts = pipeline.generate_audio(&content).await.unwrap();

        assert_eq!(artifacts.len(), 6);
        let expected = [
            "01_proposition_opening.mp3",
            "02_opposition_opening.mp3",
            "03_proposition_rebuttal.mp3",
            "04_opposition_rebuttal.mp3",
            "05_proposition_closing.mp3",
            "06_opposition_closing.mp3",
        ];
        for (artifact, expected_name) in artifacts.iter().zip(expected) {
            assert_eq!(
                artifact.audio_path.file_name().unwrap().to_str().unwrap(),
                expected_name
            );
            assert_eq!(fs::read(&artifact.audio_path).unwrap(), vec![0u8]);
        }
    }

    #[tokio::test]
    async fn test_transcripts_written_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(test_config(), dir.path());

        let content = pipeline.generate_debate().await.unwrap();
        let artifacts = pipeline.generate_audio(&content).await.unwrap();

        let first = artifacts[0].transcript_path.as_ref().unwrap();
        let transcript = fs::read_to_string(first).unwrap();
        assert!(transcript.starts_with("# PROPOSITION - OPENING"));
        assert!(transcript.contains("Motion: AI will do more good than harm"));
        assert!(transcript.contains("proposition_opening text"));

        let last = artifacts[5].transcript_path.as_ref().unwrap();
        let transcript = fs::read_to_string(last).unwrap();
        assert!(transcript.starts_with("# OPPOSITION - CLOSING"));
    }

    #[tokio::test]
    async fn test_transcripts_skipped_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.output.include_transcript = false;

        let pipeline = test_pipeline(config, dir.path());
        let content = pipeline.generate_debate().await.unwrap();
        let artifacts = pipeline.generate_audio(&content).await.unwrap();

        assert!(artifacts.iter().all(|a| a.transcript_path.is_none()));
        let txt_files = fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref().unwrap().path().extension().and_then(|x| x.to_str()) == Some("txt")
            })
            .count();
        assert_eq!(txt_files, 0);
    }

    #[tokio::test]
    async fn test_missing_voice_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.audio.voices.remove("opposition");

        let pipeline = test_pipeline(config, dir.path());
        let content = pipeline.generate_debate().await.unwrap();
        let err = pipeline.generate_audio(&content).await.unwrap_err();

        assert!(matches!(err, DebateError::Configuration(_)));
        // Entry 1 (proposition opening) was produced before the failure;
        // the failing entry itself wrote nothing.
        assert!(dir.path().join("01_proposition_opening.mp3").exists());
        assert!(!dir.path().join("02_opposition_opening.mp3").exists());
    }

    #[tokio::test]
    async fn test_audio_phase_requires_complete_content() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = test_pipeline(test_config(), dir.path());

        let mut content = DebateContent::default();
        content.insert(
            Stage::new(Side::Proposition, Phase::Opening),
            "only one speech".to_string(),
        );

        let err = pipeline.generate_audio(&content).await.unwrap_err();
        assert!(
            matches!(err, DebateError::MissingContent { ref stage } if stage == "opposition_opening")
        );
    }

    #[test]
    fn test_format_prompt_substitutes_context() {
        let prompt = format_prompt(
            "Motion: {motion}\nAnswer: {opposition_opening}",
            "Cats beat dogs",
            &[("opposition_opening", "Dogs are loyal.")],
        )
        .unwrap();
        assert_eq!(prompt, "Motion: Cats beat dogs\nAnswer: Dogs are loyal.");
    }

    #[test]
    fn test_format_prompt_unknown_key() {
        let err = format_prompt("Motion: {motion} {mystery}", "m", &[]).unwrap_err();
        assert_eq!(err, "mystery");
    }

    #[test]
    fn test_render_filename_zero_padded() {
        assert_eq!(
            render_filename("{order:02d}_{side}_{stage}.mp3", 1, "proposition", "opening"),
            "01_proposition_opening.mp3"
        );
        assert_eq!(
            render_filename("{order:02d}_{side}_{stage}.mp3", 6, "opposition", "closing"),
            "06_opposition_closing.mp3"
        );
    }

    #[test]
    fn test_render_filename_plain_order() {
        assert_eq!(
            render_filename("{order}-{stage}.wav", 3, "proposition", "rebuttal"),
            "3-rebuttal.wav"
        );
    }

    #[test]
    fn test_render_filename_round_trip_sequence() {
        let pattern = "{order:02d}_{side}_{stage}.mp3";
        let decode = Regex::new(r"^(\d{2})_([a-z]+)_([a-z]+)\.mp3$").unwrap();

        for entry in speech_order() {
            let name = render_filename(
                pattern,
                entry.order,
                entry.stage.side.as_str(),
                entry.stage.phase.as_str(),
            );
            let caps = decode.captures(&name).unwrap();
            assert_eq!(caps[1].parse::<usize>().unwrap(), entry.order);
            assert_eq!(&caps[2], entry.stage.side.as_str());
            assert_eq!(&caps[3], entry.stage.phase.as_str());
        }
    }
}
