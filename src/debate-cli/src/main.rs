//! Oxford Debate CLI
//!
//! Command-line front end for generating an Oxford-style debate with audio
//! output. All pipeline logic lives in oxford-debate-core; this binary only
//! parses arguments, loads configuration, and prints results.

use clap::Parser;
use colored::Colorize;
use oxford_debate_core::{
    ApiCredentials, OpenAiGenerator, PeakNormalizer, StagePipeline, create_synthesizer,
    default_config, Config,
};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "oxford-debate",
    version,
    about = "Generate a scripted Oxford-style debate with audio output",
    long_about = "Generates a six-speech Oxford-style debate (opening, rebuttal, and closing \
                  for each side) with a chat model, then renders every speech to audio."
)]
struct Cli {
    /// The debate motion (falls back to DEFAULT_MOTION from the environment)
    #[arg(short, long, value_name = "MOTION")]
    motion: Option<String>,

    /// Output directory for audio files
    #[arg(short, long, default_value = "output", value_name = "DIR")]
    output: PathBuf,

    /// Path to a TOML configuration file (embedded defaults if omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to a JSON secrets file (environment variables if omitted)
    #[arg(long, value_name = "FILE")]
    secrets: Option<PathBuf>,

    /// Print example debate motions and exit
    #[arg(long)]
    list_motions: bool,
}

const EXAMPLE_MOTIONS: [&str; 8] = [
    "This house believes that artificial intelligence will do more good than harm",
    "This house believes that social media does more harm than good",
    "This house would ban autonomous weapons systems",
    "This house believes that privacy is dead in the digital age",
    "This house would prioritize economic growth over environmental protection",
    "This house believes that universal basic income is necessary",
    "This house would ban genetic engineering of humans",
    "This house believes that space exploration is a waste of resources",
];

const DEFAULT_MOTION: &str =
    "This house believes that artificial intelligence will do more good than harm";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.list_motions {
        println!("\n{}\n", "Example debate motions:".cyan().bold());
        for (i, motion) in EXAMPLE_MOTIONS.iter().enumerate() {
            println!("  {}. {}", i + 1, motion);
        }
        println!();
        return Ok(());
    }

    let motion = cli
        .motion
        .or_else(|| env::var("DEFAULT_MOTION").ok())
        .unwrap_or_else(|| DEFAULT_MOTION.to_string());

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => default_config(),
    };

    let credentials = match &cli.secrets {
        Some(path) => ApiCredentials::from_secrets_file(path)?,
        None => ApiCredentials::from_env()?,
    };

    println!("\n{}\n", "Oxford Debate Generator".cyan().bold());
    println!("{} {}\n", "Motion:".yellow(), motion);

    let generator = OpenAiGenerator::new(&credentials, &config.model)?;
    let tts_credentials = ApiCredentials::for_tts_provider(&config.audio.provider, &credentials)?;
    let synthesizer = create_synthesizer(&config.audio.provider, &tts_credentials)?;

    let pipeline = StagePipeline::new(
        motion,
        config,
        cli.output.clone(),
        Box::new(generator),
        synthesizer,
    )?
    .with_normalizer(PeakNormalizer::default());

    println!("{}", "Generating debate content...".cyan());
    let content = pipeline.generate_debate().await?;
    println!("{}", "Debate content generated.".green());

    println!("{}", "Generating audio files...".cyan());
    let artifacts = pipeline.generate_audio(&content).await?;
    println!("{}\n", "Audio files generated.".green());

    println!("{}", "Generated files:".yellow());
    for (i, artifact) in artifacts.iter().enumerate() {
        println!("  {}. {}", i + 1, artifact.audio_path.display());
    }
    println!("\nOutput directory: {}\n", cli.output.display());

    Ok(())
}
