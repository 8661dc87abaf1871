//! Slide recording pipeline binary.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use slideclip_media::FfmpegToolkit;
use slideclip_models::timestamp::format_seconds;
use slideclip_models::Manifest;
use slideclip_worker::{ManifestStore, Orchestrator, PipelineConfig, RunSummary};

#[derive(Parser, Debug)]
#[command(
    name = "slideclip",
    author,
    version,
    about = "Split slide recordings into image and audio clips with trimmed silence",
    long_about = None
)]
struct Cli {
    /// Output directory for images, audio, manifest and player page
    #[arg(long, global = true, env = "SLIDECLIP_OUTPUT_DIR")]
    out: Option<PathBuf>,
    /// Clips processed concurrently within a pass
    #[arg(long, global = true)]
    max_parallel: Option<usize>,
    /// JSON file overriding the trim policies
    #[arg(long, global = true, env = "SLIDECLIP_POLICY_FILE")]
    policy_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract, convert, clean up and write the player page
    Run {
        /// Source slide recording
        video: PathBuf,
    },
    /// Segment the source and extract an image and WAV per segment
    Extract {
        /// Source slide recording
        video: PathBuf,
    },
    /// Trim pass 1: convert extracted WAV clips to MP3
    Convert,
    /// Trim pass 2: remove remaining edge silence from MP3 clips
    Cleanup,
    /// Regenerate the player page from the manifest
    Player,
    /// Show the manifest
    Status,
    /// Print the manifest JSON Schema
    Schema,
}

impl Commands {
    fn needs_ffmpeg(&self) -> bool {
        matches!(
            self,
            Commands::Run { .. } | Commands::Extract { .. } | Commands::Convert | Commands::Cleanup
        )
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slideclip=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = PipelineConfig::from_env();
    if let Some(out) = &cli.out {
        config.output_dir = out.clone();
    }
    if let Some(max_parallel) = cli.max_parallel {
        config.max_parallel_clips = max_parallel;
    }
    if let Some(path) = &cli.policy_file {
        config = config.with_policy_file(path)?;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn print_status(manifest: &Manifest) {
    if manifest.is_empty() {
        println!("No clips yet.");
        return;
    }

    println!(
        "{:>7}  {:>10}  {:>10}  {:>8}  {:>8}  {:>8}  {:<18}  {}",
        "section", "start", "end", "original", "current", "trimmed", "stage", "audio"
    );
    for clip in manifest.iter() {
        println!(
            "{:>7}  {:>10}  {:>10}  {:>8.2}  {:>8.2}  {:>8.2}  {:<18}  {}{}",
            clip.section,
            format_seconds(clip.start_time),
            format_seconds(clip.end_time),
            clip.original_duration,
            clip.duration,
            clip.ledger.cumulative_total(),
            clip.stage.to_string(),
            clip.audio,
            clip.failure
                .as_deref()
                .map(|f| format!("  [failed: {}]", f))
                .unwrap_or_default()
        );
    }

    let original = manifest.total_original_duration();
    let current = manifest.total_current_duration();
    println!(
        "\n{} clips, {} of audio, {} after trimming ({:.1}s saved)",
        manifest.len(),
        format_seconds(original),
        format_seconds(current),
        (original - current).max(0.0)
    );
}

fn report(summary: &RunSummary) -> ExitCode {
    for step in &summary.steps {
        println!(
            "{:<10} processed {:>4}  skipped {:>4}  failed {:>4}  vetoed {:>4}  trimmed {:>8.2}s",
            step.name,
            step.processed,
            step.skipped,
            step.failed.len(),
            step.vetoed,
            step.seconds_trimmed
        );
    }
    println!(
        "{} clips: {:.2}s -> {:.2}s ({:.2}s saved)",
        summary.clips,
        summary.original_duration,
        summary.current_duration,
        summary.seconds_saved()
    );
    if let Some(player) = &summary.player {
        println!("Player: {}", player.display());
    }

    if summary.has_failures() {
        println!("Failed sections: {:?}", summary.failed_sections);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Commands::Schema = cli.command {
        let schema = schemars::schema_for!(Manifest);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;

    if let Commands::Status = cli.command {
        let manifest = ManifestStore::new(&config.output_dir).load().await?;
        print_status(&manifest);
        return Ok(ExitCode::SUCCESS);
    }

    let mut toolkit = FfmpegToolkit::new();
    if let Some(secs) = config.ffmpeg_timeout_secs {
        toolkit = toolkit.with_timeout(secs);
    }
    if cli.command.needs_ffmpeg() {
        toolkit.ensure_available()?;
    }

    let orchestrator = Orchestrator::new(toolkit, config);
    info!(
        run_id = %orchestrator.run_id(),
        output_dir = %orchestrator.config().output_dir.display(),
        "Starting slideclip"
    );

    let summary = match cli.command {
        Commands::Run { video } => orchestrator.run(&video).await?,
        Commands::Extract { video } => {
            let step = orchestrator.extract(&video).await?;
            orchestrator.summarize(vec![step], None).await?
        }
        Commands::Convert => {
            let step = orchestrator.convert().await?;
            orchestrator.summarize(vec![step], None).await?
        }
        Commands::Cleanup => {
            let step = orchestrator.cleanup().await?;
            orchestrator.summarize(vec![step], None).await?
        }
        Commands::Player => {
            let player = orchestrator.write_player().await?;
            orchestrator.summarize(vec![], Some(player)).await?
        }
        Commands::Status | Commands::Schema => return Ok(ExitCode::SUCCESS),
    };

    Ok(report(&summary))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
