//! Audio Sync Check - command line entry point
//!
//! Handles:
//! - Configuration loading (created with defaults on first run)
//! - Logging initialization
//! - The `analyze` and `probe` commands

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use asc_core::config::ConfigManager;
use asc_core::logging::init_tracing;
use asc_core::models::{AnalysisProfile, MediaSource, StreamSelector};
use asc_core::orchestrator::{SyncAnalyzer, SyncReport};

const CLI_AFTER_HELP: &str = "Examples:\n  asc analyze movie.mkv dub.mka\n  asc analyze movie.mkv:1 https://cdn.example/dub.mka --profile thorough --json\n  asc probe movie.mkv --video";

/// Exit status when the material needs a manual edit (cut detected).
const EXIT_MANUAL_EDIT: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "asc",
    version,
    about = "Measure the audio offset between two media sources",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Settings file (default: the user config dir, created on first run).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Measure offset, drift and delay of a comparison track against a reference.
    Analyze {
        /// Reference path or URL, optionally suffixed with `:<audio track>`.
        reference: String,

        /// Comparison path or URL, optionally suffixed with `:<audio track>`.
        comparison: String,

        /// Analysis profile (quick, thorough). Defaults to the configured one.
        #[arg(long)]
        profile: Option<AnalysisProfile>,

        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print stream metadata for one source.
    Probe {
        /// Path or URL, optionally suffixed with `:<audio track>`.
        source: String,

        /// Probe the video stream instead of the audio track.
        #[arg(long)]
        video: bool,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "asc")
        .map(|dirs| dirs.config_dir().join("asc.toml"))
        .unwrap_or_else(|| PathBuf::from(".config").join("asc.toml"))
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config_manager = ConfigManager::new(&config_path);

    if let Err(e) = config_manager.load_or_create() {
        eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
    }

    let mut level = config_manager.settings().logging.level;
    for _ in 0..cli.verbose {
        level = level.more_verbose();
    }
    let logs_dir = config_manager.logs_folder();
    let _log_guard = init_tracing(level, logs_dir.as_deref());

    tracing::debug!("Config: {}", config_path.display());
    tracing::debug!("Core version: {}", asc_core::version());

    if let Err(e) = config_manager.ensure_dirs_exist() {
        tracing::warn!("Failed to create directories: {}", e);
    }

    let settings = config_manager.settings();

    match cli.command {
        Commands::Analyze {
            reference,
            comparison,
            profile,
            json,
        } => {
            let profile = profile.unwrap_or(settings.analysis.profile);
            let analyzer = SyncAnalyzer::new(settings.analysis_config(profile));

            let (reference, reference_track) = MediaSource::parse_with_track(&reference);
            let (comparison, comparison_track) = MediaSource::parse_with_track(&comparison);

            let report = analyzer
                .analyze(
                    &reference,
                    StreamSelector::video_with_audio_track(reference_track),
                    &comparison,
                    StreamSelector::audio(comparison_track),
                )
                .await
                .with_context(|| format!("Analysis of {} failed", comparison))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&report);
            }

            if report.plan.requires_manual_edit() {
                return Ok(ExitCode::from(EXIT_MANUAL_EDIT));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Probe {
            source,
            video,
            json,
        } => {
            let analyzer =
                SyncAnalyzer::new(settings.analysis_config(settings.analysis.profile));

            let (source, track) = MediaSource::parse_with_track(&source);
            let selector = if video {
                StreamSelector::video_with_audio_track(track)
            } else {
                StreamSelector::audio(track)
            };

            let info = analyzer
                .probe(&source, selector)
                .await
                .with_context(|| format!("Probing {} [{}] failed", source, selector))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Source:   {}", source);
                println!("Stream:   {}", selector);
                println!("Codec:    {}", info.codec);
                println!("Duration: {:.3}s", info.duration_s);
                println!("FPS:      {}", info.fps_label());
                println!("Delay:    {}ms", info.internal_delay_ms);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_summary(report: &SyncReport) {
    let reference = &report.reference;
    let comparison = &report.comparison;

    println!(
        "Reference:  {} ({} fps, delay {}ms, {})",
        reference.source.display_name(),
        reference.info.fps_label(),
        reference.info.internal_delay_ms,
        reference.info.codec
    );
    println!(
        "Comparison: {} (track {}, {})",
        comparison.source.display_name(),
        comparison.audio_track,
        comparison.info.codec
    );
    println!();

    println!("{:<10} {:>10} {:>12}", "Checkpoint", "Position", "Offset");
    for estimate in &report.estimates {
        let offset = estimate
            .offset_ms
            .map(|ms| format!("{:+.1}ms", ms))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:>9.1}s {:>12}",
            estimate.checkpoint.as_str(),
            estimate.position_s,
            offset
        );
    }
    println!();

    let analysis = &report.analysis;
    let plan = &report.plan;
    println!(
        "Outcome:    {} (drift {:+.1}ms)",
        analysis.outcome, analysis.drift_ms
    );

    if plan.requires_manual_edit() {
        println!("Action:     manual edit required");
        return;
    }

    println!(
        "Delay:      {}ms (mkvmerge --sync {})",
        plan.final_delay_ms,
        plan.mkvmerge_sync_arg(0)
    );
    if let (Some(filter), Some(standard)) = (plan.ffmpeg_tempo_filter(), &plan.matched_standard) {
        println!("Tempo:      {} ({})", filter, standard);
    }
    println!("Time:       {:.1}s", report.processing_time_s);
}
