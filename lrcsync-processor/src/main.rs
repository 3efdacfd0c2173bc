mod cli;

use crate::cli::Cli;
use clap::Parser;
use lrcsync_analysis::{AubioOnsetDetector, FfprobeProbe};
use lrcsync_core::{
    discover_jobs, BatchReport, LrcFormat, LrcsyncConfig, Processor, Result, WordTimingMode,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(report) => {
            print_report(&report);
            if report.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<BatchReport> {
    cli.validate()?;

    let mut config = LrcsyncConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config.processor);
    config.validate()?;

    let format = cli.format();
    let settings = config.processor;
    let tool_timeout = settings.tool_timeout();
    let wants_onsets = format == LrcFormat::Word && settings.word_timing == WordTimingMode::Onset;
    let jobs = discover_jobs(
        &cli.lrc_dir,
        &cli.output_dir,
        format,
        settings.preserve_structure,
    )?;

    let mut processor = Processor::new(settings, format).with_audio_dir(cli.audio_dir);

    if wants_onsets {
        match AubioOnsetDetector::locate(tool_timeout) {
            Some(detector) => {
                info!("Using aubio onset detection");
                processor = processor.with_onset_detector(Arc::new(detector));
            }
            None => warn!("aubioonset not found on PATH, falling back to even word timing"),
        }
    }

    match FfprobeProbe::locate(tool_timeout) {
        Some(probe) => processor = processor.with_audio_probe(Arc::new(probe)),
        None => info!("ffprobe not found on PATH, last lines end by tag or estimate"),
    }

    if jobs.is_empty() {
        warn!("No .lrc files found in {}", cli.lrc_dir.display());
    }

    Ok(Arc::new(processor).run_batch(jobs).await)
}

fn print_report(report: &BatchReport) {
    println!(
        "Processed {} of {} files ({} skipped, {} failed)",
        report.processed,
        report.total(),
        report.skipped,
        report.failed.len()
    );
    for (path, reason) in &report.failed {
        println!("  failed: {}: {}", path.display(), reason);
    }
}

fn init_tracing(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
