mod app;
mod cli;
mod font;
mod render;
mod terminal;

use crate::app::Visualizer;
use crate::cli::Cli;
use crate::font::FontRegistry;
use crate::terminal::TerminalGuard;
use clap::Parser;
use lrcsync_core::{
    LrcsyncConfig, LyricMatcher, PositionTracker, Result, SyncEngine, TrackerSettings,
};
use lrcsync_playerctl::{PlayerPoller, PlayerctlSource};
use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "lrcsync-vis.log";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("lrcsync-vis: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    cli.validate()?;

    let mut config = LrcsyncConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config.visualizer);
    config.validate()?;
    let settings = config.visualizer;

    let mut fonts = FontRegistry::builtin();
    if let Some(path) = &cli.custom_fonts {
        fonts = fonts.with_custom_file(path)?;
    }
    let font = fonts.get(cli.font_name(&settings))?;
    info!("Rendering with font '{}'", font.name());

    let runtime = tokio::runtime::Runtime::new()?;

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    runtime.block_on(async {
        let source = Arc::new(PlayerctlSource::new(cli.player.clone()));
        let poller = Arc::new(PlayerPoller::from_config(
            source,
            &settings,
            Some(cancel_token.clone()),
        ));
        let observations = poller.subscribe();
        let poller_handle = Arc::clone(&poller).start();

        let engine = SyncEngine::new(
            PositionTracker::new(TrackerSettings::from(&settings)),
            LyricMatcher::new(&cli.lrc_dir, cli.format()),
        );
        let visualizer = Visualizer::new(engine, font, &settings);

        let result = async {
            let mut guard = TerminalGuard::enter()?;
            visualizer
                .run(observations, cancel_token.clone(), guard.writer())
                .await
        }
        .await;

        cancel_token.cancel();
        if let Err(e) = poller_handle.await {
            warn!("Player poller task failed: {}", e);
        }

        result.map_err(Into::into)
    })
}

/// Log to a file in the cache directory; the terminal belongs to the display.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_path = lrcsync_core::log_path(LOG_FILE_NAME);

    // Create cache directory if needed
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    match File::create(&log_path) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Arc::new(file))
                        .with_ansi(false),
                )
                .init();
        }
        Err(e) => {
            eprintln!("Failed to create log file at {}: {e}", log_path.display());
            tracing_subscriber::registry().with(env_filter).init();
        }
    }
}
