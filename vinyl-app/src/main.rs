mod app;
mod command;
mod view;

use crate::app::{AppContext, StartOptions};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vinyl_core::{CoreError, MAX_SLEEP_MINUTES, VinylConfig};
use vinyl_engine::ENGINE_CONFIG_TEMPLATE;

/// Local music player with synchronized lyrics
#[derive(Debug, Parser)]
#[command(name = "vinyl", version, about)]
struct Args {
    /// Library root laid out as Artist/Album/tracks (overrides the config)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Album directory, relative to the library root, to play once indexing finishes
    #[arg(short, long)]
    album: Option<PathBuf>,

    /// Pause playback after this many minutes (1-1440)
    #[arg(short, long, value_name = "MINUTES", value_parser = clap::value_parser!(u64).range(1..=MAX_SLEEP_MINUTES))]
    sleep: Option<u64>,
}

fn main() {
    let args = Args::parse();

    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let extra_templates: &[&str] = &[ENGINE_CONFIG_TEMPLATE];
    let config = match VinylConfig::load_or_create(extra_templates) {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!("Created config template at {}, continuing with defaults", path.display());
            VinylConfig::default()
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let options = StartOptions {
        library_root: args.root,
        album: args.album,
        sleep_minutes: args.sleep,
    };

    runtime.block_on(async {
        let mut app = match AppContext::new(&config, options, cancel_token) {
            Ok(app) => app,
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        };
        app.start();
        app.run().await;
        app.shutdown().await;
    });
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = std::fs::read_to_string(VinylConfig::config_path()) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,lofty=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = vinyl_core::paths::log_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    if file_logging_enabled {
        warn!("File logging requested but unavailable; logging to the console only");
    }
}
