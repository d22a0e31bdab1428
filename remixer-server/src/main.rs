mod catalog;
mod routes;
mod state;

#[cfg(test)]
mod testing;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use remixer_core::RemixerConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::state::AppState;

/// Used when `RUST_LOG` is unset: every `remixer::*` target at info,
/// dependencies only when they warn
const DEFAULT_LOG_FILTER: &str = "warn,remixer=info";

#[derive(Debug, Parser)]
#[command(name = "remixer", version, about = "Rewrite song lyrics around a theme")]
struct Cli {
    /// Config file (defaults to the per-user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding `server.bind`
    #[arg(long, env = "REMIXER_BIND")]
    bind: Option<String>,

    /// Write a commented config template and exit
    #[arg(long)]
    write_config_template: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Check config for logging.file before full config load
    init_tracing(check_file_logging_enabled(cli.config.as_deref()));

    if cli.write_config_template {
        return write_config_template(cli.config.as_deref());
    }

    let mut config = RemixerConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
        config.validate().context("invalid --bind address")?;
    }
    let addr = config.bind_addr()?;

    let state = AppState::from_config(&config).context("failed to build services")?;
    let app = routes::router(state);

    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel_token.cancelled_owned())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

fn write_config_template(path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.map_or_else(RemixerConfig::config_path, Path::to_path_buf);
    if path.exists() {
        bail!("refusing to overwrite existing config at {}", path.display());
    }

    RemixerConfig::write_template(
        &path,
        &[remixer_lyrics::CONFIG_TEMPLATE, remixer_completion::CONFIG_TEMPLATE],
    )
    .with_context(|| format!("failed to write {}", path.display()))?;

    info!("Wrote config template to {}", path.display());
    Ok(())
}

/// Peek at `logging.file` without failing; the real load reports config errors.
fn check_file_logging_enabled(path: Option<&Path>) -> bool {
    let path = path.map_or_else(RemixerConfig::config_path, Path::to_path_buf);
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| RemixerConfig::from_toml(&content).ok())
        .is_some_and(|config| config.logging.file)
}

fn init_tracing(file_logging_enabled: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer();

    if file_logging_enabled {
        let log_path = remixer_core::log_file_path();

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

                info!("Writing logs to {}", log_path.display());
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
}
