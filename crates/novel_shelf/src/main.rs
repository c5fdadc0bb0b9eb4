//! NovelShelf - novel chapter browser
//!
//! Command-line entry point.

mod app;
mod cli;

use anyhow::Result;
use clap::Parser;
use novel_core::{AppConfig, AppContext, AppError};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging and panic hook first
    let _log_guard = novel_log::init()?;

    // Clean up old logs (7 days)
    if let Err(e) = novel_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("NovelShelf starting...");

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    if config_path.is_dir() {
        return Err(AppError::Config(format!("{} is a directory", config_path.display())).into());
    }
    let config = AppConfig::load_from(&config_path);

    // Initialize application context
    let ctx = Arc::new(AppContext::new(config, Some(config_path)));
    novel_log::set_crash_library(ctx.restore_last_library().as_deref());

    app::run(ctx, cli.command)
}
