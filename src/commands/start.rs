use anyhow::Result;
use colored::Colorize;
use log_service::{config, init_tracing, server};
use std::path::Path;
use tracing::info;

/// Execute the start command
///
/// Loads configuration, initializes tracing from it, then runs the server
/// until a shutdown signal arrives.
pub async fn execute(config_path: &Path) -> Result<()> {
    let cfg = config::load_config(config_path)?;

    init_tracing(&cfg.server.log_level, &cfg.server.log_format);
    println!("{}", "Starting log service...".green());
    info!(config = %config_path.display(), "Starting log service");

    server::start_server(cfg).await?;

    Ok(())
}
