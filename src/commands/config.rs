use anyhow::Result;
use colored::Colorize;
use log_service::config::{self, Config};
use std::path::Path;
use tracing::info;

/// Execute the config show command
///
/// Displays the effective configuration (file + environment + defaults)
pub fn show(config_path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!("Loading configuration for display");

    let cfg = config::load_config(config_path)?;

    println!("{}", "Current Configuration:".green().bold());
    println!();
    println!("{}", render(&cfg)?);

    Ok(())
}

/// Execute the config validate command
pub fn validate(config_path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());

    if !config_path.exists() {
        println!(
            "{}",
            format!(
                "! {} not found, using defaults and environment",
                config_path.display()
            )
            .yellow()
        );
    }

    let cfg = config::load_config(config_path)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  Listen: {}:{}", cfg.server.host, cfg.server.port);
    println!("  Storage: {:?}", cfg.database.backend);
    println!("  Ingestion: {}", cfg.ingestion.enabled);

    info!("Configuration validation successful");
    Ok(())
}

fn render(cfg: &Config) -> Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}
