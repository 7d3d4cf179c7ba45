use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use log_service::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    match args.get_command() {
        cli::Commands::Start => {
            // tracing is initialized from the loaded configuration
            commands::start::execute(&args.config).await?;
        }
        cli::Commands::Test => {
            init_tracing("warn", "text");
            commands::test::execute(&args.config).await?;
        }
        cli::Commands::Config { action } => {
            init_tracing("warn", "text");
            match action {
                cli::ConfigCommands::Show => commands::config::show(&args.config)?,
                cli::ConfigCommands::Validate => commands::config::validate(&args.config)?,
            }
        }
        cli::Commands::Version => {
            println!("Log Service v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
