//! prompt-llm binary entry point

use anyhow::Result;

mod cli;
mod run;
mod show;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            system,
            token_stats,
            query,
        } => {
            run::run(&config, system, token_stats, query).await?;
        }
        Commands::Show { config } => {
            show::run(&config)?;
        }
    }

    Ok(())
}
