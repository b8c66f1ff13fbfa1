//! CLI definitions for prompt-llm

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prompt-llm")]
#[command(about = "Run prompt configs against a local Ollama server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the client for a prompt config and send one request
    Run {
        /// Prompt config file (.yaml, .yml, .toml or .json)
        #[arg(short, long)]
        config: PathBuf,

        /// System prompt (chat only)
        #[arg(long)]
        system: Option<String>,

        /// Show token usage statistics after response
        #[arg(long)]
        token_stats: bool,

        /// Query text (read from stdin when omitted)
        query: Vec<String>,
    },

    /// Show the client a prompt config resolves to, without sending anything
    Show {
        /// Prompt config file (.yaml, .yml, .toml or .json)
        #[arg(short, long)]
        config: PathBuf,
    },
}
