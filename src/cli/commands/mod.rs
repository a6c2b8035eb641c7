//! CLI parser and dispatch to command-specific modules.

mod analyze;
mod anonymize;
mod check;
mod config_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::llm::LlmProvider;

#[derive(Parser)]
#[command(name = "pdf-analyzer")]
#[command(about = "Extract, anonymize and summarize documents with a language model")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

fn parse_provider(s: &str) -> Result<LlmProvider, String> {
    LlmProvider::from_str(s).ok_or_else(|| format!("unknown provider '{}' (openai, ollama)", s))
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a document: extract text, anonymize it and request a structured summary
    Analyze {
        /// PDF or plain-text file (left untouched; a staged copy is analyzed)
        file: PathBuf,
        /// Print the result as a JSON envelope
        #[arg(long)]
        json: bool,
        /// Backend override: openai or ollama
        #[arg(long, value_parser = parse_provider)]
        provider: Option<LlmProvider>,
        /// Model override
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Print the anonymized text of a document (no backend call)
    Anonymize {
        /// PDF or plain-text file
        file: PathBuf,
    },

    /// Check pdftotext and the configured backend
    Check,

    /// Show the effective configuration (API key masked)
    Config,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with_path(cli.config.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Analyze {
            file,
            json,
            provider,
            model,
        } => analyze::cmd_analyze(&config, &file, json, provider, model.as_deref()).await,
        Commands::Anonymize { file } => anonymize::cmd_anonymize(&config, &file).await,
        Commands::Check => check::cmd_check(&config).await,
        Commands::Config => config_cmd::cmd_config_show(&config),
    }
}
