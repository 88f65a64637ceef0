//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod extract;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::helpers::load_config;

#[derive(Parser)]
#[command(name = "tokiscan")]
#[command(about = "Extract the registry office and inheritance transfer addresses from registry PDFs")]
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

#[derive(Subcommand)]
enum Commands {
    /// Extract the registry office name and transfer addresses from a PDF
    Extract {
        /// Scanned registry PDF
        pdf: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the OCR text of a PDF without querying the LLM
    Ocr {
        /// Scanned registry PDF
        pdf: PathBuf,
    },

    /// Check rasterizer, OCR backend and LLM availability
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Extract { pdf, json } => extract::cmd_extract(&config, &pdf, json).await,
        Commands::Ocr { pdf } => extract::cmd_ocr(&config, &pdf).await,
        Commands::Check => check::cmd_check(&config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract_with_global_flags() {
        let cli = Cli::parse_from([
            "tokiscan",
            "extract",
            "ledger.pdf",
            "--json",
            "-v",
            "--config",
            "~/tokiscan.toml",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("~/tokiscan.toml")));
        assert!(matches!(
            cli.command,
            Commands::Extract { ref pdf, json: true } if pdf == &PathBuf::from("ledger.pdf")
        ));
    }
}
