//! CLI tool for ViT classifier validation, summarization, and inference.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "vit")]
#[command(author, version, about = "ViT classifier CLI for validation, summarization, and inference")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a ViT configuration file
    Validate {
        /// Path to the YAML configuration file
        config: PathBuf,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Summarize a ViT classifier from its configuration
    Summarize {
        /// Path to the YAML configuration file
        config: PathBuf,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Run randomly initialized inference on CPU with an identity backbone
    Infer {
        /// Path to the YAML configuration file
        #[arg(long)]
        config: PathBuf,

        /// Number of images per batch
        #[arg(long, default_value = "1")]
        batch: usize,

        /// Override the configured pooling mode (cls or mean)
        #[arg(long)]
        pool: Option<String>,

        /// Number of warmup iterations
        #[arg(long, default_value = "3")]
        warmup: usize,

        /// Number of timed iterations
        #[arg(long, default_value = "10")]
        iterations: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate { config, format } => {
            commands::validate::run(&config, &format)
        }
        Commands::Summarize { config, format } => {
            commands::summarize::run(&config, &format)
        }
        Commands::Infer {
            config,
            batch,
            pool,
            warmup,
            iterations,
        } => commands::infer::run(&config, batch, pool.as_deref(), warmup, iterations),
    }
}
