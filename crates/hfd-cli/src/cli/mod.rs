//! CLI for the HFD downloader.

mod commands;
mod indicator;


use anyhow::Result;
use clap::{Parser, Subcommand};
use hfd_core::config;
use std::path::PathBuf;

use commands::{run_checksum, run_fetch, run_supervised};

/// Top-level CLI for the HFD downloader.
#[derive(Debug, Parser)]
#[command(name = "hfd")]
#[command(about = "HFD: supervised single-file HTTP downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download the file once; exit when the attempt completes or cancels.
    Fetch {
        /// HTTP URL to download; defaults to the configured URL.
        url: Option<String>,

        /// Directory to save into; defaults to the configured download dir,
        /// then the current directory.
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Run the supervised loop: retry on stalls and periodically re-download,
    /// like the embedded deployment. Never exits on its own.
    Run {
        /// HTTP URL to download; defaults to the configured URL.
        url: Option<String>,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch { url, output_dir } => {
                if let Some(url) = url {
                    cfg.url = url;
                }
                let download_dir = match output_dir.or_else(|| cfg.download_dir.clone()) {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                run_fetch(&cfg, &download_dir)
            }
            CliCommand::Run { url } => {
                if let Some(url) = url {
                    cfg.url = url;
                }
                let download_dir = match cfg.download_dir.clone() {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                run_supervised(&cfg, &download_dir)
            }
            CliCommand::Checksum { path } => run_checksum(&path),
        }
    }
}
