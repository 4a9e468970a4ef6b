//! Command-line entry point for dialog-media-dl

use clap::Parser;
use dialog_media_dl::{Config, Extractor, RootResolver};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Download voice messages and pictures from an exported chat history
#[derive(Parser, Debug)]
#[command(name = "dialog-media-dl", version, about)]
struct Args {
    /// Directory holding the `messages` export (default: next to the executable)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum dialogs processed in parallel
    #[arg(long)]
    dialogs: Option<usize>,

    /// Maximum downloads in flight per dialog
    #[arg(long)]
    downloads: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> dialog_media_dl::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_toml_file(path)?,
            None => Config::default(),
        };
        if let Some(root) = self.root {
            config.root = RootResolver::Fixed(root);
        }
        if let Some(dialogs) = self.dialogs {
            config.max_concurrent_dialogs = dialogs;
        }
        if let Some(downloads) = self.downloads {
            config.max_concurrent_downloads = downloads;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = Some(timeout);
        }
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.into_config() {
        Ok(config) => match Extractor::new(config) {
            Ok(extractor) => extractor.run().await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => {
            info!(
                dialogs = report.dialogs_processed(),
                failed = report.dialogs_failed(),
                excluded = report.excluded.len(),
                files = report.files_written(),
                "Done."
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "extraction aborted");
            ExitCode::FAILURE
        }
    }
}
