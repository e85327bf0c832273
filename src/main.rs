//! manifest-sync CLI entry point
//!
//! Parses command-line arguments, executes the selected subcommand, and
//! renders failures as user-friendly errors. The exit status reflects only
//! unrecoverable setup failures; per-item skips inside a pass are reported
//! in the summaries instead.

use anyhow::Result;
use clap::Parser;
use manifest_sync::cli;
use manifest_sync::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
