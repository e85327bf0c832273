//! Command-line interface for manifest-sync.
//!
//! Each subcommand is implemented in its own module with its own argument
//! struct and execution logic:
//!
//! - `generate` - run SteamCMD for a batch of app ids and write their
//!   `appmanifest_*.acf` files locally
//! - `sync` - push local manifest files into their numeric branches,
//!   creating/updating only what changed
//! - `publish` - republish each branch's `(sha, file listing)` to the
//!   indexing API, optionally mirroring bytes to the object store
//!
//! # Global Options
//!
//! All commands support:
//! - `--verbose` / `--quiet` - log verbosity (mutually exclusive)
//! - `--config` - explicit config file path
//! - `--no-progress` - disable progress bars for automation
//!
//! # Typical Pass
//!
//! ```bash
//! # 1. Regenerate manifests for two applications
//! msync generate 730 440
//!
//! # 2. Reconcile them into their branches
//! msync sync 730 440
//!
//! # 3. Republish the branch index
//! msync publish --mirror
//! ```
//!
//! The process exit status reflects only unrecoverable setup failures
//! (missing credentials, unreachable rate-limit endpoint, invalid app ids);
//! per-branch and per-app skips are reported in the summary and the log.

mod generate;
mod publish;
mod sync;

pub use generate::GenerateCommand;
pub use publish::PublishCommand;
pub use sync::SyncCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::GlobalConfig;

/// Runtime configuration derived from global CLI flags.
///
/// Separated from [`Cli`] so tests can inject configuration without parsing
/// arguments or touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log level filter applied when `RUST_LOG` is not set.
    ///
    /// `None` disables logging entirely (quiet mode).
    pub log_level: Option<String>,

    /// Disable progress bars and spinners.
    pub no_progress: bool,

    /// Explicit config file path, overriding discovery.
    pub config_path: Option<String>,
}

impl CliConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply this configuration to the process environment.
    ///
    /// Sets `MSYNC_NO_PROGRESS` and `MSYNC_CONFIG` so the components that
    /// read them (progress bars, config discovery) see the flags without
    /// threading them through every call. Call once, from the main thread,
    /// before any worker task starts.
    pub fn apply_to_env(&self) {
        if self.no_progress {
            // SAFETY: called once at startup before any thread is spawned
            unsafe { std::env::set_var("MSYNC_NO_PROGRESS", "1") };
        }

        if let Some(ref path) = self.config_path {
            unsafe { std::env::set_var(crate::config::CONFIG_PATH_ENV, path) };
        }
    }

    /// Initialize the tracing subscriber.
    ///
    /// `RUST_LOG` wins when set; otherwise the level derived from the
    /// verbosity flags applies. Safe to call more than once (subsequent
    /// calls are no-ops), which keeps tests independent.
    pub fn init_logging(&self) {
        let Some(level) = self.log_level.as_deref() else {
            return;
        };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Main CLI structure for manifest-sync.
#[derive(Parser)]
#[command(
    name = "msync",
    about = "Mirror Steam install manifests into a branch-per-app repository",
    version,
    long_about = "manifest-sync regenerates appmanifest_*.acf files from SteamCMD output, \
                  reconciles them into numerically named branches of a hosting repository, \
                  and republishes each branch's file index downstream."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (equivalent to RUST_LOG=debug).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors, for automation.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the config file (default: msync.toml discovery).
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Disable progress bars and spinners.
    #[arg(long, global = true)]
    no_progress: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Generate install manifests from SteamCMD app info
    Generate(GenerateCommand),
    /// Synchronize local manifests into their branches
    Sync(SyncCommand),
    /// Republish branch listings to the indexing API
    Publish(PublishCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Build a [`CliConfig`] from the parsed global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    /// Execute with an injected configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.apply_to_env();
        config.init_logging();

        let global = GlobalConfig::load()?;

        match self.command {
            Commands::Generate(cmd) => cmd.execute(&global).await,
            Commands::Sync(cmd) => cmd.execute(&global).await,
            Commands::Publish(cmd) => cmd.execute(&global).await,
        }
    }
}
