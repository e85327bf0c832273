//! Type-safe SteamCMD command builder for consistent invocation
//!
//! This module provides a fluent API for building and executing SteamCMD
//! runs, ensuring consistent timeout handling, output capture, and error
//! mapping across the driver.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::STEAMCMD_RUN_TIMEOUT;
use crate::core::SyncError;

/// Builder for one SteamCMD invocation.
///
/// SteamCMD is driven entirely through `+directive` arguments; the builder
/// collects them, runs the script with a configurable timeout, and captures
/// stdout and stderr merged as lossy UTF-8 (the tool occasionally emits
/// invalid sequences mid-run, which must not abort capture).
///
/// # Examples
///
/// ```rust,ignore
/// let output = SteamCmdCommand::new("/opt/steamcmd/steamcmd.sh")
///     .args(["+login", "anonymous", "+app_info_print", "730", "+quit"])
///     .current_dir("/opt/steamcmd")
///     .with_context_label("app info 730")
///     .execute()
///     .await?;
/// if output.success {
///     parse(&output.merged);
/// }
/// ```
///
/// # Default Configuration
///
/// - **Timeout**: 10 minutes (cold app-info caches are slow)
/// - **Working directory**: inherited from the process
/// - **Exit status**: reported, never converted into an error — a failed run
///   means "no usable data", and that decision belongs to the caller
pub struct SteamCmdCommand {
    /// Path of the steamcmd.sh entry point
    exe: PathBuf,

    /// Directives passed to the tool (e.g. ["+login", "anonymous"])
    args: Vec<String>,

    /// Working directory for the run (SteamCMD expects its install root)
    current_dir: Option<PathBuf>,

    /// Maximum duration to wait for completion (None = no timeout)
    timeout_duration: Option<Duration>,

    /// Optional context string for log messages
    context: Option<String>,
}

impl SteamCmdCommand {
    /// Create a builder for the given SteamCMD entry point.
    pub fn new(exe: impl AsRef<Path>) -> Self {
        Self {
            exe: exe.as_ref().to_path_buf(),
            args: Vec::new(),
            current_dir: None,
            timeout_duration: Some(STEAMCMD_RUN_TIMEOUT),
            context: None,
        }
    }

    /// Set the working directory for the run.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add multiple directives.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a custom timeout for the run (None for no timeout).
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Set a context label included in log messages.
    ///
    /// Useful to distinguish the warm-up run from the real info run when
    /// reading debug logs.
    pub fn with_context_label(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Execute the run and capture its output.
    ///
    /// # Errors
    ///
    /// Fails only when the process cannot be spawned or exceeds the timeout.
    /// A non-zero exit is NOT an error; it is reported through
    /// [`SteamCmdOutput::success`].
    pub async fn execute(self) -> Result<SteamCmdOutput> {
        let start = std::time::Instant::now();
        let mut cmd = Command::new(&self.exe);
        cmd.args(&self.args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        if let Some(ref ctx) = self.context {
            tracing::debug!(
                target: "steamcmd",
                "({}) Executing: {} {}",
                ctx,
                self.exe.display(),
                self.args.join(" ")
            );
        } else {
            tracing::debug!(
                target: "steamcmd",
                "Executing: {} {}",
                self.exe.display(),
                self.args.join(" ")
            );
        }

        let output_future = cmd.output();

        let output = if let Some(duration) = self.timeout_duration {
            match timeout(duration, output_future).await {
                Ok(result) => result
                    .context(format!("Failed to execute {}", self.exe.display()))?,
                Err(_) => {
                    tracing::warn!(
                        target: "steamcmd",
                        "Run timed out after {} seconds",
                        duration.as_secs()
                    );
                    return Err(SyncError::SteamCmdCommandError {
                        reason: format!(
                            "run timed out after {} seconds; the tool may be stuck on a \
                             download or waiting for input",
                            duration.as_secs()
                        ),
                    }
                    .into());
                }
            }
        } else {
            output_future
                .await
                .context(format!("Failed to execute {}", self.exe.display()))?
        };

        // The parser consumes stdout and stderr as one combined text; invalid
        // UTF-8 sequences are replaced rather than raised.
        let mut merged = String::from_utf8_lossy(&output.stdout).into_owned();
        merged.push_str(&String::from_utf8_lossy(&output.stderr));

        let success = output.status.success();
        if !success {
            tracing::debug!(
                target: "steamcmd",
                "Run exited with status {:?}",
                output.status.code()
            );
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            if let Some(ref ctx) = self.context {
                tracing::debug!(target: "steamcmd::perf", "({}) Run took {:.2}s", ctx, elapsed.as_secs_f64());
            } else {
                tracing::debug!(target: "steamcmd::perf", "Run took {:.2}s", elapsed.as_secs_f64());
            }
        }

        Ok(SteamCmdOutput {
            success,
            merged,
        })
    }
}

/// Output from a SteamCMD run.
pub struct SteamCmdOutput {
    /// Whether the process exited successfully
    pub success: bool,
    /// Combined stdout and stderr as lossy UTF-8
    pub merged: String,
}
