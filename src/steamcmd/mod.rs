//! SteamCMD driver.
//!
//! Everything the synchronizer needs from the external tool lives here:
//! bootstrapping the installation, clearing its response cache, the warm-up
//! invocation, and the batched `app_info_print` run whose combined output
//! feeds [`crate::vdf::scan_tool_output`].
//!
//! # Collaborator contract
//!
//! The tool is a black box driven through a fixed argument template:
//!
//! ```text
//! @ShutdownOnFailedCommand 1 @NoPromptForPassword 1 +login anonymous <directives...> +quit
//! ```
//!
//! executed with the install root as working directory. The driver never
//! fails the pass because the tool misbehaved: a non-zero exit or unusable
//! output is reported as "no data" ([`SteamCmd::app_info`] returning `None`)
//! so sibling applications keep processing.
//!
//! # Known quirks handled here
//!
//! - A stale `appcache` directory makes the tool return outdated app info;
//!   it is removed before every batch run.
//! - The very first info query after an install reliably fails; a warm-up
//!   run updating the tiny sentinel app works around it.

mod command_builder;

pub use command_builder::{SteamCmdCommand, SteamCmdOutput};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::{STEAMCMD_DOWNLOAD_TIMEOUT, STEAMCMD_DOWNLOAD_URL, WARMUP_APP_ID};
use crate::core::SyncError;
use crate::manifest::is_numeric;

/// Driver for a local SteamCMD installation.
#[derive(Debug, Clone)]
pub struct SteamCmd {
    /// Directory holding the unpacked tool (`steamcmd.sh`, `appcache`, ...)
    install_root: PathBuf,
    /// Where the distribution tarball is fetched from
    download_url: String,
}

impl SteamCmd {
    /// Create a driver rooted at the given install directory.
    pub fn new(install_root: impl AsRef<Path>) -> Self {
        Self {
            install_root: install_root.as_ref().to_path_buf(),
            download_url: STEAMCMD_DOWNLOAD_URL.to_string(),
        }
    }

    /// Override the distribution URL (used by tests).
    #[must_use]
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = url.into();
        self
    }

    /// Path of the `steamcmd.sh` entry point.
    pub fn exe_path(&self) -> PathBuf {
        self.install_root.join("steamcmd.sh")
    }

    /// Download and unpack the tool if it is not already installed.
    pub async fn ensure_installed(&self) -> Result<()> {
        let exe = self.exe_path();
        if exe.exists() {
            debug!(target: "steamcmd", "installation found at {}", exe.display());
            return Ok(());
        }

        let downloads_dir = self.install_root.join("downloads");
        std::fs::create_dir_all(&downloads_dir)
            .with_context(|| format!("Failed to create {}", downloads_dir.display()))?;

        info!(target: "steamcmd", "downloading SteamCMD from {}", self.download_url);
        let client = reqwest::Client::builder().timeout(STEAMCMD_DOWNLOAD_TIMEOUT).build()?;
        let response = client
            .get(&self.download_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| SyncError::SteamCmdNotFound {
                path: format!("{} ({err})", exe.display()),
            })?;
        let bytes = response.bytes().await.context("Failed to read SteamCMD download")?;

        let tarball_name = self
            .download_url
            .rsplit('/')
            .next()
            .unwrap_or("steamcmd_linux.tar.gz");
        let tarball_path = downloads_dir.join(tarball_name);
        std::fs::write(&tarball_path, &bytes)
            .with_context(|| format!("Failed to write {}", tarball_path.display()))?;

        info!(target: "steamcmd", "unpacking {} into {}", tarball_path.display(), self.install_root.display());
        let file = std::fs::File::open(&tarball_path)?;
        let decoder = flate2::read::GzDecoder::new(file);
        let mut archive = tar::Archive::new(decoder);
        archive
            .unpack(&self.install_root)
            .with_context(|| format!("Failed to unpack {}", tarball_path.display()))?;

        if !exe.exists() {
            return Err(SyncError::SteamCmdNotFound {
                path: exe.display().to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Remove the tool's response cache so a run cannot serve stale data.
    pub fn clear_cache(&self) -> Result<()> {
        let app_cache = self.install_root.join("appcache");
        if app_cache.exists() {
            debug!(target: "steamcmd", "removing {}", app_cache.display());
            std::fs::remove_dir_all(&app_cache)
                .with_context(|| format!("Failed to remove {}", app_cache.display()))?;
        }
        Ok(())
    }

    /// Wrap raw directives in the fixed login template.
    fn login_command<I, S>(directives: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args: Vec<String> = vec![
            "@ShutdownOnFailedCommand".into(),
            "1".into(),
            "@NoPromptForPassword".into(),
            "1".into(),
            "+login".into(),
            "anonymous".into(),
        ];
        args.extend(directives.into_iter().map(Into::into));
        args.push("+quit".into());
        args
    }

    /// Run one templated invocation from the install root.
    async fn exec_raw<I, S>(&self, directives: I, label: &str) -> Result<SteamCmdOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SteamCmdCommand::new(self.exe_path())
            .args(Self::login_command(directives))
            .current_dir(&self.install_root)
            .with_context_label(label)
            .execute()
            .await
    }

    /// Fetch combined `app_info_print` output for a batch of applications.
    ///
    /// Returns `Ok(None)` when the tool produced no usable data (empty batch,
    /// non-zero exit); the caller decides how to log that. Non-numeric app
    /// ids are rejected before any download or invocation is attempted.
    pub async fn app_info(&self, app_ids: &[String]) -> Result<Option<String>> {
        if app_ids.is_empty() {
            warn!(target: "steamcmd", "no app ids requested");
            return Ok(None);
        }

        let mut info_directives = Vec::with_capacity(app_ids.len() * 2);
        for app_id in app_ids {
            if !is_numeric(app_id) {
                return Err(SyncError::InvalidAppId {
                    app_id: app_id.clone(),
                }
                .into());
            }
            info_directives.push("+app_info_print".to_string());
            info_directives.push(app_id.clone());
        }

        self.ensure_installed().await?;
        self.clear_cache()?;

        // Warm-up: the first query after an install reliably fails, so update
        // the sentinel app once and ignore how it went.
        debug!(target: "steamcmd", "running warm-up for app {WARMUP_APP_ID}");
        let mut warmup = info_directives.clone();
        warmup.extend([
            "+force_install_dir".to_string(),
            format!("./{WARMUP_APP_ID}"),
            "+app_update".to_string(),
            WARMUP_APP_ID.to_string(),
        ]);
        if let Err(err) = self.exec_raw(warmup, "warm-up").await {
            warn!(target: "steamcmd", "warm-up run failed: {err:#}");
        }

        info!(target: "steamcmd", "fetching app info for {}", app_ids.join(", "));
        let mut run = vec!["+app_info_update".to_string(), "1".to_string()];
        run.extend(info_directives);
        let output = self.exec_raw(run, "app info").await?;

        if !output.success {
            warn!(target: "steamcmd", "info run exited unsuccessfully; treating as no data");
            return Ok(None);
        }
        Ok(Some(output.merged))
    }
}
