//! Generate install manifests from SteamCMD app info.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::{error, info, warn};

use crate::config::GlobalConfig;
use crate::core::SyncError;
use crate::manifest::{AppRecord, ManifestGenerator, manifest_path, parse_app_id};
use crate::steamcmd::SteamCmd;
use crate::vdf::{self, ParseOutcome};

/// Command to fetch app info for a batch of applications and write their
/// manifest files under the configured manifest root.
///
/// The batch is all-or-nothing at the tool/parse level: if SteamCMD exits
/// unsuccessfully or its output fails to parse, the whole batch is reported
/// unresolved for this pass (logged, not retried). Per-application
/// generation failures inside a parsed batch do not stop sibling
/// applications.
#[derive(Args)]
pub struct GenerateCommand {
    /// Application ids to fetch (numeric, e.g. 730)
    #[arg(required = true, value_name = "APP_ID")]
    apps: Vec<String>,
}

impl GenerateCommand {
    /// Execute the generate command.
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        // Reject malformed ids before any download or tool invocation
        for app in &self.apps {
            if parse_app_id(app).is_none() {
                return Err(SyncError::InvalidAppId {
                    app_id: app.clone(),
                }
                .into());
            }
        }

        let steamcmd = SteamCmd::new(&config.steamcmd_root);
        println!("{}", "Fetching app info (SteamCMD may look stuck, be patient)...".yellow());
        let Some(output) = steamcmd.app_info(&self.apps).await? else {
            println!("{}", "SteamCMD produced no usable data; nothing generated.".red());
            return Ok(());
        };

        let apps = match vdf::scan_tool_output(&output) {
            ParseOutcome::Parsed(apps) => apps,
            ParseOutcome::Unparsed(raw) => {
                error!(target: "steamcmd", "unparseable tool output ({} bytes)", raw.len());
                let excerpt: String = raw.chars().take(400).collect();
                println!("{}", "Could not parse SteamCMD output:".red());
                println!("{excerpt}");
                return Ok(());
            }
        };

        if apps.is_empty() {
            println!("{}", "No application data found in SteamCMD output.".yellow());
            return Ok(());
        }

        std::fs::create_dir_all(&config.manifest_root).with_context(|| {
            format!("Failed to create {}", config.manifest_root.display())
        })?;

        let generator = ManifestGenerator::new(config.platform.clone());
        let mut written = 0usize;
        for (app_key, data) in &apps {
            let Some(app_id) = parse_app_id(app_key) else {
                warn!(target: "manifest", "ignoring non-numeric app key \"{app_key}\" in output");
                continue;
            };

            // One bad application must not sink the rest of the batch
            let result = AppRecord::from_vdf(app_id, data).map(|record| {
                let document = generator.generate(&record);
                let path = manifest_path(&config.manifest_root, app_id);
                std::fs::write(&path, vdf::write(&document)).map(|()| path)
            });
            match result {
                Ok(Ok(path)) => {
                    info!(target: "manifest", app_id, "wrote {}", path.display());
                    println!("  {} {}", "generated".green(), path.display());
                    written += 1;
                }
                Ok(Err(err)) => {
                    error!(target: "manifest", app_id, "write failed: {err:#}");
                }
                Err(err) => {
                    error!(target: "manifest", app_id, "generation failed: {err:#}");
                }
            }
        }

        println!(
            "\n{} {} manifest(s) in {}",
            "Generated".green().bold(),
            written,
            config.manifest_root.display()
        );
        Ok(())
    }
}
