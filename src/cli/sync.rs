//! Synchronize local manifests into their branches.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

use crate::config::{GlobalConfig, hosting_token};
use crate::core::SyncError;
use crate::hosting::GitHubClient;
use crate::manifest::parse_app_id;
use crate::sync::BranchSynchronizer;

/// Command to reconcile locally generated manifest files with the
/// branch-per-application repository.
///
/// Without arguments every numeric branch is a target; with explicit app
/// ids only those applications are considered, and ids without a matching
/// branch are skipped (reported, not failed).
#[derive(Args)]
pub struct SyncCommand {
    /// Restrict the pass to these application ids
    #[arg(value_name = "APP_ID")]
    apps: Vec<String>,

    /// Override the fixed worker pool size
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,
}

impl SyncCommand {
    /// Execute the sync command.
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let requested = if self.apps.is_empty() {
            None
        } else {
            let mut ids = Vec::with_capacity(self.apps.len());
            for app in &self.apps {
                let Some(id) = parse_app_id(app) else {
                    return Err(SyncError::InvalidAppId {
                        app_id: app.clone(),
                    }
                    .into());
                };
                ids.push(id);
            }
            Some(ids)
        };

        let token = hosting_token()?;
        let api = Arc::new(GitHubClient::new(
            config.repository.owner.clone(),
            config.repository.name.clone(),
            &token,
        )?);

        let synchronizer = BranchSynchronizer::new(
            api,
            config.manifest_root.clone(),
            self.max_parallel.unwrap_or(config.max_parallel),
            config.branch_order,
        );
        let summary = synchronizer.run(requested.as_deref()).await?;

        println!("\n{}", "Synchronization complete!".green().bold());
        println!("  {} created", summary.created);
        println!("  {} updated", summary.updated);
        println!("  {} unchanged", summary.unchanged);
        if summary.skipped_no_local > 0 {
            println!("  {} skipped (no local manifest)", summary.skipped_no_local);
        }
        if summary.skipped_no_branch > 0 {
            println!("  {} skipped (no remote branch)", summary.skipped_no_branch);
        }
        if summary.failed > 0 {
            println!("  {}", format!("{} failed (see log)", summary.failed).red());
        }
        Ok(())
    }
}
