//! Republish branch listings to the indexing API.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

use crate::config::{GlobalConfig, hosting_token, store_credentials};
use crate::core::SyncError;
use crate::hosting::GitHubClient;
use crate::publish::{HttpIndexApi, S3Store};
use crate::sync::ListingPublisher;

/// Command to push every numeric branch's `(sha, file listing)` to the
/// indexing API, optionally re-uploading file bytes to the object store.
#[derive(Args)]
pub struct PublishCommand {
    /// Also mirror each file's bytes to the object store
    #[arg(long)]
    mirror: bool,

    /// Override the indexing endpoint from the config file
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Override the fixed worker pool size
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,
}

impl PublishCommand {
    /// Execute the publish command.
    pub async fn execute(self, config: &GlobalConfig) -> Result<()> {
        let endpoint = self
            .endpoint
            .clone()
            .or_else(|| config.index.endpoint.clone())
            .ok_or_else(|| SyncError::ConfigError {
                message: "index.endpoint is not configured (set it in msync.toml or pass \
                          --endpoint)"
                    .to_string(),
            })?;

        let token = hosting_token()?;
        let api = Arc::new(GitHubClient::new(
            config.repository.owner.clone(),
            config.repository.name.clone(),
            &token,
        )?);
        let index = HttpIndexApi::new(endpoint)?;

        let store = if self.mirror {
            if config.store.bucket.is_empty() || config.store.endpoint.is_empty() {
                return Err(SyncError::ConfigError {
                    message: "--mirror requires store.bucket and store.endpoint in msync.toml"
                        .to_string(),
                }
                .into());
            }
            let (key_id, secret) = store_credentials()?;
            Some(S3Store::new(
                config.store.bucket.clone(),
                &config.store.endpoint,
                &config.store.region,
                config.store.base_dir.clone(),
                &key_id,
                &secret,
            ))
        } else {
            None
        };

        let publisher = ListingPublisher::new(
            api,
            index,
            store,
            self.max_parallel.unwrap_or(config.max_parallel),
            config.branch_order,
        );
        let summary = publisher.run().await?;

        println!("\n{}", "Publish complete!".green().bold());
        println!("  {} listing(s) published", summary.published);
        if self.mirror {
            println!("  {} file(s) mirrored", summary.mirrored);
        }
        if summary.failed > 0 {
            println!("  {}", format!("{} failed (see log)", summary.failed).red());
        }
        Ok(())
    }
}
