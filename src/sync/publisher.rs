//! Listing-republish engine.

use anyhow::Result;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::{BranchOrder, numeric_branches};
use crate::constants::QUOTA_FLOOR_BATCH;
use crate::core::SyncError;
use crate::hosting::{HostingApi, QuotaGovernor};
use crate::publish::{IndexApi, IndexUpdate, ObjectStore};
use crate::utils::ProgressBar;

/// Aggregated counts for one publish pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    /// Branches whose listing reached the indexing API.
    pub published: usize,
    /// Files re-uploaded to the object store.
    pub mirrored: usize,
    /// Branches that failed; details are in the log.
    pub failed: usize,
}

/// Publishes each numeric branch's `(sha, file listing)` to the indexing
/// API, optionally mirroring file bytes to an object store.
///
/// This mode performs no content comparison: the listing is republished
/// unconditionally every pass. Identical input produces an identical
/// payload, so the operation is idempotent by construction.
pub struct ListingPublisher<H, I, S> {
    api: Arc<H>,
    governor: QuotaGovernor<H>,
    index: I,
    store: Option<S>,
    max_parallel: usize,
    order: BranchOrder,
}

impl<H, I, S> ListingPublisher<H, I, S>
where
    H: HostingApi,
    I: IndexApi,
    S: ObjectStore,
{
    /// Create a publisher; pass `store: None` to skip the mirror step.
    pub fn new(
        api: Arc<H>,
        index: I,
        store: Option<S>,
        max_parallel: usize,
        order: BranchOrder,
    ) -> Self {
        let governor = QuotaGovernor::new(api.clone());
        Self {
            api,
            governor,
            index,
            store,
            max_parallel: max_parallel.max(1),
            order,
        }
    }

    /// Override the quota wait margin (used by tests).
    #[must_use]
    pub fn with_quota_margin(mut self, margin: Duration) -> Self {
        self.governor = self.governor.with_margin(margin);
        self
    }

    /// Run one publish pass over every numeric branch.
    ///
    /// Per-branch failures are logged and counted, never propagated; only
    /// branch enumeration or rate-limit failures abort the pass.
    pub async fn run(&self) -> Result<PublishSummary> {
        self.governor.check_budget(QUOTA_FLOOR_BATCH).await?;
        let mut targets = numeric_branches(&self.api.list_branches().await?);
        let day = chrono::Datelike::day(&chrono::Local::now());
        self.order.arrange(&mut targets, day);

        info!(target: "sync", "publishing listings for {} branch(es)", targets.len());
        let bar = ProgressBar::new(targets.len() as u64);
        bar.set_message("publishing listings");

        let mut summary = PublishSummary::default();
        let mut results = futures::stream::iter(
            targets.into_iter().map(|app_id| async move {
                (app_id, self.publish_branch(app_id).await)
            }),
        )
        .buffer_unordered(self.max_parallel);

        while let Some((app_id, result)) = results.next().await {
            match result {
                Ok(mirrored) => {
                    info!(target: "sync", app_id, "branch {app_id}: listing published");
                    summary.published += 1;
                    summary.mirrored += mirrored;
                }
                Err(err) => {
                    error!(target: "sync", app_id, "branch {app_id} failed: {err:#}");
                    summary.failed += 1;
                }
            }
            bar.inc(1);
        }
        bar.finish_with_message("publish complete");

        Ok(summary)
    }

    /// Publish one branch; returns the number of mirrored files.
    async fn publish_branch(&self, app_id: u32) -> Result<usize> {
        let branch_name = app_id.to_string();

        self.governor.check_budget(QUOTA_FLOOR_BATCH).await?;
        let Some(branch) = self.api.get_branch(&branch_name).await? else {
            return Err(SyncError::Other {
                message: format!("branch {branch_name} disappeared during the pass"),
            }
            .into());
        };

        self.governor.check_budget(QUOTA_FLOOR_BATCH).await?;
        let paths = self.api.list_dir("", &branch_name).await?;

        self.index
            .publish(&IndexUpdate {
                branch: branch_name.clone(),
                sha: branch.commit_sha,
                paths: paths.clone(),
            })
            .await?;

        let mut mirrored = 0;
        if let Some(store) = &self.store {
            for file_name in &paths {
                self.governor.check_budget(QUOTA_FLOOR_BATCH).await?;
                match self.api.get_file(file_name, &branch_name).await? {
                    Some(file) => {
                        store.put(&branch_name, file_name, file.content).await?;
                        mirrored += 1;
                    }
                    None => {
                        warn!(
                            target: "sync",
                            app_id,
                            "{file_name} vanished from branch {branch_name} before mirroring"
                        );
                    }
                }
            }
        }
        Ok(mirrored)
    }
}
