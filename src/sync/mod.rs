//! Branch synchronization engines.
//!
//! Branches whose names are strictly positive integer strings denote
//! application identifiers; everything else in the repository is ignored.
//! Two engines walk those branches:
//!
//! - [`BranchSynchronizer`] - content-diff mode: compares each branch's
//!   published manifest against the locally generated artifact and performs
//!   create/update/skip decisions.
//! - [`ListingPublisher`](crate::sync::publisher::ListingPublisher) -
//!   listing-republish mode: pushes each branch's `(sha, file set)` to the
//!   indexing API (and optionally mirrors the bytes to an object store)
//!   without comparing anything.
//!
//! Both engines run branches through a bounded worker pool whose size is
//! fixed at process start, and both perform a fresh quota check before every
//! quota-consuming call. A failure inside one branch is logged and counted;
//! it never aborts sibling branches. Only setup failures (branch
//! enumeration, rate-limit queries) abort a pass.
//!
//! # Ordering
//!
//! Branch order carries no correctness weight (every branch is independent),
//! but processing order matters operationally: passes that die early always
//! starve the same tail of branches. [`BranchOrder::AlternateDaily`]
//! reverses the walk on odd days of the month to spread that bias around.

mod publisher;

pub use publisher::{ListingPublisher, PublishSummary};

use anyhow::Result;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::constants::QUOTA_FLOOR_SINGLE;
use crate::hosting::{Branch, HostingApi, QuotaGovernor};
use crate::manifest::{manifest_file_name, manifest_path, parse_app_id};
use crate::utils::ProgressBar;

/// Processing order for branch passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchOrder {
    /// Lowest application id first.
    Ascending,
    /// Highest application id first.
    Descending,
    /// Ascending on even days of the month, descending on odd days.
    AlternateDaily,
}

impl BranchOrder {
    /// Arrange application ids for a pass starting on `day_of_month`.
    pub fn arrange(self, app_ids: &mut Vec<u32>, day_of_month: u32) {
        app_ids.sort_unstable();
        let reverse = match self {
            Self::Ascending => false,
            Self::Descending => true,
            Self::AlternateDaily => day_of_month % 2 == 1,
        };
        if reverse {
            app_ids.reverse();
        }
    }
}

/// Keep only branches denoting application identifiers.
///
/// A branch qualifies when its name is all ASCII digits and parses to a
/// strictly positive integer.
pub fn numeric_branches(branches: &[Branch]) -> Vec<u32> {
    branches.iter().filter_map(|b| parse_app_id(&b.name)).collect()
}

/// Final state of one branch after a content-diff pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote copy already matches the local artifact; nothing written.
    Unchanged,
    /// No remote copy existed; one create call was issued.
    Created,
    /// Remote copy differed; one update call was issued.
    Updated,
    /// No locally generated manifest exists for this application.
    SkippedNoLocal,
    /// The requested application has no branch in the repository.
    SkippedNoBranch,
}

/// Aggregated counts for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Branches whose remote copy already matched.
    pub unchanged: usize,
    /// Branches that received a create call.
    pub created: usize,
    /// Branches that received an update call.
    pub updated: usize,
    /// Applications skipped for lack of a local artifact.
    pub skipped_no_local: usize,
    /// Applications skipped for lack of a remote branch.
    pub skipped_no_branch: usize,
    /// Branches that failed; details are in the log.
    pub failed: usize,
}

impl SyncSummary {
    fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Unchanged => self.unchanged += 1,
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::SkippedNoLocal => self.skipped_no_local += 1,
            SyncOutcome::SkippedNoBranch => self.skipped_no_branch += 1,
        }
    }

    /// Total branches considered.
    pub fn total(&self) -> usize {
        self.unchanged
            + self.created
            + self.updated
            + self.skipped_no_local
            + self.skipped_no_branch
            + self.failed
    }
}

/// Content-diff synchronization of manifest artifacts into their branches.
pub struct BranchSynchronizer<H> {
    api: Arc<H>,
    governor: QuotaGovernor<H>,
    manifest_root: PathBuf,
    max_parallel: usize,
    order: BranchOrder,
}

impl<H: HostingApi> BranchSynchronizer<H> {
    /// Create a synchronizer reading artifacts from `manifest_root`.
    pub fn new(
        api: Arc<H>,
        manifest_root: impl Into<PathBuf>,
        max_parallel: usize,
        order: BranchOrder,
    ) -> Self {
        let governor = QuotaGovernor::new(api.clone());
        Self {
            api,
            governor,
            manifest_root: manifest_root.into(),
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

    /// Run one pass.
    ///
    /// With `requested` unset, every numeric branch in the repository is a
    /// target. With an explicit list, each requested application is checked
    /// against the branch set and skipped when no branch exists for it.
    ///
    /// Per-branch failures are logged and counted, never propagated; only
    /// branch enumeration or rate-limit failures abort the pass.
    pub async fn run(&self, requested: Option<&[u32]>) -> Result<SyncSummary> {
        self.governor.check_budget(QUOTA_FLOOR_SINGLE).await?;
        let branch_set: BTreeSet<u32> =
            numeric_branches(&self.api.list_branches().await?).into_iter().collect();

        let mut targets: Vec<u32> = match requested {
            None => branch_set.iter().copied().collect(),
            Some(ids) => {
                let mut ids = ids.to_vec();
                ids.sort_unstable();
                ids.dedup();
                ids
            }
        };
        let day = chrono::Datelike::day(&chrono::Local::now());
        self.order.arrange(&mut targets, day);

        info!(target: "sync", "synchronizing {} application(s)", targets.len());
        let bar = ProgressBar::new(targets.len() as u64);
        bar.set_message("syncing branches");

        let mut summary = SyncSummary::default();
        let mut results = futures::stream::iter(targets.into_iter().map(|app_id| {
            let branch_exists = branch_set.contains(&app_id);
            async move {
                let result = if branch_exists {
                    self.sync_branch(app_id).await
                } else {
                    Ok(SyncOutcome::SkippedNoBranch)
                };
                (app_id, result)
            }
        }))
        .buffer_unordered(self.max_parallel);

        while let Some((app_id, result)) = results.next().await {
            match result {
                Ok(outcome) => {
                    info!(target: "sync", app_id, "branch {app_id}: {outcome:?}");
                    summary.record(outcome);
                }
                Err(err) => {
                    error!(target: "sync", app_id, "branch {app_id} failed: {err:#}");
                    summary.failed += 1;
                }
            }
            bar.inc(1);
        }
        bar.finish_with_message("sync complete");

        Ok(summary)
    }

    /// Reconcile one application's branch against its local artifact.
    async fn sync_branch(&self, app_id: u32) -> Result<SyncOutcome> {
        let local_path = manifest_path(&self.manifest_root, app_id);
        if !local_path.exists() {
            warn!(target: "sync", app_id, "no local artifact at {}", local_path.display());
            return Ok(SyncOutcome::SkippedNoLocal);
        }
        let local = tokio::fs::read(&local_path).await?;

        let file_name = manifest_file_name(app_id);
        let branch = app_id.to_string();

        self.governor.check_budget(QUOTA_FLOOR_SINGLE).await?;
        let remote = self.api.get_file(&file_name, &branch).await?;

        let message = format!("Update {file_name}");
        match remote {
            Some(existing) if existing.content == local => Ok(SyncOutcome::Unchanged),
            Some(existing) => {
                self.governor.check_budget(QUOTA_FLOOR_SINGLE).await?;
                self.api
                    .update_file(&file_name, &message, &local, &existing.sha, &branch)
                    .await?;
                Ok(SyncOutcome::Updated)
            }
            None => {
                self.governor.check_budget(QUOTA_FLOOR_SINGLE).await?;
                self.api.create_file(&file_name, &message, &local, &branch).await?;
                Ok(SyncOutcome::Created)
            }
        }
    }
}
