//! Remote hosting API integration.
//!
//! The branch-per-application layout lives in a Git hosting service consumed
//! exclusively through its REST API - the synchronizer never clones the
//! repository. This module defines the [`HostingApi`] seam, the concrete
//! GitHub implementation ([`GitHubClient`]), and the rate-limit enforcement
//! ([`QuotaGovernor`]).
//!
//! # Quota discipline
//!
//! Every quota-consuming operation must be preceded by
//! [`QuotaGovernor::check_budget`] with a caller-chosen floor. The governor
//! reads the remaining budget fresh from the API on every check - there is no
//! cached counter anywhere, because concurrent workers would invalidate it.
//! The check-then-act pair is not atomic across workers; a race can let one
//! worker proceed on a near-exhausted budget, which is an accepted, bounded
//! risk (each worker wastes at most the handful of calls it had in flight).
//!
//! # Probe semantics
//!
//! "Does this file/branch exist" probes map a 404 to `None` instead of an
//! error, which is what enables create-vs-update branching in the
//! synchronizer. Every other non-success status is an error carrying the
//! operation, status, and response body.

mod github;
mod quota;

pub use github::GitHubClient;
pub use quota::QuotaGovernor;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::future::Future;

/// One remote branch and its tip commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Branch name as reported by the hosting service.
    pub name: String,
    /// Tip commit sha.
    pub commit_sha: String,
}

/// One file fetched from a branch, content already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Path of the file within the branch.
    pub path: String,
    /// Blob sha, required by the update operation.
    pub sha: String,
    /// Decoded file bytes.
    pub content: Vec<u8>,
}

/// Remaining call budget and its reset time.
///
/// Refreshed by querying the remote API before any quota-consuming
/// operation; never cached longer than one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    /// Calls remaining in the current window.
    pub remaining: u64,
    /// When the window resets.
    pub reset: DateTime<Utc>,
}

/// Operations the synchronizer consumes from the hosting service.
///
/// The trait exists so the sync engines can run against an in-memory
/// implementation in tests; [`GitHubClient`] is the production one. All
/// methods that can consume quota must be preceded by a governor check at
/// the call site - the client itself does not enforce that.
pub trait HostingApi: Send + Sync {
    /// Query the current rate-limit status. Does not consume quota.
    fn rate_limit(&self) -> impl Future<Output = Result<QuotaState>> + Send;

    /// Enumerate all branches of the repository.
    fn list_branches(&self) -> impl Future<Output = Result<Vec<Branch>>> + Send;

    /// Fetch one branch; `None` when it does not exist.
    fn get_branch(&self, name: &str) -> impl Future<Output = Result<Option<Branch>>> + Send;

    /// Fetch one file at a ref; `None` when it does not exist.
    fn get_file(
        &self,
        path: &str,
        reference: &str,
    ) -> impl Future<Output = Result<Option<RemoteFile>>> + Send;

    /// List the file names directly under a directory at a ref.
    ///
    /// An empty `path` lists the branch root.
    fn list_dir(
        &self,
        path: &str,
        reference: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Create a new file on a branch.
    fn create_file(
        &self,
        path: &str,
        message: &str,
        content: &[u8],
        branch: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Replace an existing file on a branch, identified by its blob sha.
    fn update_file(
        &self,
        path: &str,
        message: &str,
        content: &[u8],
        sha: &str,
        branch: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}
