//! Branch-listing publication to the remote indexing API.

use anyhow::Result;
use serde::Serialize;
use std::future::Future;
use tracing::debug;

use crate::constants::HTTP_REQUEST_TIMEOUT;
use crate::core::SyncError;

/// One branch's published state: tip commit and top-level file names.
///
/// Identical input always produces an identical payload, so republishing
/// every pass is idempotent by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexUpdate {
    /// Branch name (a numeric application identifier).
    pub branch: String,
    /// Tip commit sha of the branch.
    pub sha: String,
    /// File names at the branch root.
    pub paths: Vec<String>,
}

/// Sink for branch listings.
pub trait IndexApi: Send + Sync {
    /// Publish one branch's listing.
    fn publish(&self, update: &IndexUpdate) -> impl Future<Output = Result<()>> + Send;
}

/// HTTP implementation POSTing JSON to a fixed endpoint.
///
/// Success is exactly HTTP 200; anything else, including other 2xx codes,
/// is a failure for that branch.
#[derive(Debug, Clone)]
pub struct HttpIndexApi {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpIndexApi {
    /// Create a publisher for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

impl IndexApi for HttpIndexApi {
    async fn publish(&self, update: &IndexUpdate) -> Result<()> {
        let response = self.http.post(&self.endpoint).json(update).send().await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(SyncError::IndexPublishFailed {
                branch: update.branch.clone(),
                status,
            }
            .into());
        }
        debug!(target: "publish", branch = %update.branch, "listing published");
        Ok(())
    }
}
