//! Rate-limit enforcement for quota-limited remote APIs.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{HostingApi, QuotaState};
use crate::constants::QUOTA_SAFETY_MARGIN;
use crate::core::SyncError;

/// Governs access to a quota-limited API by waiting out reset windows.
///
/// Wraps any [`HostingApi`] and exposes one operation:
/// [`check_budget`](Self::check_budget), to be called immediately before
/// every quota-consuming request. The remaining budget is read fresh from
/// the API on each check; nothing is cached, so concurrent workers each see
/// current numbers at the cost of an extra round-trip per call.
#[derive(Debug, Clone)]
pub struct QuotaGovernor<H> {
    api: Arc<H>,
    margin: Duration,
}

impl<H: HostingApi> QuotaGovernor<H> {
    /// Create a governor over the given API handle.
    pub fn new(api: Arc<H>) -> Self {
        Self {
            api,
            margin: QUOTA_SAFETY_MARGIN,
        }
    }

    /// Override the safety margin added to the reset time (used by tests).
    #[must_use]
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Block until at least `floor` calls are available.
    ///
    /// Queries the current remaining-call count and reset time. If the
    /// remaining budget is at or below `floor`, suspends the calling task
    /// until the reset time plus the safety margin has elapsed, then
    /// returns; otherwise returns immediately. Either way the observed
    /// [`QuotaState`] is returned and logged.
    ///
    /// Callers choose the floor: 1 for single sequential calls, a looser
    /// floor when many operations are anticipated in one pass.
    ///
    /// # Errors
    ///
    /// Inability to query the rate limit at all is fatal for the pass
    /// ([`SyncError::RateLimitUnavailable`]); proceeding without knowing the
    /// budget risks hard failures from the remote API.
    pub async fn check_budget(&self, floor: u64) -> Result<QuotaState> {
        let state = self.api.rate_limit().await.map_err(|err| SyncError::RateLimitUnavailable {
            reason: format!("{err:#}"),
        })?;

        if state.remaining <= floor {
            let now = Utc::now();
            let until_reset = (state.reset - now).to_std().unwrap_or(Duration::ZERO);
            let wait = until_reset + self.margin;
            info!(
                target: "hosting",
                "rate limit exhausted ({} remaining, floor {floor}); pausing {}s until {}",
                state.remaining,
                wait.as_secs(),
                state.reset
            );
            tokio::time::sleep(wait).await;
        } else {
            info!(
                target: "hosting",
                "rate limit: {} remaining, resets at {}",
                state.remaining,
                state.reset
            );
        }

        Ok(state)
    }
}
