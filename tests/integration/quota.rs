//! Governor wait behavior against a mocked rate limit.
//!
//! These tests run under a paused tokio clock: sleeps auto-advance, so a
//! multi-second quota wait completes instantly in real time while the
//! virtual elapsed duration remains observable.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use manifest_sync::core::SyncError;
use manifest_sync::hosting::QuotaGovernor;

use crate::common::MockHost;

const MARGIN: Duration = Duration::from_secs(10);

fn governor(host: &Arc<MockHost>) -> QuotaGovernor<MockHost> {
    QuotaGovernor::new(host.clone()).with_margin(MARGIN)
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_waits_until_reset_plus_margin() {
    let host = Arc::new(MockHost::new());
    host.set_quota(1, Utc::now() + ChronoDuration::seconds(30));

    let start = tokio::time::Instant::now();
    governor(&host).check_budget(1).await.unwrap();
    let waited = start.elapsed();

    // ~30s to the reset, plus the 10s margin
    assert!(waited >= Duration::from_secs(30), "waited only {waited:?}");
    assert!(waited <= Duration::from_secs(50), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn budget_below_floor_also_waits() {
    let host = Arc::new(MockHost::new());
    host.set_quota(3, Utc::now() + ChronoDuration::seconds(5));

    let start = tokio::time::Instant::now();
    governor(&host).check_budget(10).await.unwrap();
    assert!(start.elapsed() >= MARGIN);
}

#[tokio::test(start_paused = true)]
async fn budget_above_floor_proceeds_immediately() {
    let host = Arc::new(MockHost::new());
    host.set_quota(100, Utc::now() + ChronoDuration::hours(1));

    let start = tokio::time::Instant::now();
    let state = governor(&host).check_budget(10).await.unwrap();

    assert_eq!(state.remaining, 100);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn reset_in_the_past_still_applies_the_margin() {
    let host = Arc::new(MockHost::new());
    host.set_quota(0, Utc::now() - ChronoDuration::seconds(60));

    let start = tokio::time::Instant::now();
    governor(&host).check_budget(1).await.unwrap();

    let waited = start.elapsed();
    assert!(waited >= MARGIN, "waited only {waited:?}");
    assert!(waited < Duration::from_secs(60));
}

#[tokio::test]
async fn unreachable_rate_limit_endpoint_is_fatal() {
    let host = Arc::new(MockHost::new());
    host.fail_rate_limit.store(true, std::sync::atomic::Ordering::SeqCst);

    let err = governor(&host).check_budget(1).await.unwrap_err();
    let sync_err = err.downcast_ref::<SyncError>().unwrap();
    assert!(matches!(sync_err, SyncError::RateLimitUnavailable { .. }));
}
