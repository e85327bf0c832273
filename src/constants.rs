//! Global constants used throughout the manifest-sync codebase.
//!
//! This module contains timeout durations, quota floors, and other numeric
//! constants that are used across multiple modules. Defining them centrally
//! improves maintainability and makes magic numbers more discoverable.

use std::time::Duration;

/// Safety margin added on top of a rate-limit reset time before resuming.
///
/// Remote reset timestamps have second granularity and can lag slightly
/// behind the server's actual window rollover, so quota waits sleep until
/// `reset + QUOTA_SAFETY_MARGIN`.
pub const QUOTA_SAFETY_MARGIN: Duration = Duration::from_secs(10);

/// Quota floor for single, sequential API calls.
///
/// With one caller in flight a single remaining request is enough to issue
/// the next call safely.
pub const QUOTA_FLOOR_SINGLE: u64 = 1;

/// Quota floor for batched passes that issue many calls per branch.
///
/// Publish passes consume several requests per branch, so they refuse to
/// start a branch with fewer than this many requests remaining.
pub const QUOTA_FLOOR_BATCH: u64 = 10;

/// Default number of branches processed concurrently.
///
/// The pool is fixed at process start and never scales with branch count,
/// keeping remote call concurrency predictable under the quota governor.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Timeout for a SteamCMD info run (10 minutes).
///
/// First runs update the app info cache for every requested app and can be
/// slow on cold caches.
pub const STEAMCMD_RUN_TIMEOUT: Duration = Duration::from_secs(600);

/// Timeout for downloading the SteamCMD tarball (120 seconds).
pub const STEAMCMD_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Download URL for the Linux SteamCMD distribution.
pub const STEAMCMD_DOWNLOAD_URL: &str =
    "https://steamcdn-a.akamaihd.net/client/installer/steamcmd_linux.tar.gz";

/// App id used for the warm-up invocation.
///
/// Updating this tiny sentinel app works around known SteamCMD first-run
/// failures before the real info run.
pub const WARMUP_APP_ID: u32 = 4;

/// Timeout for individual hosting API requests (30 seconds).
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size used when enumerating branches from the hosting API.
pub const BRANCH_PAGE_SIZE: u32 = 100;
