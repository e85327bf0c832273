//! manifest-sync - branch-per-application install manifest mirroring
//!
//! Keeps per-application Steam install manifests (`appmanifest_<appid>.acf`)
//! synchronized between SteamCMD's metadata output and a GitHub repository
//! where each strictly positive numeric branch name corresponds to one
//! application, then republishes an index of each branch's file set to a
//! remote API and/or object store.
//!
//! # Architecture Overview
//!
//! One invocation performs one bounded, idempotent synchronization pass:
//!
//! ```text
//! SteamCMD output ─► vdf parser ─► manifest generator ─► .acf files
//!                                                            │
//!                  quota-governed hosting API ◄── branch synchronizer
//!                                                            │
//!                        indexing API / object store ◄── publisher
//! ```
//!
//! # Core Modules
//!
//! ## Manifest Reconstruction
//! - [`vdf`] - VDF document model, parser, writer, and the tool-output block
//!   extractor with its tagged [`vdf::ParseOutcome`]
//! - [`manifest`] - depot selection rules and `AppState` document generation
//! - [`steamcmd`] - external tool driver (bootstrap, cache cleanup, warm-up,
//!   batched info runs)
//!
//! ## Rate-Governed Synchronization
//! - [`hosting`] - hosting API seam, GitHub REST client, and the
//!   [`hosting::QuotaGovernor`]
//! - [`sync`] - content-diff and listing-republish engines over a bounded
//!   worker pool
//! - [`publish`] - indexing API and object store sinks
//!
//! ## Supporting Modules
//! - [`cli`] - clap-based command-line surface (`generate`, `sync`,
//!   `publish`)
//! - [`config`] - `msync.toml` loading and environment credentials
//! - [`core`] - error taxonomy and user-facing error contexts
//! - [`constants`] - timeouts, quota floors, pool sizing
//! - [`utils`] - progress reporting
//!
//! # Quota Discipline
//!
//! Every quota-consuming call against the hosting API is immediately
//! preceded by a fresh [`hosting::QuotaGovernor::check_budget`] query; the
//! remaining budget is never cached, because concurrent workers would
//! invalidate any cached count. When the budget is at or below the caller's
//! floor, the calling task sleeps until the reset window (plus a safety
//! margin) has passed.
//!
//! # Failure Containment
//!
//! Per-application and per-branch failures are logged with their identifier
//! and counted in the pass summary; they never abort sibling work. Only
//! setup failures - missing credentials, an unreachable rate-limit endpoint,
//! invalid app ids - terminate the process with a non-zero status.

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;

// Manifest reconstruction
pub mod manifest;
pub mod steamcmd;
pub mod vdf;

// Rate-governed synchronization
pub mod hosting;
pub mod publish;
pub mod sync;

// Supporting modules
pub mod utils;
