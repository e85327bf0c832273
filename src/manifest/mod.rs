//! Install manifest generation.
//!
//! This module turns one application's parsed VDF record into the
//! `appmanifest_<appid>.acf` document the Steam client reads. It owns the
//! typed views over the tool output ([`AppRecord`], [`DepotRecord`]) and the
//! depot-selection rules ([`ManifestGenerator`]).
//!
//! # Depot selection
//!
//! For each depot id in the application's depot mapping, in input order:
//!
//! 1. Non-numeric ids (branch lists and other metadata entries) are not
//!    depots and are dropped during extraction.
//! 2. A depot whose OS list is present and does not include the target
//!    platform is skipped.
//! 3. A shared-install depot is recorded under `SharedDepots` keyed by depot
//!    id → source app id; it contributes no size and never appears under
//!    `InstalledDepots`.
//! 4. A depot with no public manifest id is unused and skipped without error.
//! 5. Everything else becomes an `InstalledDepots` entry with its manifest id
//!    and size, carrying `dlcappid` through when present.
//!
//! `SizeOnDisk` is set to the FIRST installed depot's size, not the sum.
//! Downstream tooling was built against this behavior; the order-sensitivity
//! is pinned by tests.
//!
//! # Lifecycle
//!
//! An [`AppRecord`] is materialized once per parse and is immutable
//! thereafter; the generated document is serialized to disk and never mutated
//! after write.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::core::SyncError;
use crate::vdf::{Map, Value};

/// One content unit belonging to an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepotRecord {
    /// Depot identifier (a numeric string).
    pub id: String,
    /// Display name, when the tool reports one.
    pub name: Option<String>,
    /// Maximum size in bytes; 0 when absent.
    pub max_size: u64,
    /// Manifest id for the public release channel.
    pub public_manifest: Option<String>,
    /// OS applicability; `None` means all OSes.
    pub os_list: Option<Vec<String>>,
    /// Parent app id when this depot is DLC content.
    pub dlc_app_id: Option<String>,
    /// Source app id when this depot is installed from another app.
    pub shared_from_app: Option<String>,
}

impl DepotRecord {
    /// Materialize a depot from its VDF entry.
    fn from_vdf(id: &str, data: &Value) -> Self {
        let name = data.get("name").and_then(Value::as_str).map(str::to_string);
        let max_size = data
            .get("maxsize")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        // The public manifest is a scalar in older tool output and a map
        // carrying a "gid" in newer output.
        let public_manifest =
            data.get("manifests").and_then(|m| m.get("public")).and_then(|v| {
                v.as_str()
                    .map(str::to_string)
                    .or_else(|| v.get("gid").and_then(Value::as_str).map(str::to_string))
            });

        let os_list = data
            .get("config")
            .and_then(|c| c.get("oslist"))
            .and_then(Value::as_str)
            .map(|list| {
                list.split(',')
                    .map(|os| os.trim().to_string())
                    .filter(|os| !os.is_empty())
                    .collect()
            });

        let dlc_app_id = data.get("dlcappid").and_then(Value::as_str).map(str::to_string);

        let shared_from_app = if data.get("sharedinstall").is_some() {
            Some(
                data.get("depotfromapp")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            )
        } else {
            None
        };

        Self {
            id: id.to_string(),
            name,
            max_size,
            public_manifest,
            os_list,
            dlc_app_id,
            shared_from_app,
        }
    }

    /// Whether this depot applies to the given target platform.
    ///
    /// An absent OS list means the depot applies everywhere; a `None` target
    /// disables the filter.
    fn applies_to(&self, platform: Option<&str>) -> bool {
        match (&self.os_list, platform) {
            (None, _) | (_, None) => true,
            (Some(list), Some(target)) => list.iter().any(|os| os == target),
        }
    }
}

/// One application's parsed record for a single synchronization pass.
///
/// Owned exclusively by the parse result; discarded after manifest
/// generation.
#[derive(Debug, Clone)]
pub struct AppRecord {
    /// Application identifier.
    pub app_id: u32,
    /// Display name (`common.name`), empty when absent.
    pub name: String,
    /// Install directory name (`config.installdir`), empty when absent.
    pub install_dir: String,
    /// Public build identifier (`depots.branches.public.buildid`), empty
    /// when absent.
    pub build_id: String,
    /// Depot id → record, in tool output order. Non-numeric entries from the
    /// depots section are already dropped.
    pub depots: IndexMap<String, DepotRecord>,
}

impl AppRecord {
    /// Materialize an application record from its parsed VDF entry.
    ///
    /// Absent string fields default to empty and absent numeric fields to 0;
    /// only an app entry that is not a map at all is rejected.
    pub fn from_vdf(app_id: u32, data: &Value) -> Result<Self, SyncError> {
        if data.as_map().is_none() {
            return Err(SyncError::MissingAppField {
                app_id,
                field: "<root map>".to_string(),
            });
        }

        let name = data
            .get("common")
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let install_dir = data
            .get("config")
            .and_then(|c| c.get("installdir"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let build_id = data
            .get("depots")
            .and_then(|d| d.get("branches"))
            .and_then(|b| b.get("public"))
            .and_then(|p| p.get("buildid"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut depots = IndexMap::new();
        if let Some(depot_map) = data.get("depots").and_then(Value::as_map) {
            for (depot_id, depot_data) in depot_map {
                if !is_numeric(depot_id) {
                    debug!(target: "manifest", app_id, depot_id, "skipping non-depot entry");
                    continue;
                }
                depots.insert(depot_id.clone(), DepotRecord::from_vdf(depot_id, depot_data));
            }
        }

        Ok(Self {
            app_id,
            name,
            install_dir,
            build_id,
            depots,
        })
    }
}

/// Derives install manifest documents from parsed application records.
#[derive(Debug, Clone)]
pub struct ManifestGenerator {
    /// Target platform filter; `None` selects depots for every OS.
    platform: Option<String>,
}

impl ManifestGenerator {
    /// Create a generator for the given target platform.
    pub fn new(platform: Option<String>) -> Self {
        Self {
            platform,
        }
    }

    /// Build the `AppState` document for one application.
    ///
    /// The returned map serializes with [`crate::vdf::write`] into the exact
    /// nested key/value form the external tool reads back. `InstalledDepots`
    /// and `SharedDepots` are omitted entirely when empty.
    pub fn generate(&self, app: &AppRecord) -> Map {
        let platform = self.platform.as_deref();
        let mut installed = Map::new();
        let mut shared = Map::new();
        let mut app_size: u64 = 0;

        for (depot_id, depot) in &app.depots {
            if !depot.applies_to(platform) {
                debug!(target: "manifest", app_id = app.app_id, depot_id,
                       "depot does not apply to target platform");
                continue;
            }

            if let Some(source_app) = &depot.shared_from_app {
                shared.insert(depot_id.clone(), Value::Str(source_app.clone()));
                continue;
            }

            let Some(manifest_id) = &depot.public_manifest else {
                debug!(target: "manifest", app_id = app.app_id, depot_id, "unused depot");
                continue;
            };

            if app_size == 0 {
                app_size = depot.max_size;
            }

            let mut entry = Map::new();
            entry.insert("manifest".to_string(), Value::Str(manifest_id.clone()));
            entry.insert("size".to_string(), Value::Int(depot.max_size as i64));
            if let Some(dlc_app_id) = &depot.dlc_app_id {
                entry.insert("dlcappid".to_string(), Value::Str(dlc_app_id.clone()));
            }
            installed.insert(depot_id.clone(), Value::Map(entry));
        }

        let mut state = Map::new();
        state.insert("appid".to_string(), Value::Int(i64::from(app.app_id)));
        state.insert("Universe".to_string(), Value::Int(1));
        state.insert("LauncherPath".to_string(), Value::Str(String::new()));
        state.insert("name".to_string(), Value::Str(app.name.clone()));
        state.insert("StateFlags".to_string(), Value::Int(6));
        state.insert("installdir".to_string(), Value::Str(app.install_dir.clone()));
        state.insert("LastUpdated".to_string(), Value::Int(0));
        state.insert("SizeOnDisk".to_string(), Value::Int(app_size as i64));
        state.insert("StagingSize".to_string(), Value::Int(0));
        state.insert("buildid".to_string(), Value::Str(app.build_id.clone()));
        state.insert("LastOwner".to_string(), Value::Int(2009));
        state.insert("UpdateResult".to_string(), Value::Int(0));
        state.insert("BytesToDownload".to_string(), Value::Int(0));
        state.insert("BytesDownloaded".to_string(), Value::Int(0));
        state.insert("BytesToStage".to_string(), Value::Int(0));
        state.insert("BytesStaged".to_string(), Value::Int(0));
        state.insert("TargetBuildID".to_string(), Value::Int(0));
        state.insert("AutoUpdateBehavior".to_string(), Value::Int(0));
        state.insert("AllowOtherDownloadsWhileRunning".to_string(), Value::Int(0));
        state.insert("ScheduledAutoUpdate".to_string(), Value::Int(0));

        if !installed.is_empty() {
            state.insert("InstalledDepots".to_string(), Value::Map(installed));
        }
        if !shared.is_empty() {
            state.insert("SharedDepots".to_string(), Value::Map(shared));
        }

        let mut document = Map::new();
        document.insert("AppState".to_string(), Value::Map(state));
        document
    }
}

/// Deterministic manifest file name for an application.
pub fn manifest_file_name(app_id: u32) -> String {
    format!("appmanifest_{app_id}.acf")
}

/// Full path of an application's manifest under the steamapps root.
pub fn manifest_path(root: &Path, app_id: u32) -> PathBuf {
    root.join(manifest_file_name(app_id))
}

/// Whether a string is a well-formed numeric identifier (all ASCII digits,
/// non-empty).
pub fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a branch or app identifier, requiring a strictly positive value.
pub fn parse_app_id(s: &str) -> Option<u32> {
    if !is_numeric(s) {
        return None;
    }
    match s.parse::<u32>() {
        Ok(id) if id > 0 => Some(id),
        _ => None,
    }
}
