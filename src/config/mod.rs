//! Configuration management for manifest-sync
//!
//! Two layers feed a pass:
//!
//! 1. **Config file** (`msync.toml`) - repository coordinates, platform
//!    filter, local roots, pool size, branch ordering, and the publish
//!    targets. Safe to commit; contains no secrets.
//! 2. **Environment credentials** - the hosting API token and object store
//!    key pair. Never read from the config file, never logged. Absence of a
//!    required credential is fatal at startup, before any network call.
//!
//! # File discovery
//!
//! The config file is resolved in order:
//! - `MSYNC_CONFIG` environment variable (must exist when set)
//! - `./msync.toml` in the working directory
//! - `<user config dir>/msync/config.toml`
//! - built-in defaults when none of the above exist
//!
//! # Example
//!
//! ```toml
//! platform = "windows"
//! max_parallel = 4
//! branch_order = "alternate-daily"
//!
//! [repository]
//! owner = "xx-tree"
//! name = "manifest-data"
//!
//! [index]
//! endpoint = "http://index.internal:8080/server/api/remote/setData"
//!
//! [store]
//! bucket = "manifest-mirror"
//! endpoint = "https://oss-cn-beijing.aliyuncs.com"
//! base_dir = "mirror/branches/data"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::DEFAULT_MAX_PARALLEL;
use crate::core::SyncError;
use crate::sync::BranchOrder;

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "MSYNC_CONFIG";

/// Primary environment variable holding the hosting API token.
pub const HOSTING_TOKEN_ENV: &str = "MSYNC_GITHUB_TOKEN";

/// Fallback token variable, honored for CI convenience.
pub const HOSTING_TOKEN_FALLBACK_ENV: &str = "GITHUB_TOKEN";

/// Object store access key id variable.
pub const STORE_KEY_ID_ENV: &str = "OSS_ACCESS_KEY_ID";

/// Object store secret key variable.
pub const STORE_SECRET_ENV: &str = "OSS_ACCESS_KEY_SECRET";

/// Repository coordinates in the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Account owning the branch-per-application repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: "xx-tree".to_string(),
            name: "manifest-data".to_string(),
        }
    }
}

/// Indexing API settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Endpoint receiving `{branch, sha, paths}` payloads.
    pub endpoint: Option<String>,
}

/// Object store settings for the optional mirror step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Bucket name; empty disables mirroring.
    pub bucket: String,
    /// S3-compatible endpoint URL.
    pub endpoint: String,
    /// Region passed to the SDK (compatibility endpoints ignore it).
    pub region: String,
    /// Key prefix under which branch directories are created.
    pub base_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            endpoint: String::new(),
            region: "us-east-1".to_string(),
            base_dir: "branches/data".to_string(),
        }
    }
}

/// Top-level configuration for one synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Hosting repository coordinates.
    pub repository: RepositoryConfig,
    /// Target platform filter for depot selection; `None` keeps every OS.
    pub platform: Option<String>,
    /// Directory holding generated `appmanifest_*.acf` files.
    pub manifest_root: PathBuf,
    /// Directory holding the SteamCMD installation.
    pub steamcmd_root: PathBuf,
    /// Fixed size of the branch worker pool.
    pub max_parallel: usize,
    /// Processing order for branch passes.
    pub branch_order: BranchOrder,
    /// Indexing API settings.
    pub index: IndexConfig,
    /// Object store settings.
    pub store: StoreConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            repository: RepositoryConfig::default(),
            platform: Some("windows".to_string()),
            manifest_root: PathBuf::from("steamapps"),
            steamcmd_root: PathBuf::from("steamcmd"),
            max_parallel: DEFAULT_MAX_PARALLEL,
            branch_order: BranchOrder::Ascending,
            index: IndexConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load configuration using the standard discovery order.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::load_from(Path::new(&path));
        }

        let local = Path::new("msync.toml");
        if local.exists() {
            return Self::load_from(local);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user = config_dir.join("msync").join("config.toml");
            if user.exists() {
                return Self::load_from(&user);
            }
        }

        debug!(target: "config", "no config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.validate()?;
        debug!(target: "config", "loaded configuration from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.repository.owner.is_empty() || self.repository.name.is_empty() {
            return Err(SyncError::ConfigError {
                message: "repository.owner and repository.name must be set".to_string(),
            }
            .into());
        }
        if self.max_parallel == 0 {
            return Err(SyncError::ConfigError {
                message: "max_parallel must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Read the hosting API token from the environment.
///
/// # Errors
///
/// [`SyncError::MissingCredential`] when neither variable is set; the pass
/// must not start without it.
pub fn hosting_token() -> Result<String, SyncError> {
    resolve_token(
        std::env::var(HOSTING_TOKEN_ENV).ok(),
        std::env::var(HOSTING_TOKEN_FALLBACK_ENV).ok(),
    )
}

fn resolve_token(
    primary: Option<String>,
    fallback: Option<String>,
) -> Result<String, SyncError> {
    primary
        .filter(|t| !t.is_empty())
        .or_else(|| fallback.filter(|t| !t.is_empty()))
        .ok_or(SyncError::MissingCredential {
            variable: HOSTING_TOKEN_ENV.to_string(),
        })
}

/// Read the object store key pair from the environment.
pub fn store_credentials() -> Result<(String, String), SyncError> {
    let key_id = std::env::var(STORE_KEY_ID_ENV).ok().filter(|v| !v.is_empty()).ok_or(
        SyncError::MissingCredential {
            variable: STORE_KEY_ID_ENV.to_string(),
        },
    )?;
    let secret = std::env::var(STORE_SECRET_ENV).ok().filter(|v| !v.is_empty()).ok_or(
        SyncError::MissingCredential {
            variable: STORE_SECRET_ENV.to_string(),
        },
    )?;
    Ok((key_id, secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_sane() {
        let config = GlobalConfig::default();
        assert_eq!(config.platform.as_deref(), Some("windows"));
        assert_eq!(config.manifest_root, PathBuf::from("steamapps"));
        assert_eq!(config.max_parallel, DEFAULT_MAX_PARALLEL);
        assert_eq!(config.branch_order, BranchOrder::Ascending);
        assert!(config.index.endpoint.is_none());
    }

    #[test]
    fn full_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("msync.toml");
        std::fs::write(
            &path,
            r#"
platform = "windows"
max_parallel = 8
branch_order = "alternate-daily"

[repository]
owner = "someone"
name = "data"

[index]
endpoint = "http://127.0.0.1:9000/setData"

[store]
bucket = "mirror"
endpoint = "https://oss.example.com"
base_dir = "mirror/data"
"#,
        )
        .unwrap();

        let config = GlobalConfig::load_from(&path).unwrap();
        assert_eq!(config.repository.owner, "someone");
        assert_eq!(config.max_parallel, 8);
        assert_eq!(config.branch_order, BranchOrder::AlternateDaily);
        assert_eq!(config.index.endpoint.as_deref(), Some("http://127.0.0.1:9000/setData"));
        assert_eq!(config.store.bucket, "mirror");
        // Unset fields keep their defaults
        assert_eq!(config.store.region, "us-east-1");
        assert_eq!(config.steamcmd_root, PathBuf::from("steamcmd"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("msync.toml");
        std::fs::write(&path, "no_such_field = true\n").unwrap();
        assert!(GlobalConfig::load_from(&path).is_err());
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("msync.toml");
        std::fs::write(&path, "max_parallel = 0\n").unwrap();
        assert!(GlobalConfig::load_from(&path).is_err());
    }

    #[test]
    fn token_resolution_prefers_the_primary_variable() {
        assert_eq!(
            resolve_token(Some("a".into()), Some("b".into())).unwrap(),
            "a"
        );
        assert_eq!(resolve_token(None, Some("b".into())).unwrap(), "b");
        assert_eq!(resolve_token(Some(String::new()), Some("b".into())).unwrap(), "b");
        assert!(matches!(
            resolve_token(None, None),
            Err(SyncError::MissingCredential { .. })
        ));
    }
}
