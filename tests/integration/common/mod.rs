//! In-memory implementations of the remote seams, with call recording.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use manifest_sync::hosting::{Branch, HostingApi, QuotaState, RemoteFile};
use manifest_sync::publish::{IndexApi, IndexUpdate, ObjectStore};

/// In-memory hosting repository.
///
/// Branch content is a map of `(branch, path)` → [`RemoteFile`]; every
/// mutating or probing call is recorded so tests can assert exactly which
/// operations a pass issued.
#[derive(Default)]
pub struct MockHost {
    pub branches: Mutex<Vec<Branch>>,
    pub files: Mutex<HashMap<(String, String), RemoteFile>>,
    pub quota: Mutex<Option<QuotaState>>,
    pub fail_rate_limit: AtomicBool,
    /// Branch names whose file probes should error.
    pub poisoned_branches: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_branch(&self, name: &str) {
        self.branches.lock().unwrap().push(Branch {
            name: name.to_string(),
            commit_sha: format!("sha-{name}"),
        });
    }

    pub fn add_file(&self, branch: &str, path: &str, content: &[u8]) {
        self.files.lock().unwrap().insert(
            (branch.to_string(), path.to_string()),
            RemoteFile {
                path: path.to_string(),
                sha: format!("blob-{branch}-{path}"),
                content: content.to_vec(),
            },
        );
    }

    pub fn set_quota(&self, remaining: u64, reset: DateTime<Utc>) {
        *self.quota.lock().unwrap() = Some(QuotaState {
            remaining,
            reset,
        });
    }

    pub fn poison_branch(&self, name: &str) {
        self.poisoned_branches.lock().unwrap().push(name.to_string());
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    /// Recorded calls starting with `prefix`.
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }
}

impl HostingApi for MockHost {
    async fn rate_limit(&self) -> Result<QuotaState> {
        if self.fail_rate_limit.load(Ordering::SeqCst) {
            bail!("rate limit endpoint unreachable");
        }
        Ok((*self.quota.lock().unwrap()).unwrap_or(QuotaState {
            remaining: 5000,
            reset: Utc::now() + ChronoDuration::hours(1),
        }))
    }

    async fn list_branches(&self) -> Result<Vec<Branch>> {
        self.record("list_branches".to_string());
        Ok(self.branches.lock().unwrap().clone())
    }

    async fn get_branch(&self, name: &str) -> Result<Option<Branch>> {
        self.record(format!("get_branch {name}"));
        Ok(self.branches.lock().unwrap().iter().find(|b| b.name == name).cloned())
    }

    async fn get_file(&self, path: &str, reference: &str) -> Result<Option<RemoteFile>> {
        self.record(format!("get_file {path}@{reference}"));
        if self.poisoned_branches.lock().unwrap().iter().any(|b| b == reference) {
            bail!("injected failure for branch {reference}");
        }
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(&(reference.to_string(), path.to_string()))
            .cloned())
    }

    async fn list_dir(&self, path: &str, reference: &str) -> Result<Vec<String>> {
        self.record(format!("list_dir {path}@{reference}"));
        let files = self.files.lock().unwrap();
        let mut names: Vec<String> = files
            .keys()
            .filter(|(branch, _)| branch == reference)
            .map(|(_, file)| file.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn create_file(
        &self,
        path: &str,
        _message: &str,
        content: &[u8],
        branch: &str,
    ) -> Result<()> {
        self.record(format!("create {path}@{branch}"));
        self.add_file(branch, path, content);
        Ok(())
    }

    async fn update_file(
        &self,
        path: &str,
        _message: &str,
        content: &[u8],
        sha: &str,
        branch: &str,
    ) -> Result<()> {
        self.record(format!("update {path}@{branch} sha={sha}"));
        self.add_file(branch, path, content);
        Ok(())
    }
}

/// Recording index sink.
#[derive(Default)]
pub struct MockIndex {
    pub published: Mutex<Vec<IndexUpdate>>,
    /// Branch names whose publication should fail.
    pub failing_branches: Mutex<Vec<String>>,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_branch(&self, name: &str) {
        self.failing_branches.lock().unwrap().push(name.to_string());
    }
}

impl IndexApi for &MockIndex {
    async fn publish(&self, update: &IndexUpdate) -> Result<()> {
        if self.failing_branches.lock().unwrap().iter().any(|b| b == &update.branch) {
            bail!("injected index failure for branch {}", update.branch);
        }
        self.published.lock().unwrap().push(update.clone());
        Ok(())
    }
}

/// Recording object store.
#[derive(Default)]
pub struct MockStore {
    pub objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectStore for &MockStore {
    async fn put(&self, branch: &str, file_name: &str, content: Vec<u8>) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert((branch.to_string(), file_name.to_string()), content);
        Ok(())
    }
}
