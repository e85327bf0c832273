//! GitHub REST implementation of the hosting API.

use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{Branch, HostingApi, QuotaState, RemoteFile};
use crate::constants::{BRANCH_PAGE_SIZE, HTTP_REQUEST_TIMEOUT};
use crate::core::SyncError;

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// GitHub REST v3 client scoped to one repository.
///
/// Holds a connection pool with the auth token and JSON accept header baked
/// in. Existence probes (`get_branch`, `get_file`) translate 404 into `None`;
/// every other non-success response becomes [`SyncError::ApiError`] with the
/// status and a truncated body.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Create a client for `owner/repo` authenticated with `token`.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("token {token}"))
            .map_err(|_| SyncError::ConfigError {
                message: "hosting token contains invalid header characters".to_string(),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("manifest-sync/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            owner: owner.into(),
            repo: repo.into(),
        })
    }

    /// Point the client at a different API base URL (used by tests).
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_base, self.owner, self.repo, path)
    }

    async fn api_error(operation: &str, response: reqwest::Response) -> SyncError {
        let status = response.status().as_u16();
        let body: String = response.text().await.unwrap_or_default().chars().take(300).collect();
        SyncError::ApiError {
            operation: operation.to_string(),
            status,
            body,
        }
    }
}

#[derive(Deserialize)]
struct RateLimitEnvelope {
    resources: RateLimitResources,
}

#[derive(Deserialize)]
struct RateLimitResources {
    core: RateLimitWindow,
}

#[derive(Deserialize)]
struct RateLimitWindow {
    remaining: u64,
    reset: i64,
}

#[derive(Deserialize)]
struct BranchEnvelope {
    name: String,
    commit: CommitRef,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct ContentEnvelope {
    path: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct DirEntry {
    name: String,
}

/// Decode the contents API's base64 payload, which interleaves newlines.
fn decode_content(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(BASE64.decode(compact.as_bytes()).map_err(|err| SyncError::Other {
        message: format!("invalid base64 file content: {err}"),
    })?)
}

impl HostingApi for GitHubClient {
    async fn rate_limit(&self) -> Result<QuotaState> {
        let url = format!("{}/rate_limit", self.api_base);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error("rate limit", response).await.into());
        }
        let envelope: RateLimitEnvelope = response.json().await?;
        Ok(QuotaState {
            remaining: envelope.resources.core.remaining,
            reset: DateTime::from_timestamp(envelope.resources.core.reset, 0).unwrap_or_default(),
        })
    }

    async fn list_branches(&self) -> Result<Vec<Branch>> {
        let mut branches = Vec::new();
        let mut page: u32 = 1;
        loop {
            let response = self
                .http
                .get(self.url("/branches"))
                .query(&[("per_page", BRANCH_PAGE_SIZE.to_string()), ("page", page.to_string())])
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(Self::api_error("list branches", response).await.into());
            }
            let batch: Vec<BranchEnvelope> = response.json().await?;
            let batch_len = batch.len();
            branches.extend(batch.into_iter().map(|b| Branch {
                name: b.name,
                commit_sha: b.commit.sha,
            }));
            if batch_len < BRANCH_PAGE_SIZE as usize {
                break;
            }
            page += 1;
        }
        debug!(target: "hosting", "enumerated {} branches", branches.len());
        Ok(branches)
    }

    async fn get_branch(&self, name: &str) -> Result<Option<Branch>> {
        let response = self.http.get(self.url(&format!("/branches/{name}"))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error("get branch", response).await.into());
        }
        let envelope: BranchEnvelope = response.json().await?;
        Ok(Some(Branch {
            name: envelope.name,
            commit_sha: envelope.commit.sha,
        }))
    }

    async fn get_file(&self, path: &str, reference: &str) -> Result<Option<RemoteFile>> {
        let response = self
            .http
            .get(self.url(&format!("/contents/{path}")))
            .query(&[("ref", reference)])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error("get file", response).await.into());
        }
        let envelope: ContentEnvelope = response.json().await?;
        let content = match envelope.content.as_deref() {
            Some(encoded) => decode_content(encoded)?,
            None => Vec::new(),
        };
        Ok(Some(RemoteFile {
            path: envelope.path,
            sha: envelope.sha,
            content,
        }))
    }

    async fn list_dir(&self, path: &str, reference: &str) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.url(&format!("/contents/{path}")))
            .query(&[("ref", reference)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error("list directory", response).await.into());
        }
        let entries: Vec<DirEntry> = response.json().await?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    async fn create_file(
        &self,
        path: &str,
        message: &str,
        content: &[u8],
        branch: &str,
    ) -> Result<()> {
        let body = json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": branch,
        });
        let response =
            self.http.put(self.url(&format!("/contents/{path}"))).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error("create file", response).await.into());
        }
        Ok(())
    }

    async fn update_file(
        &self,
        path: &str,
        message: &str,
        content: &[u8],
        sha: &str,
        branch: &str,
    ) -> Result<()> {
        let body = json!({
            "message": message,
            "content": BASE64.encode(content),
            "sha": sha,
            "branch": branch,
        });
        let response =
            self.http.put(self.url(&format!("/contents/{path}"))).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error("update file", response).await.into());
        }
        Ok(())
    }
}
