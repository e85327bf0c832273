//! Object store mirroring of branch contents.

use anyhow::Result;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use std::future::Future;
use tracing::debug;

use crate::core::SyncError;

/// Sink for raw branch file bytes.
///
/// Keys are branch-scoped: one object per `(branch, file)` pair.
pub trait ObjectStore: Send + Sync {
    /// Store one file's bytes under its branch-scoped key.
    fn put(
        &self,
        branch: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// S3-compatible object store client.
///
/// Works against any S3-compatible endpoint (the production bucket lives on
/// an OSS-style service); path-style addressing is forced so bucket names
/// never have to resolve through DNS.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
}

impl S3Store {
    /// Create a store client from explicit credentials.
    pub fn new(
        bucket: impl Into<String>,
        endpoint: &str,
        region: &str,
        prefix: impl Into<String>,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Self {
        let credentials =
            Credentials::new(access_key_id, secret_access_key, None, None, "msync-env");
        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket: bucket.into(),
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Branch-scoped object key: `<prefix>/<branch>/<file>`.
    fn object_key(&self, branch: &str, file_name: &str) -> String {
        if self.prefix.is_empty() {
            format!("{branch}/{file_name}")
        } else {
            format!("{}/{branch}/{file_name}", self.prefix)
        }
    }
}

impl ObjectStore for S3Store {
    async fn put(&self, branch: &str, file_name: &str, content: Vec<u8>) -> Result<()> {
        let key = self.object_key(branch, file_name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|err| SyncError::StoreUploadFailed {
                key: key.clone(),
                reason: err.to_string(),
            })?;
        debug!(target: "publish", key = %key, "object uploaded");
        Ok(())
    }
}
