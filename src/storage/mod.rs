//! Remote object storage for product images.
//!
//! [`BlobStore`] is the seam the uploader and prompt search work against;
//! [`azure::AzureBlobStore`] implements it over the Azure Blob REST API, authorizing
//! each request with a short-lived SAS from [`sas`].

pub mod azure;
pub mod sas;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Metadata returned by a blob lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobProperties {
    pub size: Option<u64>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_type: Option<String>,
}

/// A flat namespace of named blobs in one container.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Look up a blob by name. `Ok(None)` means the blob does not exist.
    async fn properties(&self, name: &str) -> Result<Option<BlobProperties>>;

    /// Upload `data` under `name`, replacing any existing blob.
    async fn upload(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Stable, unsigned URL of the blob.
    fn blob_url(&self, name: &str) -> String;

    /// Read-only URL valid for `ttl` from now. Signed anew on every call.
    fn signed_read_url(&self, name: &str, ttl: Duration) -> Result<String>;
}
