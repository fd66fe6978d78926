//! Command implementations behind the `lookbook` binary.
//!
//! Each command builds the clients it needs from [`LookbookConfig`], so a command only
//! fails on the settings it actually uses.

pub mod convert;
pub mod doctor;
pub mod index;
pub mod ingest;
pub mod search;
pub mod translate;

use anyhow::{Context, Result};

use crate::config::LookbookConfig;
use crate::embedding::retry::RetryPolicy;
use crate::embedding::vision::VisionEmbedder;
use crate::search::SearchIndexClient;
use crate::storage::azure::AzureBlobStore;

fn vision_embedder(config: &LookbookConfig) -> Result<VisionEmbedder> {
    let retry = RetryPolicy::from(&config.embedding.retry);
    VisionEmbedder::new(&config.vision, retry).context("vision service is not configured")
}

fn blob_store(config: &LookbookConfig) -> Result<AzureBlobStore> {
    AzureBlobStore::new(&config.blob).context("blob storage is not configured")
}

fn search_client(config: &LookbookConfig) -> Result<SearchIndexClient> {
    SearchIndexClient::new(&config.search).context("search service is not configured")
}
