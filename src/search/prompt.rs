use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;

use super::{HybridQuery, SearchIndexClient};
use crate::embedding::Embedder;
use crate::storage::BlobStore;

/// Extension of the blobs that search hits point at.
const RESULT_BLOB_EXTENSION: &str = ".jpg";

/// A product returned for a prompt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchResult {
    /// Signed, time-limited download link. Never reuse past its expiry.
    pub buy_now_link: String,
    #[serde(rename = "price_of_the_product")]
    pub description: String,
    /// Stable, unsigned blob URL.
    pub product_image_url: String,
}

/// Answers text prompts from the published index.
pub struct PromptSearch<'a> {
    embedder: &'a dyn Embedder,
    index: &'a SearchIndexClient,
    blobs: &'a dyn BlobStore,
    result_top: usize,
    link_ttl: Duration,
}

impl<'a> PromptSearch<'a> {
    pub fn new(
        embedder: &'a dyn Embedder,
        index: &'a SearchIndexClient,
        blobs: &'a dyn BlobStore,
        result_top: usize,
        link_ttl: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            blobs,
            result_top,
            link_ttl,
        }
    }

    /// Embed `prompt`, run a hybrid query with `top_n` vector candidates, and sign a fresh
    /// read link for every hit. The number of results is capped by `result_top`.
    pub async fn search(&self, prompt: &str, top_n: usize) -> Result<Vec<SearchResult>> {
        anyhow::ensure!(top_n > 0, "top_n must be at least 1");
        anyhow::ensure!(self.result_top > 0, "search.result_top must be at least 1");
        tracing::info!(prompt, top_n, "searching for prompt");

        let vector = self
            .embedder
            .embed_text(prompt)
            .await
            .context("failed to embed prompt")?;

        let query = HybridQuery::new(prompt, vector, top_n, self.result_top);
        let hits = self.index.search(&query).await?;

        let mut results = Vec::with_capacity(hits.len());
        for (nb, hit) in hits.into_iter().enumerate() {
            tracing::info!(rank = nb + 1, description = %hit.description, score = hit.score, "search result");
            let blob_name = format!("{}{RESULT_BLOB_EXTENSION}", hit.description);
            let buy_now_link = self.blobs.signed_read_url(&blob_name, self.link_ttl)?;
            results.push(SearchResult {
                buy_now_link,
                product_image_url: self.blobs.blob_url(&blob_name),
                description: hit.description,
            });
        }
        Ok(results)
    }
}
