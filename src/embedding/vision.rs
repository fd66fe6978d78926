//! Azure AI Vision multimodal embeddings (`retrieval:vectorizeImage` / `vectorizeText`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;

use super::retry::RetryPolicy;
use super::{Embedder, EmbeddingError};
use crate::config::{require, VisionConfig};

const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

#[derive(Deserialize)]
struct VectorResponse {
    vector: Vec<f32>,
}

/// Vision service client. Image requests go through the retry policy; text requests are
/// attempted once.
pub struct VisionEmbedder {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    api_version: String,
    model_version: String,
    retry: RetryPolicy,
}

impl VisionEmbedder {
    pub fn new(config: &VisionConfig, retry: RetryPolicy) -> Result<Self> {
        let endpoint = require(&config.endpoint, "AZURE_AI_VISION_ENDPOINT")?;
        let key = require(&config.key, "AZURE_AI_VISION_KEY")?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("failed to build vision HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
            api_version: config.api_version.clone(),
            model_version: config.model_version.clone(),
            retry,
        })
    }

    fn url(&self, operation: &str) -> String {
        format!("{}/computervision/retrieval:{operation}", self.endpoint)
    }

    fn params(&self) -> [(&str, &str); 3] {
        [
            ("api-version", self.api_version.as_str()),
            ("overload", "stream"),
            ("modelVersion", self.model_version.as_str()),
        ]
    }

    async fn vectorize_image_once(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(self.url("vectorizeImage"))
            .query(&self.params())
            .header(CONTENT_TYPE, mime_type)
            .header(KEY_HEADER, &self.key)
            .body(image.to_vec())
            .send()
            .await
            .map_err(EmbeddingError::Connect)?;
        read_vector(response).await
    }
}

async fn read_vector(response: reqwest::Response) -> Result<Vec<f32>, EmbeddingError> {
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        tracing::info!(status = status.as_u16(), %body, "error generating embeddings");
        return Err(EmbeddingError::from_status(status.as_u16(), body));
    }
    let parsed: VectorResponse = response
        .json()
        .await
        .map_err(|e| EmbeddingError::Decode(e.to_string()))?;
    Ok(parsed.vector)
}

#[async_trait]
impl Embedder for VisionEmbedder {
    async fn embed_image(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Vec<f32>, EmbeddingError> {
        tracing::debug!(bytes = image.len(), mime_type, "generating embeddings from image");
        let vector = self
            .retry
            .run(
                || self.vectorize_image_once(image, mime_type),
                EmbeddingError::is_transient,
            )
            .await?;
        tracing::debug!(dims = vector.len(), "image embeddings generated");
        Ok(vector)
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        tracing::info!("generating embeddings from text");
        let response = self
            .client
            .post(self.url("vectorizeText"))
            .query(&self.params())
            .header(KEY_HEADER, &self.key)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(EmbeddingError::Connect)?;
        let vector = read_vector(response).await?;
        tracing::info!(dims = vector.len(), "text embeddings generated");
        Ok(vector)
    }
}
