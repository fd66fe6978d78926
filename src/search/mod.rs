//! Azure AI Search: index management, document upload, hybrid queries.
//!
//! [`SearchIndexClient`] speaks the REST API for one named index. [`schema`] builds the
//! index definition and [`prompt`] turns a free-text prompt into product results.

pub mod prompt;
pub mod schema;

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::catalog::ImageRecord;
use crate::config::{require, SearchConfig};
use schema::{IndexSchema, DESCRIPTION_FIELD, VECTOR_FIELD};

/// Most documents the service accepts in one indexing request.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Per-document outcome of an upload.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexingResult {
    pub key: String,
    pub status: bool,
    pub status_code: u16,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub document_count: u64,
    pub storage_size: u64,
    #[serde(default)]
    pub vector_index_size: u64,
}

/// A single hit of a hybrid query.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchHit {
    #[serde(rename = "@search.score", default)]
    pub score: f64,
    pub description: String,
}

/// Lexical + vector query. `k` bounds the vector candidates, `top` the final list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridQuery {
    pub search: String,
    pub vector_queries: Vec<VectorQuery>,
    pub select: String,
    pub top: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VectorQuery {
    pub kind: &'static str,
    pub vector: Vec<f32>,
    pub k: usize,
    pub fields: String,
}

impl HybridQuery {
    pub fn new(prompt: &str, vector: Vec<f32>, k: usize, top: usize) -> Self {
        Self {
            search: prompt.to_string(),
            vector_queries: vec![VectorQuery {
                kind: "vector",
                vector,
                k,
                fields: VECTOR_FIELD.to_string(),
            }],
            select: DESCRIPTION_FIELD.to_string(),
            top,
        }
    }
}

#[derive(Serialize)]
struct IndexAction<'a> {
    #[serde(rename = "@search.action")]
    action: &'static str,
    #[serde(flatten)]
    record: &'a ImageRecord,
}

#[derive(Deserialize)]
struct ValueList<T> {
    value: Vec<T>,
}

pub struct SearchIndexClient {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    index_name: String,
    api_version: String,
}

impl SearchIndexClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let endpoint = require(&config.endpoint, "AZURE_AI_SEARCH_ENDPOINT")?;
        let key = require(&config.key, "AZURE_AI_SEARCH_KEY")?;
        let index_name = require(&config.index_name, "AZURE_AI_SEARCH_INDEX_NAME")?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
            index_name: index_name.to_string(),
            api_version: config.api_version.clone(),
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/indexes/{}{suffix}", self.endpoint, self.index_name)
    }

    fn request(&self, method: reqwest::Method, suffix: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(suffix))
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.key)
    }

    /// Create the index, or replace the definition of an existing one with the same name.
    /// Returns the index name reported by the service.
    pub async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<String> {
        anyhow::ensure!(
            schema.name == self.index_name,
            "schema is for index {}, client is bound to {}",
            schema.name,
            self.index_name
        );
        let response = self
            .request(reqwest::Method::PUT, "")
            .header("Prefer", "return=representation")
            .json(schema)
            .send()
            .await
            .context("index create-or-update request failed")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !matches!(status, StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT) {
            bail!("index create-or-update returned HTTP {status}: {body}");
        }
        let name = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["name"].as_str().map(str::to_string))
            .unwrap_or_else(|| self.index_name.clone());
        Ok(name)
    }

    /// Upload documents in batches of at most [`MAX_BATCH_SIZE`]. Returns one result per
    /// document; individual documents may fail while the rest succeed.
    pub async fn upload_documents(
        &self,
        records: &[ImageRecord],
    ) -> Result<Vec<IndexingResult>> {
        let mut results = Vec::with_capacity(records.len());
        for batch in records.chunks(MAX_BATCH_SIZE) {
            let actions: Vec<IndexAction<'_>> = batch
                .iter()
                .map(|record| IndexAction {
                    action: "upload",
                    record,
                })
                .collect();

            let response = self
                .request(reqwest::Method::POST, "/docs/index")
                .json(&serde_json::json!({ "value": actions }))
                .send()
                .await
                .context("document upload request failed")?;

            let status = response.status();
            // 207 = some documents failed; their results say which.
            if !matches!(status, StatusCode::OK | StatusCode::MULTI_STATUS) {
                let body = response.text().await.unwrap_or_default();
                bail!("document upload returned HTTP {status}: {body}");
            }
            let parsed: ValueList<IndexingResult> = response
                .json()
                .await
                .context("malformed document upload response")?;
            results.extend(parsed.value);
        }
        Ok(results)
    }

    pub async fn search(&self, query: &HybridQuery) -> Result<Vec<SearchHit>> {
        let response = self
            .request(reqwest::Method::POST, "/docs/search")
            .json(query)
            .send()
            .await
            .context("search request failed")?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            bail!("search returned HTTP {status}: {body}");
        }
        let parsed: ValueList<SearchHit> =
            response.json().await.context("malformed search response")?;
        Ok(parsed.value)
    }

    pub async fn stats(&self) -> Result<IndexStats> {
        let response = self
            .request(reqwest::Method::GET, "/stats")
            .send()
            .await
            .context("index stats request failed")?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            bail!("index stats returned HTTP {status}: {body}");
        }
        response.json().await.context("malformed index stats response")
    }

    /// The index definition as the service reports it.
    pub async fn definition(&self) -> Result<serde_json::Value> {
        let response = self
            .request(reqwest::Method::GET, "")
            .send()
            .await
            .context("index definition request failed")?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            bail!("index definition returned HTTP {status}: {body}");
        }
        response.json().await.context("malformed index definition")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hybrid_query_json() {
        let query = HybridQuery::new("red sneakers", vec![0.5, 0.25], 5, 2);
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["search"], "red sneakers");
        assert_eq!(json["top"], 2);
        assert_eq!(json["select"], "description");
        assert_eq!(json["vectorQueries"][0]["kind"], "vector");
        assert_eq!(json["vectorQueries"][0]["k"], 5);
        assert_eq!(json["vectorQueries"][0]["fields"], "image_vector");
    }

    #[test]
    fn index_action_flattens_record() {
        let record = ImageRecord {
            id: "abc".into(),
            image_vector: None,
            description: "boot".into(),
        };
        let json = serde_json::to_value(IndexAction {
            action: "upload",
            record: &record,
        })
        .unwrap();
        assert_eq!(json["@search.action"], "upload");
        assert_eq!(json["id"], "abc");
        assert!(json["image_vector"].is_null());
    }

    #[test]
    fn new_requires_index_name() {
        let config = SearchConfig {
            endpoint: "https://s.example.net".into(),
            key: "k".into(),
            ..Default::default()
        };
        let err = SearchIndexClient::new(&config).err().unwrap();
        assert!(err.to_string().contains("AZURE_AI_SEARCH_INDEX_NAME"));
    }
}
