#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use lookbook::catalog::ImageRecord;
use lookbook::embedding::{Embedder, EmbeddingError};
use lookbook::storage::{BlobProperties, BlobStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// base64("secret-key-for-tests")
pub const TEST_ACCOUNT_KEY: &str = "c2VjcmV0LWtleS1mb3ItdGVzdHM=";

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn spawn_mock(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Deterministic vector of `dims` floats with a spike at `seed`.
pub fn test_vector(dims: usize, seed: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dims];
    v[seed % dims] = 1.0;
    v
}

pub fn record(id: &str, description: &str, vector: Option<Vec<f32>>) -> ImageRecord {
    ImageRecord {
        id: id.to_string(),
        image_vector: vector,
        description: description.to_string(),
    }
}

/// In-memory blob store that counts uploads and can be told to fail lookups.
#[derive(Default)]
pub struct MemoryBlobStore {
    pub blobs: Mutex<HashMap<String, Vec<u8>>>,
    pub failing_lookups: Mutex<HashSet<String>>,
    pub uploads: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn fail_lookup(&self, name: &str) {
        self.failing_lookups.lock().unwrap().insert(name.to_string());
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn properties(&self, name: &str) -> Result<Option<BlobProperties>> {
        if self.failing_lookups.lock().unwrap().contains(name) {
            bail!("simulated lookup failure for {name}");
        }
        Ok(self.blobs.lock().unwrap().get(name).map(|data| BlobProperties {
            size: Some(data.len() as u64),
            ..Default::default()
        }))
    }

    async fn upload(&self, name: &str, data: Vec<u8>, _content_type: &str) -> Result<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.blobs.lock().unwrap().insert(name.to_string(), data);
        Ok(())
    }

    fn blob_url(&self, name: &str) -> String {
        format!("memory://container/{name}")
    }

    fn signed_read_url(&self, name: &str, ttl: Duration) -> Result<String> {
        Ok(format!("memory://container/{name}?ttl={}", ttl.as_secs()))
    }
}

/// Embedder that returns `test_vector` for images and fails for images whose bytes
/// start with `b"bad"`.
pub struct ScriptedEmbedder {
    pub dims: usize,
    pub calls: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    async fn embed_image(
        &self,
        image: &[u8],
        _mime_type: &str,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if image.starts_with(b"bad") {
            return Err(EmbeddingError::Rejected {
                status: 400,
                body: "InvalidImageFormat".into(),
            });
        }
        if image.starts_with(b"short") {
            return Ok(vec![0.5; self.dims / 2]);
        }
        Ok(test_vector(self.dims, n))
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(test_vector(self.dims, text.len()))
    }
}
