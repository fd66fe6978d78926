//! Image and text embedding through a remote vision service.
//!
//! Provides the [`Embedder`] trait, the [`EmbeddingError`] taxonomy that decides what is
//! retried, and [`vision::VisionEmbedder`], the Azure AI Vision implementation.

pub mod retry;
pub mod vision;

use async_trait::async_trait;
use std::path::Path;

/// Errors from an embedding call.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// Throttling or a server-side failure; worth retrying.
    #[error("embedding service returned HTTP {status}: {body}")]
    Transient { status: u16, body: String },
    /// The request never got a response. Retried only for connect failures and timeouts.
    #[error("embedding request failed: {0}")]
    Connect(#[source] reqwest::Error),
    /// The service refused the input or the credentials.
    #[error("embedding service rejected the request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("malformed embedding response: {0}")]
    Decode(String),
}

impl EmbeddingError {
    /// Whether the retry policy should try again after this error.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient { .. } => true,
            Self::Connect(e) => e.is_connect() || e.is_timeout(),
            Self::Rejected { .. } | Self::Decode(_) => false,
        }
    }

    /// Classify a non-200 response status.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 408 || status == 429 || (500..600).contains(&status) {
            Self::Transient { status, body }
        } else {
            Self::Rejected { status, body }
        }
    }
}

/// A source of fixed-length vectors for images and text in a shared embedding space.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed raw image bytes of the given mime type.
    async fn embed_image(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed a free-text prompt.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Mime type for an image path, by extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(EmbeddingError::from_status(429, String::new()).is_transient());
        assert!(EmbeddingError::from_status(503, String::new()).is_transient());
        assert!(EmbeddingError::from_status(408, String::new()).is_transient());
        assert!(!EmbeddingError::from_status(400, String::new()).is_transient());
        assert!(!EmbeddingError::from_status(401, String::new()).is_transient());
        assert!(!EmbeddingError::Decode("bad".into()).is_transient());
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("images/shoe.jpg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("images/shoe.JPEG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("shoe.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("notes.txt")), "application/octet-stream");
    }
}
