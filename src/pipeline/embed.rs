use anyhow::Result;
use futures::StreamExt;
use std::collections::HashSet;
use indicatif::{ProgressBar, ProgressStyle};

use crate::catalog::records::RecordWriter;
use crate::catalog::CatalogImage;
use crate::config::EmbeddingConfig;
use crate::embedding::{mime_for_path, Embedder};

#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Expected vector length; anything else is recorded as a failure.
    pub dimensions: usize,
    /// Embedding requests in flight at once. 1 runs strictly one after another.
    pub concurrency: usize,
}

impl From<&EmbeddingConfig> for EmbedOptions {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            dimensions: config.dimensions,
            concurrency: config.concurrency,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EmbedReport {
    pub embedded: usize,
    pub failed: usize,
    /// Files dropped because an earlier file already claimed their blob name.
    pub duplicates: usize,
}

/// Embed every image and write one record per blob name, in `images` order. A failed
/// image gets a `null` vector; the batch always runs to the end.
///
/// Only the first file with a given blob name is embedded, the same file the uploader
/// keeps, so every record id is unique and its vector matches the stored blob.
pub async fn embed_catalog(
    embedder: &dyn Embedder,
    images: &[CatalogImage],
    writer: &mut RecordWriter,
    options: &EmbedOptions,
) -> Result<EmbedReport> {
    let mut report = EmbedReport::default();
    let mut seen = HashSet::new();
    let unique: Vec<&CatalogImage> = images
        .iter()
        .filter(|image| {
            if seen.insert(image.blob_name.as_str()) {
                return true;
            }
            tracing::warn!(
                blob = %image.blob_name,
                path = %image.path.display(),
                "blob name already used by an earlier file, not embedding"
            );
            report.duplicates += 1;
            false
        })
        .collect();

    let pb = ProgressBar::new(unique.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("##-"),
    );

    let dimensions = options.dimensions;
    let mut vectors = futures::stream::iter(unique.into_iter().map(|image| async move {
        let vector = embed_one(embedder, image, dimensions).await;
        (image, vector)
    }))
    .buffered(options.concurrency.max(1));

    while let Some((image, vector)) = vectors.next().await {
        if vector.is_some() {
            report.embedded += 1;
        } else {
            report.failed += 1;
        }
        writer.write(&image.record(vector))?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    tracing::info!(
        embedded = report.embedded,
        failed = report.failed,
        duplicates = report.duplicates,
        output = %writer.path().display(),
        "embeddings generated"
    );
    Ok(report)
}

async fn embed_one(
    embedder: &dyn Embedder,
    image: &CatalogImage,
    dimensions: usize,
) -> Option<Vec<f32>> {
    let bytes = match tokio::fs::read(&image.path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(path = %image.path.display(), error = %e, "error reading image");
            return None;
        }
    };

    match embedder.embed_image(&bytes, mime_for_path(&image.path)).await {
        Ok(vector) if vector.len() == dimensions => Some(vector),
        Ok(vector) => {
            tracing::error!(
                path = %image.path.display(),
                expected = dimensions,
                got = vector.len(),
                "embedding has the wrong dimensionality"
            );
            None
        }
        Err(e) => {
            tracing::error!(path = %image.path.display(), error = %e, "error processing image");
            None
        }
    }
}
