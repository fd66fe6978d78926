use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;

use crate::catalog::{list_images, CatalogImage};
use crate::embedding::mime_for_path;
use crate::storage::BlobStore;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Files dropped because an earlier file already claimed their blob name.
    pub duplicates: usize,
}

/// Upload every file under `dir` that the store does not have yet, keyed by base
/// filename. The first file with a given name wins; later ones are never uploaded.
/// Lookup or upload failures are logged and the walk continues.
pub async fn upload_directory(store: &dyn BlobStore, dir: &Path) -> Result<UploadReport> {
    let images = list_images(dir)?;
    tracing::info!(dir = %dir.display(), files = images.len(), "uploading images");

    let mut report = UploadReport::default();
    let mut seen = HashSet::new();

    for image in &images {
        if !seen.insert(image.blob_name.as_str()) {
            tracing::warn!(
                blob = %image.blob_name,
                path = %image.path.display(),
                "blob name already used by an earlier file, skipping"
            );
            report.duplicates += 1;
            continue;
        }

        let url = store.blob_url(&image.blob_name);
        match store.properties(&image.blob_name).await {
            Ok(Some(_)) => {
                tracing::info!(blob = %url, "blob already exists, skipping upload");
                report.skipped += 1;
            }
            Ok(None) => match upload_one(store, image).await {
                Ok(()) => {
                    tracing::info!(path = %image.path.display(), blob = %url, "uploaded");
                    report.uploaded += 1;
                }
                Err(e) => {
                    tracing::error!(path = %image.path.display(), blob = %url, error = %e, "error uploading");
                    report.failed += 1;
                }
            },
            Err(e) => {
                tracing::error!(path = %image.path.display(), blob = %url, error = %e, "error checking blob");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

async fn upload_one(store: &dyn BlobStore, image: &CatalogImage) -> Result<()> {
    let data = tokio::fs::read(&image.path).await?;
    store
        .upload(&image.blob_name, data, mime_for_path(&image.path))
        .await
}
