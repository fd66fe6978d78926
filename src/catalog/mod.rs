//! The local product catalog: image files on disk and the records derived from them.
//!
//! - [`list_images`] walks the image directory.
//! - [`normalize`] converts legacy-format images in place.
//! - [`records`] writes and reads the line-delimited embedding record file.

pub mod normalize;
pub mod records;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// One catalog entry as written to the record file and published to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Stable document key, see [`ImageRecord::id_for`].
    pub id: String,
    /// Embedding of the image, `null` when generation failed.
    pub image_vector: Option<Vec<f32>>,
    /// File stem, shown to the user as the product label.
    pub description: String,
}

impl ImageRecord {
    /// Document key derived from the blob name: the first 32 hex digits of its SHA-256.
    /// Adding or removing other images never changes an existing key.
    pub fn id_for(blob_name: &str) -> String {
        let digest = format!("{:x}", Sha256::digest(blob_name.as_bytes()));
        digest[..32].to_string()
    }
}

/// An image file found in the catalog directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogImage {
    pub path: PathBuf,
    /// Base filename, the blob name in the flat remote namespace.
    pub blob_name: String,
    /// Filename without extension.
    pub description: String,
}

impl CatalogImage {
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let blob_name = path.file_name()?.to_str()?.to_string();
        let description = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            path,
            blob_name,
            description,
        })
    }

    pub fn record(&self, image_vector: Option<Vec<f32>>) -> ImageRecord {
        ImageRecord {
            id: ImageRecord::id_for(&self.blob_name),
            image_vector,
            description: self.description.clone(),
        }
    }
}

/// Every file under `dir`, recursively, each directory visited in file-name order.
pub fn list_images(dir: &Path) -> Result<Vec<CatalogImage>> {
    anyhow::ensure!(dir.is_dir(), "image directory not found: {}", dir.display());

    let mut images = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        match CatalogImage::from_path(entry.into_path()) {
            Some(image) => images.push(image),
            None => tracing::warn!("skipping file with a non UTF-8 name"),
        }
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_stable_and_key_safe() {
        let a = ImageRecord::id_for("red_sneakers_v2.jpg");
        assert_eq!(a, ImageRecord::id_for("red_sneakers_v2.jpg"));
        assert_ne!(a, ImageRecord::id_for("blue_sneakers.jpg"));
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn record_serializes_null_vector() {
        let image = CatalogImage::from_path(PathBuf::from("images/boot.jpg")).unwrap();
        assert_eq!(image.blob_name, "boot.jpg");
        assert_eq!(image.description, "boot");

        let json = serde_json::to_value(image.record(None)).unwrap();
        assert!(json["image_vector"].is_null());
        assert_eq!(json["description"], "boot");
        assert_eq!(json["id"], ImageRecord::id_for("boot.jpg").as_str());
    }

    #[test]
    fn list_images_walks_subdirectories() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("summer")).unwrap();
        std::fs::write(tmp.path().join("b.jpg"), b"b").unwrap();
        std::fs::write(tmp.path().join("summer").join("a.jpg"), b"a").unwrap();

        let images = list_images(tmp.path()).unwrap();
        let names: Vec<&str> = images.iter().map(|i| i.blob_name.as_str()).collect();
        assert_eq!(names, vec!["b.jpg", "a.jpg"]);
    }

    #[test]
    fn list_images_requires_directory() {
        assert!(list_images(Path::new("/definitely/not/here")).is_err());
    }
}
