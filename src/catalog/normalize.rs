//! In-place conversion of WebP catalog images to JPEG.

use anyhow::{Context, Result};
use image::ImageFormat;
use std::path::{Path, PathBuf};

const LEGACY_EXTENSION: &str = "webp";
const TARGET_EXTENSION: &str = "jpg";

/// Outcome of a normalization pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeReport {
    pub converted: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

fn is_legacy(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(LEGACY_EXTENSION))
}

/// Convert every `.webp` file directly inside `dir` to a `.jpg` with the same stem and
/// delete the original. Files whose `.jpg` counterpart already exists are left alone.
///
/// A file that fails to decode aborts the pass.
pub fn normalize_directory(dir: &Path) -> Result<NormalizeReport> {
    let mut sources: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read image directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_legacy(path))
        .collect();
    sources.sort();

    let mut report = NormalizeReport::default();
    for source in sources {
        let target = source.with_extension(TARGET_EXTENSION);

        if target.exists() {
            tracing::info!(
                source = %source.display(),
                target = %target.display(),
                "skipping, converted file already exists"
            );
            report.skipped.push(source);
            continue;
        }

        convert(&source, &target)?;
        std::fs::remove_file(&source)
            .with_context(|| format!("failed to remove {}", source.display()))?;

        tracing::info!(source = %source.display(), target = %target.display(), "converted");
        report.converted.push(target);
    }

    Ok(report)
}

fn convert(source: &Path, target: &Path) -> Result<()> {
    let img = image::open(source)
        .with_context(|| format!("failed to decode {}", source.display()))?;
    img.into_rgb8()
        .save_with_format(target, ImageFormat::Jpeg)
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(())
}
