use anyhow::Result;

use crate::catalog::normalize::normalize_directory;
use crate::config::LookbookConfig;

/// Convert WebP images in the image directory to JPEG.
pub fn convert(config: &LookbookConfig) -> Result<()> {
    let dir = config.image_dir();
    let report = normalize_directory(&dir)?;

    println!(
        "Converted {} image(s), skipped {} in {}",
        report.converted.len(),
        report.skipped.len(),
        dir.display()
    );
    Ok(())
}
