//! CLI `upload`, `embed`, `publish` and `ingest` commands.

use anyhow::Result;

use crate::catalog::list_images;
use crate::catalog::records::RecordWriter;
use crate::config::LookbookConfig;
use crate::pipeline::{self, EmbedOptions};

/// Upload images the blob store does not have yet.
pub async fn upload(config: &LookbookConfig) -> Result<()> {
    let store = super::blob_store(config)?;
    let report = pipeline::upload_directory(&store, &config.image_dir()).await?;

    println!(
        "Upload complete: {} uploaded, {} already present, {} failed, {} duplicate name(s)",
        report.uploaded, report.skipped, report.failed, report.duplicates
    );
    Ok(())
}

/// Embed every catalog image into the record file.
pub async fn embed(config: &LookbookConfig) -> Result<()> {
    let embedder = super::vision_embedder(config)?;
    let images = list_images(&config.image_dir())?;
    let mut writer = RecordWriter::create(config.records_path())?;

    println!("Embedding {} image(s)...", images.len());
    let report = pipeline::embed_catalog(
        &embedder,
        &images,
        &mut writer,
        &EmbedOptions::from(&config.embedding),
    )
    .await?;

    println!(
        "Embeddings written to {}: {} embedded, {} failed, {} duplicate name(s)",
        writer.path().display(),
        report.embedded,
        report.failed,
        report.duplicates
    );
    Ok(())
}

/// Upload the record file to the search index.
pub async fn publish(config: &LookbookConfig) -> Result<()> {
    let index = super::search_client(config)?;
    let report = pipeline::publish_records(&index, &config.records_path()).await?;

    println!(
        "Indexed into {}: {} succeeded, {} failed",
        index.index_name(),
        report.succeeded,
        report.failed
    );
    Ok(())
}

/// upload → embed → publish. Clients are built up front so a missing setting fails
/// before any work is done.
pub async fn ingest(config: &LookbookConfig) -> Result<()> {
    super::blob_store(config)?;
    super::vision_embedder(config)?;
    super::search_client(config)?;

    upload(config).await?;
    embed(config).await?;
    publish(config).await
}
