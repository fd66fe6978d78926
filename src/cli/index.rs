//! CLI `create-index`, `index-stats` and `index-status` commands.

use anyhow::Result;

use crate::config::LookbookConfig;
use crate::search::schema::IndexSchema;

/// Create the product index, or replace its definition.
pub async fn create_index(config: &LookbookConfig) -> Result<()> {
    let client = super::search_client(config)?;
    let schema = IndexSchema::product_images(
        client.index_name(),
        config.embedding.dimensions,
        &config.search.vector_profile,
        &config.search.vector_algorithm,
    );

    let name = client.create_or_update_index(&schema).await?;
    tracing::info!(index = %name, "index created");
    println!("Created index {name}");
    Ok(())
}

pub async fn index_stats(config: &LookbookConfig) -> Result<()> {
    let client = super::search_client(config)?;
    let stats = client.stats().await?;

    println!("Index Statistics: {}", client.index_name());
    println!("{}", "=".repeat(40));
    println!("  Documents:           {}", stats.document_count);
    println!("  Storage size:        {} bytes", stats.storage_size);
    println!("  Vector index size:   {} bytes", stats.vector_index_size);
    Ok(())
}

/// Print the index definition as the service reports it.
pub async fn index_status(config: &LookbookConfig) -> Result<()> {
    let client = super::search_client(config)?;
    let definition = client.definition().await?;
    println!("{}", serde_json::to_string_pretty(&definition)?);
    Ok(())
}
