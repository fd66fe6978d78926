use anyhow::Result;
use std::time::Duration;

use crate::config::LookbookConfig;
use crate::search::prompt::PromptSearch;

/// Run a prompt search and print the results as JSON on stdout.
pub async fn search(config: &LookbookConfig, prompt: &str, top_n: Option<usize>) -> Result<()> {
    let embedder = super::vision_embedder(config)?;
    let index = super::search_client(config)?;
    let blobs = super::blob_store(config)?;

    let search = PromptSearch::new(
        &embedder,
        &index,
        &blobs,
        config.search.result_top,
        Duration::from_secs(config.blob.sas_expiry_secs),
    );
    let top_n = top_n.unwrap_or(config.search.default_top_n);
    let results = search.search(prompt, top_n).await?;

    if results.is_empty() {
        eprintln!("No results found.");
    }
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
