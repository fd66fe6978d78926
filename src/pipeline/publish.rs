use anyhow::Result;
use std::path::Path;

use crate::catalog::records::read_records;
use crate::search::SearchIndexClient;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Upload every record in the record file to the index and log each document's status.
/// Documents the service rejects are counted, not raised.
pub async fn publish_records(
    index: &SearchIndexClient,
    records_path: &Path,
) -> Result<PublishReport> {
    let records = read_records(records_path)?;
    tracing::info!(
        documents = records.len(),
        index = index.index_name(),
        "uploading documents"
    );

    let results = index.upload_documents(&records).await?;

    let mut report = PublishReport::default();
    for result in &results {
        if result.status {
            tracing::info!(key = %result.key, status_code = result.status_code, "indexed");
            report.succeeded += 1;
        } else {
            tracing::warn!(
                key = %result.key,
                status_code = result.status_code,
                error = result.error_message.as_deref().unwrap_or(""),
                "document rejected"
            );
            report.failed += 1;
        }
    }
    Ok(report)
}
