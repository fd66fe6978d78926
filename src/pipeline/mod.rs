//! Batch steps of the indexing run: upload → embed → publish.
//!
//! Each step tolerates per-item failures (logged and counted) and is safe to re-run.

pub mod embed;
pub mod publish;
pub mod upload;

pub use embed::{embed_catalog, EmbedOptions, EmbedReport};
pub use publish::{publish_records, PublishReport};
pub use upload::{upload_directory, UploadReport};
