//! Product image search on managed cloud services.
//!
//! Lookbook indexes a local folder of product images so they can be found again by
//! free-text prompt. The heavy lifting happens in three external services:
//!
//! | Service | Used for |
//! |---------|----------|
//! | **Azure Blob Storage** | Holding the images, signing time-limited download links |
//! | **Azure AI Vision** | Image and text embeddings in one shared vector space |
//! | **Azure AI Search** | Hybrid (vector + keyword) search over the embeddings |
//!
//! # Pipeline
//!
//! `convert` → `upload` → `embed` → `publish`, then `search` on demand. The embed step
//! writes a line-delimited JSON record file that the publish step reads back, so either
//! side can be re-run alone.
//!
//! # Modules
//!
//! - [`config`]: Configuration from `.env`, a TOML file, and environment variables
//! - [`catalog`]: Local image listing, WebP → JPEG normalization, and the record file
//! - [`storage`]: Blob store trait, Azure Blob REST client, and SAS signing
//! - [`embedding`]: Vision embeddings with bounded, jittered retries
//! - [`search`]: Index schema, document upload, and prompt search
//! - [`pipeline`]: The batch steps that tie the above together
//! - [`translate`]: Prompt translation through a completions deployment

pub mod catalog;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod pipeline;
pub mod search;
pub mod storage;
pub mod translate;
