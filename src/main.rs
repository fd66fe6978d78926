use anyhow::Result;
use clap::{Parser, Subcommand};
use std::num::NonZeroUsize;
use tracing_subscriber::EnvFilter;

use lookbook::cli;
use lookbook::config::LookbookConfig;

#[derive(Parser)]
#[command(name = "lookbook", version, about = "Index product images and search them by prompt")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert WebP images in the image directory to JPEG
    Convert,
    /// Upload images that are not in blob storage yet
    Upload,
    /// Generate embeddings for every image into the record file
    Embed,
    /// Upload the record file to the search index
    Publish,
    /// Upload, embed and publish in one run
    Ingest,
    /// Create or update the search index schema
    CreateIndex,
    /// Find products matching a text prompt
    Search {
        prompt: String,
        /// Vector candidates to consider (defaults to search.default_top_n)
        #[arg(long)]
        top_n: Option<NonZeroUsize>,
    },
    /// Translate text with the completion service
    Translate {
        text: String,
        /// Target language, e.g. "English"
        #[arg(long)]
        lang: String,
    },
    /// Show search index statistics
    IndexStats,
    /// Show the search index definition
    IndexStatus,
    /// Report which settings are configured
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = LookbookConfig::load()?;

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Convert => cli::convert::convert(&config)?,
        Command::Upload => cli::ingest::upload(&config).await?,
        Command::Embed => cli::ingest::embed(&config).await?,
        Command::Publish => cli::ingest::publish(&config).await?,
        Command::Ingest => cli::ingest::ingest(&config).await?,
        Command::CreateIndex => cli::index::create_index(&config).await?,
        Command::Search { prompt, top_n } => {
            cli::search::search(&config, &prompt, top_n.map(NonZeroUsize::get)).await?
        }
        Command::Translate { text, lang } => cli::translate::translate(&config, &text, &lang).await?,
        Command::IndexStats => cli::index::index_stats(&config).await?,
        Command::IndexStatus => cli::index::index_status(&config).await?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
