//! Line-delimited JSON record file shared by the embedding and publishing steps.
//!
//! The writer flushes after every record, so an interrupted batch leaves a readable
//! prefix of complete lines.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::ImageRecord;

pub struct RecordWriter {
    path: PathBuf,
    out: BufWriter<File>,
    written: usize,
}

impl RecordWriter {
    /// Create (or truncate) the record file, creating parent directories as needed.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("failed to create record file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append one record as a single JSON line and flush it.
    pub fn write(&mut self, record: &ImageRecord) -> Result<()> {
        serde_json::to_writer(&mut self.out, record).context("failed to serialize record")?;
        self.out.write_all(b"\n")?;
        self.out
            .flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every non-blank line of a record file.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<ImageRecord>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open record file {}", path.display()))?;

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: ImageRecord = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: malformed record", path.display(), idx + 1))?;
        records.push(record);
    }
    Ok(records)
}
