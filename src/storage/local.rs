//! Local filesystem dedup store.
//!
//! Keeps every posted meme in a single JSON ledger file. The ledger is read
//! on every operation and rewritten atomically on every insert, so separate
//! runs always see each other's records.
//!
//! ## Ledger Layout
//!
//! ```text
//! [
//!   { "link": "https://i.imgur.com/abc123.jpg",
//!     "source": "pics",
//!     "created_at": "2026-01-01T12:00:00Z" }
//! ]
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Meme;
use crate::storage::{DedupRecord, DedupStore, is_storable};

/// JSON-file backed dedup store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a store backed by the given ledger file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write the ledger atomically (write to temp, then rename).
    async fn write_records(&self, records: &[DedupRecord]) -> Result<()> {
        self.ensure_dir().await?;
        let bytes = serde_json::to_vec_pretty(records)?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read the ledger, empty if the file doesn't exist yet.
    pub async fn load_records(&self) -> Result<Vec<DedupRecord>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl DedupStore for LocalStorage {
    async fn exists(&self, meme: &Meme) -> Result<bool> {
        if !is_storable(&meme.link) {
            log::warn!("Bad character in meme: {}", meme);
            return Ok(true);
        }
        let records = self.load_records().await?;
        Ok(records.iter().any(|r| r.link == meme.link))
    }

    async fn record(&self, meme: &Meme) -> Result<()> {
        let mut records = self.load_records().await?;
        if records.iter().any(|r| r.link == meme.link) {
            log::warn!("Meme already recorded, skipping insert: {}", meme);
            return Ok(());
        }

        records.push(DedupRecord::new(meme));
        self.write_records(&records).await?;
        log::debug!("Recorded meme {} ({} total)", meme, records.len());
        Ok(())
    }
}
