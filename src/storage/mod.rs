//! Dedup store for already-posted memes.
//!
//! Every successfully posted meme leaves one record behind. Records are
//! append-only: they are never updated or deleted, so a link found in the
//! store is never offered again.

pub mod local;
#[cfg(feature = "mysql")]
pub mod mysql;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Meme;

// Re-export for convenience
pub use local::LocalStorage;
#[cfg(feature = "mysql")]
pub use mysql::MySqlStore;

/// One posted meme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupRecord {
    pub link: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl DedupRecord {
    pub fn new(meme: &Meme) -> Self {
        Self {
            link: meme.link.clone(),
            source: meme.source.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Trait for dedup store backends.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Whether a meme with the same link was already posted.
    ///
    /// Links the backend cannot store are reported as existing.
    async fn exists(&self, meme: &Meme) -> Result<bool>;

    /// Record a posted meme.
    async fn record(&self, meme: &Meme) -> Result<()>;
}

/// Whether a link can be written safely by every backend.
///
/// Legacy MySQL `utf8` columns hold only the Basic Multilingual Plane, so
/// astral characters (emoji and friends) are rejected along with control
/// characters and empty links.
pub fn is_storable(link: &str) -> bool {
    !link.is_empty() && link.chars().all(|c| !c.is_control() && (c as u32) <= 0xFFFF)
}
