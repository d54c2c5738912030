// src/pipeline/generator.rs

//! Meme generator.
//!
//! Lazily pulls memes from the configured subreddits, one at a time, in a
//! random order that is fair across subreddits. A subreddit's listing is
//! fetched the first time it is picked; every meme in it is then tried at
//! most once per run.
//!
//! ## Tracking Table
//!
//! ```text
//! subreddit ─┬─ None                      not fetched yet
//!            └─ Some([meme → status])     status: untried | InDatabase | Offered
//! ```
//!
//! A subreddit is exhausted once fetched and every meme has a status. The
//! generator is done when all subreddits are exhausted. Every call to
//! [`MemeGenerator::next`] either fetches a subreddit or moves one meme out
//! of the untried state, so a run over finite listings always terminates.

use std::collections::HashSet;

use rand::Rng;

use crate::error::Result;
use crate::models::Meme;
use crate::services::{ImageHost, MemeSource};
use crate::storage::DedupStore;

/// What happened to a tracked meme during this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemeStatus {
    /// Already posted in an earlier run
    InDatabase,
    /// Handed to the consumer, whatever the consumer did with it
    Offered,
}

#[derive(Debug)]
struct TrackedMeme {
    meme: Meme,
    status: Option<MemeStatus>,
}

#[derive(Debug)]
struct SubredditEntry {
    name: String,
    memes: Option<Vec<TrackedMeme>>,
}

impl SubredditEntry {
    fn is_exhausted(&self) -> bool {
        self.memes
            .as_ref()
            .is_some_and(|memes| memes.iter().all(|t| t.status.is_some()))
    }

    fn untried(&self) -> Vec<usize> {
        self.memes
            .iter()
            .flatten()
            .enumerate()
            .filter(|(_, t)| t.status.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    fn count(&self, status: Option<MemeStatus>) -> usize {
        self.memes
            .iter()
            .flatten()
            .filter(|t| t.status == status)
            .count()
    }
}

/// Per-subreddit counts at the end of (or during) a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubredditSummary {
    pub name: String,
    pub fetched: bool,
    pub total: usize,
    pub in_database: usize,
    pub offered: usize,
}

/// Pull-based generator of fresh memes.
pub struct MemeGenerator<'a, R> {
    source: &'a dyn MemeSource,
    store: &'a dyn DedupStore,
    host: &'a dyn ImageHost,
    entries: Vec<SubredditEntry>,
    rng: R,
}

impl<'a, R: Rng> MemeGenerator<'a, R> {
    /// Create a generator over the given subreddits. Nothing is fetched yet.
    pub fn new(
        subreddits: &[String],
        source: &'a dyn MemeSource,
        store: &'a dyn DedupStore,
        host: &'a dyn ImageHost,
        rng: R,
    ) -> Self {
        let mut seen = HashSet::new();
        let entries = subreddits
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .map(|name| SubredditEntry {
                name: name.clone(),
                memes: None,
            })
            .collect();

        Self {
            source,
            store,
            host,
            entries,
            rng,
        }
    }

    /// Whether every subreddit has been fetched and every meme tried.
    pub fn is_done(&self) -> bool {
        self.entries.iter().all(SubredditEntry::is_exhausted)
    }

    /// Produce the next fresh meme, or `None` once everything was tried.
    ///
    /// The meme is digested when possible; a failed digest is logged and the
    /// meme is still returned. A returned meme is never offered again during
    /// this generator's lifetime.
    pub async fn next(&mut self) -> Result<Option<Meme>> {
        loop {
            let pending: Vec<usize> = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| !e.is_exhausted())
                .map(|(i, _)| i)
                .collect();
            if pending.is_empty() {
                return Ok(None);
            }

            let index = pending[self.rng.random_range(0..pending.len())];
            if self.entries[index].memes.is_none() {
                let name = self.entries[index].name.clone();
                let tracked = self.load_subreddit(&name).await?;
                self.entries[index].memes = Some(tracked);
            }

            let entry = &mut self.entries[index];
            let untried = entry.untried();
            if untried.is_empty() {
                log::debug!("Subreddit r/{} has nothing left to offer", entry.name);
                continue;
            }
            let pick = untried[self.rng.random_range(0..untried.len())];

            let Some(tracked) = entry.memes.as_mut().and_then(|m| m.get_mut(pick)) else {
                continue;
            };
            if let Err(e) = tracked.meme.digest(self.host).await {
                log::error!("Caught error while digesting meme {}: {}", tracked.meme, e);
            }
            tracked.status = Some(MemeStatus::Offered);
            return Ok(Some(tracked.meme.clone()));
        }
    }

    /// Fetch a listing and mark memes that are already in the dedup store.
    async fn load_subreddit(&self, name: &str) -> Result<Vec<TrackedMeme>> {
        let memes = self.source.fetch_hot(name).await?;

        let mut seen = HashSet::new();
        let mut tracked = Vec::with_capacity(memes.len());
        for meme in memes {
            if !seen.insert((meme.link.clone(), meme.source.clone())) {
                continue;
            }
            let status = if self.store.exists(&meme).await? {
                Some(MemeStatus::InDatabase)
            } else {
                None
            };
            tracked.push(TrackedMeme { meme, status });
        }

        let known = tracked.iter().filter(|t| t.status.is_some()).count();
        log::info!(
            "Loaded r/{}: {} memes, {} already posted",
            name,
            tracked.len(),
            known
        );
        Ok(tracked)
    }

    /// Snapshot of the tracking table.
    pub fn summary(&self) -> Vec<SubredditSummary> {
        self.entries
            .iter()
            .map(|e| SubredditSummary {
                name: e.name.clone(),
                fetched: e.memes.is_some(),
                total: e.memes.as_ref().map_or(0, Vec::len),
                in_database: e.count(Some(MemeStatus::InDatabase)),
                offered: e.count(Some(MemeStatus::Offered)),
            })
            .collect()
    }
}
