//! In-memory collaborators for pipeline and model tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{ImageDigest, Meme, PostContent};
use crate::services::{ImageHost, MemeSource, Publisher};
use crate::storage::DedupStore;

/// Listing source backed by a map of subreddit to memes.
///
/// Unknown subreddits return an empty listing.
#[derive(Default)]
pub struct FakeSource {
    listings: HashMap<String, Vec<Meme>>,
    fetches: AtomicUsize,
}

impl FakeSource {
    pub fn with(mut self, subreddit: &str, memes: Vec<Meme>) -> Self {
        self.listings.insert(subreddit.to_string(), memes);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MemeSource for FakeSource {
    async fn fetch_hot(&self, subreddit: &str) -> Result<Vec<Meme>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.listings.get(subreddit).cloned().unwrap_or_default())
    }
}

/// Image host answering from fixed tables; unknown ids fail to digest.
#[derive(Default)]
pub struct FakeImageHost {
    images: HashMap<String, ImageDigest>,
    albums: HashMap<String, ImageDigest>,
    galleries: HashMap<String, ImageDigest>,
    calls: AtomicUsize,
}

impl FakeImageHost {
    pub fn with_image(mut self, id: &str, digest: ImageDigest) -> Self {
        self.images.insert(id.to_string(), digest);
        self
    }

    pub fn with_album(mut self, id: &str, digest: ImageDigest) -> Self {
        self.albums.insert(id.to_string(), digest);
        self
    }

    pub fn with_gallery(mut self, id: &str, digest: ImageDigest) -> Self {
        self.galleries.insert(id.to_string(), digest);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, table: &HashMap<String, ImageDigest>, id: &str) -> Result<ImageDigest> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        table
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::digest(id, "not found"))
    }
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn image(&self, id: &str) -> Result<ImageDigest> {
        self.lookup(&self.images, id)
    }

    async fn album(&self, id: &str) -> Result<ImageDigest> {
        self.lookup(&self.albums, id)
    }

    async fn gallery_item(&self, id: &str) -> Result<ImageDigest> {
        self.lookup(&self.galleries, id)
    }
}

/// Dedup store holding links in memory.
#[derive(Default)]
pub struct MemoryStore {
    links: Mutex<Vec<String>>,
    recorded: Mutex<Vec<Meme>>,
}

impl MemoryStore {
    pub fn with_links(links: &[&str]) -> Self {
        Self {
            links: Mutex::new(links.iter().map(|l| l.to_string()).collect()),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Memes recorded through [`DedupStore::record`].
    pub fn recorded(&self) -> Vec<Meme> {
        self.recorded.lock().unwrap().clone()
    }
}

#[async_trait]
impl DedupStore for MemoryStore {
    async fn exists(&self, meme: &Meme) -> Result<bool> {
        Ok(self.links.lock().unwrap().contains(&meme.link))
    }

    async fn record(&self, meme: &Meme) -> Result<()> {
        self.links.lock().unwrap().push(meme.link.clone());
        self.recorded.lock().unwrap().push(meme.clone());
        Ok(())
    }
}

/// Publisher replaying scripted results, succeeding once the script runs out.
#[derive(Default)]
pub struct FakePublisher {
    script: Mutex<VecDeque<Result<()>>>,
    posted: Mutex<Vec<PostContent>>,
}

impl FakePublisher {
    pub fn scripted(results: Vec<Result<()>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            posted: Mutex::new(Vec::new()),
        }
    }

    /// Every post attempt, successful or not.
    pub fn attempts(&self) -> Vec<PostContent> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn post(&self, content: &PostContent) -> Result<()> {
        self.posted.lock().unwrap().push(content.clone());
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}
