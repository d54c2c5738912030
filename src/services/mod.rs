//! Service layer for the bot.
//!
//! This module contains the clients for the external APIs:
//! - Subreddit listings (`RedditClient`, behind `MemeSource`)
//! - Image-host enrichment (`ImgurClient`, behind `ImageHost`)
//! - Posting (`TwitterClient`, behind `Publisher`)
//! - Crash reporting (`CrashReporter`)

pub mod classifier;
mod crash;
mod imgur;
mod reddit;
mod twitter;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ImageDigest, Meme, PostContent};

pub use crash::CrashReporter;
pub use imgur::ImgurClient;
pub use reddit::RedditClient;
pub use twitter::TwitterClient;

/// A source of meme listings, one subreddit at a time.
#[async_trait]
pub trait MemeSource: Send + Sync {
    /// Fetch the hot listing of a subreddit.
    ///
    /// Transient failures that survive retrying yield an empty listing.
    async fn fetch_hot(&self, subreddit: &str) -> Result<Vec<Meme>>;
}

/// Image-host API used to digest container and ambiguous links.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn image(&self, id: &str) -> Result<ImageDigest>;
    async fn album(&self, id: &str) -> Result<ImageDigest>;
    async fn gallery_item(&self, id: &str) -> Result<ImageDigest>;
}

/// Social-media posting API.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn post(&self, content: &PostContent) -> Result<()>;
}
