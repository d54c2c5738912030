// src/pipeline/batch.rs

//! Batch mode: post up to `max_memes` fresh memes in one go.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::Result;
use crate::models::Meme;
use crate::services::{ImageHost, MemeSource, Publisher};
use crate::storage::DedupStore;

/// Result of one batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Fresh memes found across all subreddits
    pub candidates: usize,
    /// Memes posted and recorded
    pub posted: Vec<Meme>,
    /// Memes whose post failed
    pub failed: Vec<Meme>,
}

/// Everything batch mode needs to talk to.
pub struct BatchContext<'a> {
    pub source: &'a dyn MemeSource,
    pub store: &'a dyn DedupStore,
    pub host: &'a dyn ImageHost,
    pub publisher: &'a dyn Publisher,
}

/// Fetch every subreddit, then post a random selection of fresh memes.
///
/// Each success is recorded right away. A failed post is logged and the
/// batch moves on to the next meme.
pub async fn run_batch<R: Rng>(
    subreddits: &[String],
    ctx: &BatchContext<'_>,
    max_memes: usize,
    rng: &mut R,
) -> Result<BatchOutcome> {
    let mut fresh = Vec::new();
    for subreddit in subreddits {
        for meme in ctx.source.fetch_hot(subreddit).await? {
            if fresh.contains(&meme) || ctx.store.exists(&meme).await? {
                continue;
            }
            fresh.push(meme);
        }
    }

    let mut outcome = BatchOutcome {
        candidates: fresh.len(),
        ..Default::default()
    };
    log::info!(
        "Found {} fresh memes across {} subreddits, posting up to {}",
        fresh.len(),
        subreddits.len(),
        max_memes
    );

    fresh.shuffle(rng);
    fresh.truncate(max_memes);

    for mut meme in fresh {
        if let Err(e) = meme.digest(ctx.host).await {
            log::error!("Caught error while digesting meme {}: {}", meme, e);
        }

        let content = meme.format_or_fallback();
        match ctx.publisher.post(&content).await {
            Ok(()) => {
                ctx.store.record(&meme).await?;
                log::info!("Posted {}", meme);
                outcome.posted.push(meme);
            }
            Err(e) => {
                log::error!("Failed to post {}: {}", meme, e);
                outcome.failed.push(meme);
            }
        }
    }

    Ok(outcome)
}
