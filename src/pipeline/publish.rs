// src/pipeline/publish.rs

//! Publisher loop: post the first fresh meme that goes through.

use rand::Rng;

use crate::error::Result;
use crate::models::Meme;
use crate::pipeline::generator::MemeGenerator;
use crate::services::Publisher;
use crate::storage::DedupStore;

/// Result of one publisher loop.
#[derive(Debug, Default)]
pub struct PublishOutcome {
    /// The meme that was posted and recorded, if any
    pub posted: Option<Meme>,
    /// Post attempts made, including the successful one
    pub attempts: usize,
    /// Post attempts that failed
    pub failures: usize,
}

/// Pull memes from the generator until one posts successfully.
///
/// A successful post is recorded in the dedup store and ends the loop. A
/// failed post is logged and the next candidate is tried; that candidate is
/// not recorded and stays eligible for later runs. The loop ends with
/// nothing posted once the generator is exhausted.
pub async fn post_first_fresh<R: Rng>(
    generator: &mut MemeGenerator<'_, R>,
    publisher: &dyn Publisher,
    store: &dyn DedupStore,
) -> Result<PublishOutcome> {
    let mut outcome = PublishOutcome::default();

    while let Some(meme) = generator.next().await? {
        let content = meme.format_or_fallback();
        outcome.attempts += 1;
        log::info!("Posting {} meme {}", meme.kind.name(), meme);

        match publisher.post(&content).await {
            Ok(()) => {
                store.record(&meme).await?;
                log::info!("Posted {} after {} attempt(s)", meme, outcome.attempts);
                outcome.posted = Some(meme);
                return Ok(outcome);
            }
            Err(e) => {
                outcome.failures += 1;
                log::error!("Failed to post {}: {}", meme, e);
            }
        }
    }

    log::warn!(
        "Ran out of fresh memes after {} attempt(s), nothing posted",
        outcome.attempts
    );
    Ok(outcome)
}
