//! Pipeline entry points for one bot run.
//!
//! - `post_first_fresh`: post the first fresh meme the generator offers
//! - `run_batch`: post up to `max_memes` fresh memes
//! - `run_cycle`: wire the real clients from config and run one mode

pub mod batch;
pub mod generator;
pub mod publish;
#[cfg(test)]
pub(crate) mod testing;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::Result;
use crate::models::{Config, StorageBackend};
use crate::services::{ImgurClient, RedditClient, TwitterClient};
use crate::storage::{DedupStore, LocalStorage};
use crate::utils::http;

pub use batch::{BatchContext, BatchOutcome, run_batch};
pub use generator::{MemeGenerator, MemeStatus, SubredditSummary};
pub use publish::{PublishOutcome, post_first_fresh};

/// Which posting strategy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Post the first fresh meme that goes through
    #[default]
    Generator,
    /// Post up to `posting.max_memes` fresh memes
    Batch,
}

/// Open the dedup store selected in the config.
pub async fn open_store(config: &Config) -> Result<Box<dyn DedupStore>> {
    match config.storage.backend {
        StorageBackend::Local => {
            log::info!("Using local dedup ledger at {}", config.storage.local_path);
            Ok(Box::new(LocalStorage::new(&config.storage.local_path)))
        }
        #[cfg(feature = "mysql")]
        StorageBackend::Mysql => {
            log::info!(
                "Using MySQL dedup store at {}:{}/{}",
                config.mysql.host,
                config.mysql.port,
                config.mysql.database
            );
            let store = crate::storage::MySqlStore::connect_lazy(&config.mysql);
            store.ensure_schema().await?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "mysql"))]
        StorageBackend::Mysql => Err(crate::error::AppError::config(
            "storage.backend = \"mysql\" needs the `mysql` feature",
        )),
    }
}

/// Run one full cycle with the real clients.
pub async fn run_cycle(config: &Config, mode: RunMode) -> Result<()> {
    config.validate()?;

    let client = http::create_client(&config.http)?;
    let source = RedditClient::new(client.clone(), &config.reddit);
    let host = ImgurClient::new(client.clone(), config.imgur.clone());
    let publisher = TwitterClient::new(client, config.twitter.clone());
    let store = open_store(config).await?;
    let subreddits = &config.reddit.subreddits;

    log::info!(
        "Starting {:?} run over {} subreddits: {}",
        mode,
        subreddits.len(),
        subreddits.join(", ")
    );

    match mode {
        RunMode::Generator => {
            let mut generator = MemeGenerator::new(
                subreddits,
                &source,
                store.as_ref(),
                &host,
                StdRng::from_os_rng(),
            );
            let outcome = post_first_fresh(&mut generator, &publisher, store.as_ref()).await?;

            for s in generator.summary().iter().filter(|s| s.fetched) {
                log::debug!(
                    "r/{}: {} memes, {} already posted, {} offered",
                    s.name,
                    s.total,
                    s.in_database,
                    s.offered
                );
            }
            match outcome.posted {
                Some(meme) => log::info!("Run complete, posted {}", meme),
                None => log::info!(
                    "Run complete, nothing posted ({} failed attempts)",
                    outcome.failures
                ),
            }
        }
        RunMode::Batch => {
            let ctx = BatchContext {
                source: &source,
                store: store.as_ref(),
                host: &host,
                publisher: &publisher,
            };
            let mut rng = StdRng::from_os_rng();
            let outcome =
                run_batch(subreddits, &ctx, config.posting.max_memes, &mut rng).await?;
            log::info!(
                "Batch complete: {} posted, {} failed, {} candidates",
                outcome.posted.len(),
                outcome.failed.len(),
                outcome.candidates
            );
        }
    }
    Ok(())
}
