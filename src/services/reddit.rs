// src/services/reddit.rs

//! Subreddit listing client.
//!
//! Fetches the public `hot.json` listing of a subreddit and turns each post
//! into a [`Meme`]. Self posts become text memes; link posts are classified.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::Result;
use crate::models::{Meme, RedditConfig};
use crate::services::MemeSource;
use crate::utils::http::ensure_success;
use crate::utils::{RetryPolicy, retry};

const BASE_URL: &str = "https://www.reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    over_18: bool,
    #[serde(default)]
    is_self: bool,
}

/// Client for subreddit hot listings with bounded retry.
pub struct RedditClient {
    client: Client,
    base_url: String,
    include_nsfw: bool,
    listing_limit: u32,
    retry_policy: RetryPolicy,
}

impl RedditClient {
    /// Create a new client from the listing settings.
    pub fn new(client: Client, config: &RedditConfig) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
            include_nsfw: config.include_nsfw,
            listing_limit: config.listing_limit,
            retry_policy: RetryPolicy::new(
                config.max_attempts,
                Duration::from_secs(config.retry_wait_secs),
            ),
        }
    }

    fn listing_url(&self, subreddit: &str) -> Result<Url> {
        let url = Url::parse_with_params(
            &format!("{}/r/{}/hot.json", self.base_url, subreddit),
            &[
                ("limit", self.listing_limit.to_string()),
                ("raw_json", "1".to_string()),
            ],
        )?;
        Ok(url)
    }

    async fn fetch_listing(&self, subreddit: &str) -> Result<Vec<Meme>> {
        let url = self.listing_url(subreddit)?;
        let response = self.client.get(url).send().await?;
        let body = ensure_success("reddit", response).await?.text().await?;
        parse_listing(&body, subreddit, self.include_nsfw)
    }
}

#[async_trait]
impl MemeSource for RedditClient {
    async fn fetch_hot(&self, subreddit: &str) -> Result<Vec<Meme>> {
        log::debug!("Collecting memes from subreddit: {}", subreddit);

        let label = format!("r/{subreddit} listing");
        match retry(&self.retry_policy, &label, || self.fetch_listing(subreddit)).await {
            Ok(memes) => {
                log::info!("Fetched {} memes from r/{}", memes.len(), subreddit);
                Ok(memes)
            }
            Err(e) if e.is_transient() => {
                log::error!(
                    "API failed to get memes for subreddit {}: {}. Skipping it this run",
                    subreddit,
                    e
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

/// Turn a listing body into memes, dropping adult posts unless allowed.
fn parse_listing(body: &str, subreddit: &str, include_nsfw: bool) -> Result<Vec<Meme>> {
    let listing: Listing = serde_json::from_str(body)?;

    let memes = listing
        .data
        .children
        .into_iter()
        .map(|child| child.data)
        .filter(|post| include_nsfw || !post.over_18)
        .filter_map(|post| {
            let permalink = format!("{}{}", BASE_URL, post.permalink);
            if post.is_self {
                let body = post.title.trim();
                if body.is_empty() {
                    return None;
                }
                return Some(Meme::text(body, permalink, subreddit));
            }
            post.url
                .filter(|url| !url.is_empty())
                .map(|url| Meme::new(url, subreddit))
        })
        .collect();
    Ok(memes)
}
