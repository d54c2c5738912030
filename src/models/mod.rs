// src/models/mod.rs

//! Domain models for the bot.

mod config;
mod meme;

// Re-export all public types
pub use config::{
    Config, CrashReportingConfig, DatabaseConfig, HttpConfig, ImgurConfig, PostingConfig,
    RedditConfig, StorageBackend, StorageConfig, TwitterConfig, parse_subreddits,
};
pub use meme::{ImageDigest, Meme, MemeKind, PostContent};
