//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Shared HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Subreddit listing settings
    #[serde(default)]
    pub reddit: RedditConfig,

    /// Twitter API credentials
    #[serde(default)]
    pub twitter: TwitterConfig,

    /// Imgur API credentials
    #[serde(default)]
    pub imgur: ImgurConfig,

    /// Dedup store selection
    #[serde(default)]
    pub storage: StorageConfig,

    /// MySQL connection settings
    #[serde(default)]
    pub mysql: DatabaseConfig,

    /// Legacy batch posting settings
    #[serde(default)]
    pub posting: PostingConfig,

    /// Optional crash reporting endpoint
    #[serde(default)]
    pub crash_reporting: Option<CrashReportingConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.reddit.subreddits.is_empty() {
            return Err(AppError::validation("No subreddits defined"));
        }
        if self.reddit.max_attempts == 0 {
            return Err(AppError::validation("reddit.max_attempts must be > 0"));
        }
        if self.posting.max_memes == 0 {
            return Err(AppError::validation("posting.max_memes must be > 0"));
        }

        let secrets = [
            ("twitter.consumer_key", &self.twitter.consumer_key),
            ("twitter.consumer_secret", &self.twitter.consumer_secret),
            ("twitter.access_token_key", &self.twitter.access_token_key),
            ("twitter.access_token_secret", &self.twitter.access_token_secret),
            ("imgur.client_id", &self.imgur.client_id),
            ("imgur.client_secret", &self.imgur.client_secret),
        ];
        for (name, value) in secrets {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{name} is empty")));
            }
        }

        if self.storage.backend == StorageBackend::Mysql
            && (self.mysql.username.is_empty() || self.mysql.database.is_empty())
        {
            return Err(AppError::validation(
                "mysql.username and mysql.database are required for the mysql backend",
            ));
        }

        if let Some(crash) = &self.crash_reporting {
            url::Url::parse(&crash.endpoint).map_err(|e| {
                AppError::validation(format!("crash_reporting.endpoint is not a URL: {e}"))
            })?;
        }
        Ok(())
    }
}

/// HTTP client settings shared by every external API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Subreddit listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// Subreddits to pull from; either a list or one whitespace/comma separated string
    #[serde(
        default = "defaults::subreddits",
        deserialize_with = "deserialize_subreddits"
    )]
    pub subreddits: Vec<String>,

    /// Keep posts flagged over_18
    #[serde(default)]
    pub include_nsfw: bool,

    /// Posts requested per hot listing
    #[serde(default = "defaults::listing_limit")]
    pub listing_limit: u32,

    /// Attempts per listing fetch before giving up on a subreddit
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between fetch attempts
    #[serde(default = "defaults::retry_wait")]
    pub retry_wait_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            subreddits: defaults::subreddits(),
            include_nsfw: false,
            listing_limit: defaults::listing_limit(),
            max_attempts: defaults::max_attempts(),
            retry_wait_secs: defaults::retry_wait(),
        }
    }
}

/// Twitter OAuth 1.0a user credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitterConfig {
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: String,
    #[serde(default)]
    pub access_token_key: String,
    #[serde(default)]
    pub access_token_secret: String,
}

/// Imgur API application credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImgurConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

/// Which dedup store backs the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Mysql,
    Local,
}

/// Dedup store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Ledger file for the local backend
    #[serde(default = "defaults::local_path")]
    pub local_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_path: defaults::local_path(),
        }
    }
}

/// MySQL connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "defaults::mysql_host")]
    pub host: String,
    #[serde(default = "defaults::mysql_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: defaults::mysql_host(),
            port: defaults::mysql_port(),
            username: String::new(),
            password: String::new(),
            database: String::new(),
        }
    }
}

/// Legacy batch mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingConfig {
    /// Upper bound on memes posted by one batch run
    #[serde(default = "defaults::max_memes")]
    pub max_memes: usize,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            max_memes: defaults::max_memes(),
        }
    }
}

/// Crash reporting endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashReportingConfig {
    pub endpoint: String,
    pub key: String,
    pub secret: String,
}

/// Split a subreddit string on whitespace and commas.
pub fn parse_subreddits(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .map(|s| s.trim_start_matches("r/"))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn deserialize_subreddits<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        List(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => parse_subreddits(&text),
        Raw::List(items) => items.iter().flat_map(|s| parse_subreddits(s)).collect(),
    })
}

mod defaults {
    pub fn user_agent() -> String {
        format!("linux:chirp:{} (meme reposter)", env!("CARGO_PKG_VERSION"))
    }
    pub fn timeout() -> u64 {
        30
    }

    pub fn subreddits() -> Vec<String> {
        vec!["memes".into(), "dankmemes".into()]
    }
    pub fn listing_limit() -> u32 {
        25
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_wait() -> u64 {
        2
    }

    pub fn local_path() -> String {
        "data/posted.json".into()
    }

    pub fn mysql_host() -> String {
        "localhost".into()
    }
    pub fn mysql_port() -> u16 {
        3306
    }

    pub fn max_memes() -> usize {
        5
    }
}
