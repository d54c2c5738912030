// src/error.rs

//! Unified error handling for the bot.

use std::fmt;

use thiserror::Error;

/// Result type alias for bot operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Dedup database error
    #[cfg(feature = "mysql")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// External API answered with a non-success status
    #[error("{service} API error (status {status}): {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Meme needs image-host enrichment before it can be formatted
    #[error("Meme must be digested before formatting: {link}")]
    NotDigested { link: String },

    /// Image-host response could not be turned into a digest
    #[error("Digest error for {link}: {message}")]
    Digest { link: String, message: String },

    /// Posting service rejected the post
    #[error("Publish error (status {status}): {message}")]
    Publish { status: u16, message: String },
}

impl AppError {
    /// Create an API status error.
    pub fn api(service: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a digest error for a link.
    pub fn digest(link: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Digest {
            link: link.into(),
            message: message.to_string(),
        }
    }

    /// Create a publish error.
    pub fn publish(status: u16, message: impl fmt::Display) -> Self {
        Self::Publish {
            status,
            message: message.to_string(),
        }
    }

    /// Whether this error is a transport or API failure worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. })
    }
}
