//! MySQL dedup store.
//!
//! Uses the `memes(links, sources, datecreated)` table of existing
//! deployments. New deployments get the table from [`MySqlStore::ensure_schema`]
//! with a unique key on `links`, and inserts are `INSERT IGNORE` so a second
//! record for the same link is a no-op.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlDatabaseError, MySqlPoolOptions};

use crate::error::Result;
use crate::models::{DatabaseConfig, Meme};
use crate::storage::{DedupStore, is_storable};

/// MySQL error number for a string the column charset cannot hold.
const ER_TRUNCATED_WRONG_VALUE_FOR_FIELD: u16 = 1366;

/// MySQL-backed dedup store.
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Build a store that connects on first use with a single connection.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database)
            .charset("utf8mb4");

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(options);
        Self::new(pool)
    }

    /// Create the dedup table if it is missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memes (
                links VARCHAR(768) NOT NULL,
                sources VARCHAR(255) NOT NULL,
                datecreated DATETIME NOT NULL,
                UNIQUE KEY memes_links_unique (links)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DedupStore for MySqlStore {
    async fn exists(&self, meme: &Meme) -> Result<bool> {
        if !is_storable(&meme.link) {
            log::warn!("Bad character in meme: {}", meme);
            return Ok(true);
        }

        let row = sqlx::query("SELECT 1 FROM memes WHERE links = ? LIMIT 1")
            .bind(&meme.link)
            .fetch_optional(&self.pool)
            .await;

        match row {
            Ok(row) => Ok(row.is_some()),
            Err(e) if is_encoding_error(&e) => {
                log::warn!("Bad character in meme {}: {}", meme, e);
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn record(&self, meme: &Meme) -> Result<()> {
        let result = sqlx::query(
            "INSERT IGNORE INTO memes (links, sources, datecreated) VALUES (?, ?, ?)",
        )
        .bind(&meme.link)
        .bind(&meme.source)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            log::warn!("Meme already recorded, insert ignored: {}", meme);
        }
        Ok(())
    }
}

fn is_encoding_error(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|e| e.number() == ER_TRUNCATED_WRONG_VALUE_FOR_FIELD),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_encoding_errors() {
        assert!(!is_encoding_error(&sqlx::Error::RowNotFound));
        assert!(!is_encoding_error(&sqlx::Error::PoolTimedOut));
    }
}
