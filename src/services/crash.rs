// src/services/crash.rs

//! Crash reporting for failures that end a run.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::CrashReportingConfig;
use crate::utils::http::ensure_success;

#[derive(Debug, Serialize)]
struct CrashReport<'a> {
    service: &'a str,
    message: String,
    timestamp: DateTime<Utc>,
}

/// Forwards run-ending errors to an external crash tracker.
pub struct CrashReporter {
    client: Client,
    config: CrashReportingConfig,
}

impl CrashReporter {
    pub fn new(client: Client, config: CrashReportingConfig) -> Self {
        Self { client, config }
    }

    /// Send one report. Callers log and ignore a failure to report.
    pub async fn report(&self, error: &AppError) -> Result<()> {
        let report = CrashReport {
            service: env!("CARGO_PKG_NAME"),
            message: error.to_string(),
            timestamp: Utc::now(),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .basic_auth(&self.config.key, Some(&self.config.secret))
            .json(&report)
            .send()
            .await?;
        ensure_success("crash reporting", response).await?;

        log::info!("Crash report sent to {}", self.config.endpoint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_payload() {
        let error = AppError::config("mysql unreachable");
        let report = CrashReport {
            service: "chirp",
            message: error.to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["service"], "chirp");
        assert_eq!(json["message"], "Configuration error: mysql unreachable");
        assert!(json["timestamp"].is_string());
    }
}
