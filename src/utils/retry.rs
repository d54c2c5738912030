// src/utils/retry.rs

//! Bounded retry with a fixed wait.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub wait: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

/// Run `op` until it succeeds, fails with a non-transient error, or the
/// policy runs out of attempts. The last error is returned.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                log::warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {}s",
                    label,
                    attempt,
                    policy.max_attempts,
                    e,
                    policy.wait.as_secs()
                );
                tokio::time::sleep(policy.wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::AppError;

    fn instant(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = retry(&instant(3), "listing", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(AppError::api("reddit", 503, "busy"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<()> = retry(&instant(3), "listing", || {
            calls.set(calls.get() + 1);
            async { Err(AppError::api("reddit", 500, "down")) }
        })
        .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_non_transient_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = retry(&instant(3), "listing", || {
            calls.set(calls.get() + 1);
            async { Err(AppError::validation("bad listing")) }
        })
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_policy_needs_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
