//! Fixed-delay retry for remote calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Bounded retry with a constant pause between attempts.
///
/// A call is attempted once, then retried up to `max_retries` more times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Pause before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy.
    #[must_use]
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total number of attempts the policy allows.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `attempt` until it succeeds or the policy is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteCall` carrying the last failure once every
    /// attempt has failed.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        target: impl Display,
        mut attempt: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, String>>,
    {
        let attempts = self.attempts();
        let mut last_failure = String::new();

        for n in 1..=attempts {
            if n > 1 {
                tokio::time::sleep(self.delay).await;
            }

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(reason) => {
                    tracing::warn!(
                        operation,
                        target = %target,
                        attempt = n,
                        attempts,
                        reason = %reason,
                        "Remote call attempt failed"
                    );
                    last_failure = reason;
                }
            }
        }

        tracing::error!(
            operation,
            target = %target,
            attempts,
            reason = %last_failure,
            "Remote call retries exhausted"
        );

        Err(ClientError::RemoteCall {
            operation,
            target: target.to_string(),
            attempts,
            reason: last_failure,
        })
    }
}
