//! Connection and retry settings for the collaborator services.

use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::retry::RetryPolicy;

/// Configuration shared by the collaborator clients.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the queue store service.
    #[serde(default = "ClientConfig::default_queue_store_url")]
    pub queue_store_url: String,

    /// Base URL of the execution gateway.
    #[serde(default = "ClientConfig::default_gateway_url")]
    pub gateway_url: String,

    /// Base URL of the scheduler notifier. Notifications are only logged when unset.
    #[serde(default)]
    pub notifier_url: Option<String>,

    /// Retries after the first attempt of every remote call.
    #[serde(default = "ClientConfig::default_max_retries")]
    pub max_retries: u32,

    /// Fixed pause between attempts, in milliseconds.
    #[serde(default = "ClientConfig::default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "ClientConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ClientConfig {
    fn default_queue_store_url() -> String {
        "http://task-queue-store:8080".to_string()
    }

    fn default_gateway_url() -> String {
        "http://executor-gateway:8080".to_string()
    }

    const fn default_max_retries() -> u32 {
        3
    }

    const fn default_retry_delay_ms() -> u64 {
        1000
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `QUEUE_STORE_URL`: Base URL of the queue store
    /// - `EXECUTOR_GATEWAY_URL`: Base URL of the execution gateway
    /// - `NOTIFIER_URL`: Base URL of the scheduler notifier
    /// - `REMOTE_MAX_RETRIES`: Retries per remote call
    /// - `REMOTE_RETRY_DELAY_MS`: Pause between attempts
    /// - `REMOTE_REQUEST_TIMEOUT_SECONDS`: Per-request timeout
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("QUEUE_STORE_URL") {
            config.queue_store_url = val;
        }
        if let Ok(val) = std::env::var("EXECUTOR_GATEWAY_URL") {
            config.gateway_url = val;
        }
        if let Ok(val) = std::env::var("NOTIFIER_URL") {
            if !val.trim().is_empty() {
                config.notifier_url = Some(val);
            }
        }
        if let Ok(val) = std::env::var("REMOTE_MAX_RETRIES") {
            if let Ok(n) = val.parse() {
                config.max_retries = n;
            }
        }
        if let Ok(val) = std::env::var("REMOTE_RETRY_DELAY_MS") {
            if let Ok(n) = val.parse() {
                config.retry_delay_ms = n;
            }
        }
        if let Ok(val) = std::env::var("REMOTE_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(n) = val.parse() {
                config.request_timeout_seconds = n;
            }
        }

        config
    }

    /// The retry policy applied to every remote call.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Build the HTTP client shared by all collaborator clients.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Build` if the TLS backend cannot be initialised.
    pub fn build_http_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout())
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(client)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            queue_store_url: Self::default_queue_store_url(),
            gateway_url: Self::default_gateway_url(),
            notifier_url: None,
            max_retries: Self::default_max_retries(),
            retry_delay_ms: Self::default_retry_delay_ms(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_ms, 1000);
        assert!(config.notifier_url.is_none());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn retry_policy_from_config() {
        let config = ClientConfig {
            max_retries: 5,
            retry_delay_ms: 250,
            ..Default::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.delay, Duration::from_millis(250));
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{ "gateway_url": "http://gw:9000" }"#).unwrap();
        assert_eq!(config.gateway_url, "http://gw:9000");
        assert_eq!(config.queue_store_url, "http://task-queue-store:8080");
        assert_eq!(config.max_retries, 3);
    }
}
