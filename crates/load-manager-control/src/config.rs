//! Controller configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the lifecycle controller and its HTTP layer.
///
/// Read once at startup and passed to the controller's constructor.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagerConfig {
    /// Whether the periodic control loop runs at all.
    #[serde(default = "ManagerConfig::default_enabled")]
    pub enabled: bool,

    /// Period of the control loop, in seconds.
    #[serde(default = "ManagerConfig::default_tick_interval")]
    pub tick_interval_seconds: u64,

    /// How long an in-flight task may go without progress, in seconds.
    #[serde(default = "ManagerConfig::default_waiting_timeout")]
    pub waiting_timeout_seconds: u64,

    /// Listen address of the HTTP layer (e.g., "0.0.0.0:8080").
    #[serde(default = "ManagerConfig::default_listen_addr")]
    pub listen_addr: String,
}

impl ManagerConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_tick_interval() -> u64 {
        10
    }

    const fn default_waiting_timeout() -> u64 {
        60
    }

    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `MANAGER_ENABLED`: `true` or `false`
    /// - `MANAGER_TICK_INTERVAL_SECONDS`: Control loop period
    /// - `MANAGER_WAITING_TIMEOUT_SECONDS`: Staleness window
    /// - `LISTEN_ADDR`: HTTP listen address
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MANAGER_ENABLED") {
            if let Ok(enabled) = val.trim().parse() {
                config.enabled = enabled;
            }
        }
        if let Ok(val) = std::env::var("MANAGER_TICK_INTERVAL_SECONDS") {
            if let Ok(n) = val.parse() {
                config.tick_interval_seconds = n;
            }
        }
        if let Ok(val) = std::env::var("MANAGER_WAITING_TIMEOUT_SECONDS") {
            if let Ok(n) = val.parse() {
                config.waiting_timeout_seconds = n;
            }
        }
        if let Ok(val) = std::env::var("LISTEN_ADDR") {
            config.listen_addr = val;
        }

        config
    }

    /// Get the tick period as a `Duration`. Never zero.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds.max(1))
    }

    /// Get the staleness window as a `Duration`.
    #[must_use]
    pub const fn waiting_timeout(&self) -> Duration {
        Duration::from_secs(self.waiting_timeout_seconds)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            tick_interval_seconds: Self::default_tick_interval(),
            waiting_timeout_seconds: Self::default_waiting_timeout(),
            listen_addr: Self::default_listen_addr(),
        }
    }
}
