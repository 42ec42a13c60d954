//! Client for the scheduler notifier.
//!
//! Only terminal failures are reported; successful completions are silent.

use async_trait::async_trait;
use load_manager_core::{StatusReportRequest, TaskId};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{self, Endpoint};
use crate::retry::RetryPolicy;

const SCHEDULER_PATH: &str = "/scheduler";

/// Reports task outcomes to the upstream scheduler.
#[async_trait]
pub trait NotifierClient: Send + Sync {
    /// Report a status for a task.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteCall` once retries are exhausted.
    async fn report_status(&self, task_id: &TaskId, report: StatusReportRequest) -> Result<()>;
}

/// HTTP client for the scheduler notifier.
#[derive(Debug, Clone)]
pub struct HttpNotifierClient {
    endpoint: Endpoint,
}

impl HttpNotifierClient {
    /// Create a notifier client for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Build` if the HTTP client cannot be created.
    pub fn from_config(config: &ClientConfig, base_url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_client(
            config.build_http_client()?,
            base_url,
            config.retry_policy(),
        ))
    }

    /// Create a client around an existing reqwest client.
    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            endpoint: Endpoint::new(client, base_url, retry),
        }
    }

    /// Get the base URL of the notifier.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.endpoint.base_url()
    }
}

#[async_trait]
impl NotifierClient for HttpNotifierClient {
    async fn report_status(&self, task_id: &TaskId, report: StatusReportRequest) -> Result<()> {
        let url = self
            .endpoint
            .url(&format!("{SCHEDULER_PATH}/{task_id}/status"));

        self.endpoint
            .retry
            .run("notifier.report_status", task_id, || {
                let request = self.endpoint.client.put(&url).json(&report);
                async move {
                    let response = request.send().await.map_err(|e| http::transport(&e))?;
                    http::ensure_success(response).await.map(|_| ())
                }
            })
            .await?;

        tracing::info!(task_id = %task_id, status = ?report.status, "Reported task status to scheduler");
        Ok(())
    }
}

/// A notifier that only logs, for deployments without a scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifierClient;

impl NoopNotifierClient {
    /// Create a new no-op notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifierClient for NoopNotifierClient {
    async fn report_status(&self, task_id: &TaskId, report: StatusReportRequest) -> Result<()> {
        tracing::warn!(
            task_id = %task_id,
            status = ?report.status,
            "NoopNotifierClient: report_status called but no notifier configured"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpNotifierClient {
        HttpNotifierClient::with_client(
            reqwest::Client::new(),
            server.uri(),
            RetryPolicy::new(2, Duration::from_millis(5)),
        )
    }

    #[tokio::test]
    async fn report_puts_loading_error() {
        let server = MockServer::start().await;
        let task_id = TaskId::generate();

        Mock::given(method("PUT"))
            .and(path(format!("/scheduler/{task_id}/status")))
            .and(body_json(serde_json::json!({ "status": "LOADING_ERROR" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .report_status(&task_id, StatusReportRequest::loading_error())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn report_failure_exhausts_retries() {
        let server = MockServer::start().await;
        let task_id = TaskId::generate();

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server)
            .report_status(&task_id, StatusReportRequest::loading_error())
            .await
            .unwrap_err();
        assert_eq!(err.operation(), Some("notifier.report_status"));
    }

    #[tokio::test]
    async fn noop_notifier_succeeds() {
        NoopNotifierClient::new()
            .report_status(&TaskId::generate(), StatusReportRequest::loading_error())
            .await
            .unwrap();
    }
}
