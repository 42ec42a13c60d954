//! Client for the execution gateway.
//!
//! The gateway performs the actual loading work. It addresses in-flight work
//! by the `(task_id, dataset_id)` pair.

use async_trait::async_trait;
use load_manager_core::{DatasetId, LoaderStatusReport, TaskId, TaskOptions};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{self, Endpoint};
use crate::retry::RetryPolicy;

const LOADER_START_PATH: &str = "/loader/start";
const LOADER_STATUS_PATH: &str = "/loader/status";
const LOADER_STOP_PATH: &str = "/loader/stop";

/// Operations offered by the execution gateway.
#[async_trait]
pub trait ExecutorGatewayClient: Send + Sync {
    /// Hand a task to the gateway for execution.
    ///
    /// Any 2xx answer counts as acceptance.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteCall` once retries are exhausted.
    async fn start(&self, options: &TaskOptions) -> Result<()>;

    /// Query the gateway's view of a task.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteCall` once retries are exhausted.
    async fn status(&self, task_id: &TaskId, dataset_id: &DatasetId) -> Result<LoaderStatusReport>;

    /// Ask the gateway to stop a task. Returns the gateway's acknowledgement flag.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteCall` once retries are exhausted.
    async fn stop(&self, task_id: &TaskId, dataset_id: &DatasetId) -> Result<bool>;
}

/// HTTP client for the execution gateway.
#[derive(Debug, Clone)]
pub struct HttpExecutorGatewayClient {
    endpoint: Endpoint,
}

impl HttpExecutorGatewayClient {
    /// Create a client with its own HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Build` if the HTTP client cannot be created.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_client(
            config.build_http_client()?,
            config.gateway_url.clone(),
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

    /// Get the base URL of the gateway.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.endpoint.base_url()
    }

    fn addressed_url(&self, path: &str, task_id: &TaskId, dataset_id: &DatasetId) -> String {
        self.endpoint
            .url(&format!("{path}?taskId={task_id}&datasetId={dataset_id}"))
    }
}

#[async_trait]
impl ExecutorGatewayClient for HttpExecutorGatewayClient {
    async fn start(&self, options: &TaskOptions) -> Result<()> {
        let target = http::payload_target(options);
        let url = self.endpoint.url(LOADER_START_PATH);

        self.endpoint
            .retry
            .run("gateway.start", &target, || {
                let request = self.endpoint.client.post(&url).json(options);
                async move {
                    let response = request.send().await.map_err(|e| http::transport(&e))?;
                    http::ensure_success(response).await.map(|_| ())
                }
            })
            .await?;

        tracing::debug!(task = %target, "Gateway accepted task");
        Ok(())
    }

    async fn status(&self, task_id: &TaskId, dataset_id: &DatasetId) -> Result<LoaderStatusReport> {
        let url = self.addressed_url(LOADER_STATUS_PATH, task_id, dataset_id);

        self.endpoint
            .retry
            .run("gateway.status", task_id, || {
                let request = self.endpoint.client.get(&url);
                async move {
                    let response = request.send().await.map_err(|e| http::transport(&e))?;
                    http::decode::<LoaderStatusReport>(response).await
                }
            })
            .await
    }

    async fn stop(&self, task_id: &TaskId, dataset_id: &DatasetId) -> Result<bool> {
        let url = self.addressed_url(LOADER_STOP_PATH, task_id, dataset_id);

        self.endpoint
            .retry
            .run("gateway.stop", task_id, || {
                let request = self.endpoint.client.patch(&url);
                async move {
                    let response = request.send().await.map_err(|e| http::transport(&e))?;
                    http::decode_ack(response).await
                }
            })
            .await
    }
}
