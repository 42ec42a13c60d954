//! Client for the task queue store.
//!
//! The queue store is the only durable owner of task records. It answers
//! lookups with a single task or nothing, and returns the earliest submitted
//! `QUEUED` task from its "next" endpoint.

use async_trait::async_trait;
use load_manager_core::{Task, TaskId, TaskOptions, TaskStatus};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{self, Endpoint};
use crate::retry::RetryPolicy;

const TASK_QUEUE_PATH: &str = "/api/v1/task-queue";

/// Operations offered by the queue store.
#[async_trait]
pub trait QueueStoreClient: Send + Sync {
    /// Submit a new task; returns the status the store assigned (normally `Queued`).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteCall` once retries are exhausted.
    async fn create(&self, options: &TaskOptions) -> Result<TaskStatus>;

    /// Fetch a task by id, `None` if the store has no such task.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteCall` once retries are exhausted.
    async fn get_by_id(&self, task_id: &TaskId) -> Result<Option<Task>>;

    /// Fetch one task with the given status, if any.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteCall` once retries are exhausted.
    async fn find_by_status(&self, status: TaskStatus) -> Result<Option<Task>>;

    /// Fetch the earliest submitted queued task, if any.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteCall` once retries are exhausted.
    async fn find_next(&self) -> Result<Option<Task>>;

    /// Write a task back to the store.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteCall` once retries are exhausted.
    async fn update(&self, task: &Task) -> Result<Task>;

    /// Remove a task from the store.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteCall` once retries are exhausted.
    async fn delete(&self, task_id: &TaskId) -> Result<bool>;
}

/// HTTP client for the queue store's REST API.
#[derive(Debug, Clone)]
pub struct HttpQueueStoreClient {
    endpoint: Endpoint,
}

impl HttpQueueStoreClient {
    /// Create a client with its own HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Build` if the HTTP client cannot be created.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_client(
            config.build_http_client()?,
            config.queue_store_url.clone(),
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

    /// Get the base URL of the queue store.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.endpoint.base_url()
    }

    fn task_url(&self, task_id: &TaskId) -> String {
        self.endpoint.url(&format!("{TASK_QUEUE_PATH}/{task_id}"))
    }
}

#[async_trait]
impl QueueStoreClient for HttpQueueStoreClient {
    async fn create(&self, options: &TaskOptions) -> Result<TaskStatus> {
        let target = http::payload_target(options);
        tracing::debug!(task = %target, "Adding new task to the queue");
        let url = self.endpoint.url(TASK_QUEUE_PATH);

        self.endpoint
            .retry
            .run("queue_store.create", &target, || {
                let request = self.endpoint.client.post(&url).json(options);
                async move {
                    let response = request.send().await.map_err(|e| http::transport(&e))?;
                    http::decode::<TaskStatus>(response).await
                }
            })
            .await
    }

    async fn get_by_id(&self, task_id: &TaskId) -> Result<Option<Task>> {
        tracing::debug!(task_id = %task_id, "Fetching task");
        let url = self.task_url(task_id);

        self.endpoint
            .retry
            .run("queue_store.get_by_id", task_id, || {
                let request = self.endpoint.client.get(&url);
                async move {
                    let response = request.send().await.map_err(|e| http::transport(&e))?;
                    http::decode_optional::<Task>(response).await
                }
            })
            .await
    }

    async fn find_by_status(&self, status: TaskStatus) -> Result<Option<Task>> {
        tracing::debug!(status = %status, "Finding task by status");
        let url = self
            .endpoint
            .url(&format!("{TASK_QUEUE_PATH}/find?status={}", status.as_str()));

        self.endpoint
            .retry
            .run("queue_store.find_by_status", status, || {
                let request = self.endpoint.client.get(&url);
                async move {
                    let response = request.send().await.map_err(|e| http::transport(&e))?;
                    http::decode_optional::<Task>(response).await
                }
            })
            .await
    }

    async fn find_next(&self) -> Result<Option<Task>> {
        tracing::debug!("Taking the earliest task in the queue");
        let url = self.endpoint.url(TASK_QUEUE_PATH);

        self.endpoint
            .retry
            .run("queue_store.find_next", "queue", || {
                let request = self.endpoint.client.get(&url);
                async move {
                    let response = request.send().await.map_err(|e| http::transport(&e))?;
                    http::decode_optional::<Task>(response).await
                }
            })
            .await
    }

    async fn update(&self, task: &Task) -> Result<Task> {
        tracing::debug!(task_id = %task.task_id, status = %task.status, "Updating task");
        let url = self.endpoint.url(TASK_QUEUE_PATH);

        self.endpoint
            .retry
            .run("queue_store.update", task.task_id, || {
                let request = self.endpoint.client.patch(&url).json(task);
                async move {
                    let response = request.send().await.map_err(|e| http::transport(&e))?;
                    http::decode::<Task>(response).await
                }
            })
            .await
    }

    async fn delete(&self, task_id: &TaskId) -> Result<bool> {
        tracing::debug!(task_id = %task_id, "Deleting task");
        let url = self.task_url(task_id);

        self.endpoint
            .retry
            .run("queue_store.delete", task_id, || {
                let request = self.endpoint.client.delete(&url);
                async move {
                    let response = request.send().await.map_err(|e| http::transport(&e))?;
                    http::decode_ack(response).await
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use chrono::Utc;
    use load_manager_core::DatasetId;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpQueueStoreClient {
        HttpQueueStoreClient::with_client(
            reqwest::Client::new(),
            server.uri(),
            RetryPolicy::new(2, Duration::from_millis(5)),
        )
    }

    fn sample_task(status: TaskStatus) -> Task {
        let task_id = TaskId::generate();
        let options =
            TaskOptions::new(task_id, DatasetId::generate()).with_param("format", "parquet");
        let mut task = Task::queued(task_id, &options, Utc::now());
        task.status = status;
        task
    }

    #[tokio::test]
    async fn find_by_status_returns_task() {
        let server = MockServer::start().await;
        let task = sample_task(TaskStatus::Pending);

        Mock::given(method("GET"))
            .and(path("/api/v1/task-queue/find"))
            .and(query_param("status", "PENDING"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&task))
            .expect(1)
            .mount(&server)
            .await;

        let found = client(&server)
            .find_by_status(TaskStatus::Pending)
            .await
            .unwrap();
        assert_eq!(found, Some(task));
    }

    #[tokio::test]
    async fn find_by_status_treats_empty_answers_as_absent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/task-queue/find"))
            .and(query_param("status", "ACTIVE"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/task-queue/find"))
            .and(query_param("status", "PENDING"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let store = client(&server);
        assert!(store
            .find_by_status(TaskStatus::Active)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_by_status(TaskStatus::Pending)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn find_next_retries_server_errors() {
        let server = MockServer::start().await;
        let task = sample_task(TaskStatus::Queued);

        Mock::given(method("GET"))
            .and(path("/api/v1/task-queue"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/task-queue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&task))
            .mount(&server)
            .await;

        let found = client(&server).find_next().await.unwrap();
        assert_eq!(found.map(|t| t.task_id), Some(task.task_id));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn find_next_accepts_options_without_task_id() {
        let server = MockServer::start().await;
        let task_id = TaskId::generate();
        let dataset_id = DatasetId::generate();

        Mock::given(method("GET"))
            .and(path("/api/v1/task-queue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "taskId": task_id,
                "options": { "datasetId": dataset_id, "format": "csv" },
                "status": "QUEUED",
                "updatedAt": "2024-05-01T10:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let task = client(&server).find_next().await.unwrap().unwrap();
        assert_eq!(task.task_id, task_id);
        assert_eq!(task.options.task_id, None);
        assert_eq!(task.dataset_id(), dataset_id);
    }

    #[tokio::test]
    async fn find_next_null_body_is_absent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/task-queue"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        assert!(client(&server).find_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_by_id_not_found_is_none() {
        let server = MockServer::start().await;
        let task_id = TaskId::generate();

        Mock::given(method("GET"))
            .and(path(format!("/api/v1/task-queue/{task_id}")))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client(&server).get_by_id(&task_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_posts_options_and_returns_status() {
        let server = MockServer::start().await;
        let options = TaskOptions::new(TaskId::generate(), DatasetId::generate())
            .with_param("priority", 3);

        Mock::given(method("POST"))
            .and(path("/api/v1/task-queue"))
            .and(body_json(&options))
            .respond_with(ResponseTemplate::new(201).set_body_json("QUEUED"))
            .expect(1)
            .mount(&server)
            .await;

        let status = client(&server).create(&options).await.unwrap();
        assert_eq!(status, TaskStatus::Queued);
    }

    #[tokio::test]
    async fn update_sends_task_back() {
        let server = MockServer::start().await;
        let task = sample_task(TaskStatus::Active);

        Mock::given(method("PATCH"))
            .and(path("/api/v1/task-queue"))
            .and(body_json(&task))
            .respond_with(ResponseTemplate::new(200).set_body_json(&task))
            .expect(1)
            .mount(&server)
            .await;

        let updated = client(&server).update(&task).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Active);
    }

    #[tokio::test]
    async fn delete_exhausts_retries() {
        let server = MockServer::start().await;
        let task_id = TaskId::generate();

        Mock::given(method("DELETE"))
            .and(path(format!("/api/v1/task-queue/{task_id}")))
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server).delete(&task_id).await.unwrap_err();
        match err {
            ClientError::RemoteCall {
                operation,
                target,
                attempts,
                reason,
            } => {
                assert_eq!(operation, "queue_store.delete");
                assert_eq!(target, task_id.to_string());
                assert_eq!(attempts, 3);
                assert!(reason.contains("db down"));
            }
            other => panic!("expected RemoteCall, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_acknowledges() {
        let server = MockServer::start().await;
        let task_id = TaskId::generate();

        Mock::given(method("DELETE"))
            .and(path(format!("/api/v1/task-queue/{task_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(true))
            .mount(&server)
            .await;

        assert!(client(&server).delete(&task_id).await.unwrap());
    }
}
