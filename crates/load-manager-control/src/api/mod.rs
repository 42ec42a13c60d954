//! HTTP request layer over [`Admission`].

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::admission::Admission;

pub use error::ApiError;

/// Create the router.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `POST /loader/task-manager/add` - Queue a task
/// - `DELETE /loader/task-manager/remove/:task_id` - Cancel a task
pub fn create_router<A>(admission: Arc<A>) -> Router
where
    A: Admission + 'static,
{
    Router::new()
        .route("/health", get(handlers::health))
        .route("/loader/task-manager/add", post(handlers::add_task::<A>))
        .route(
            "/loader/task-manager/remove/:task_id",
            delete(handlers::remove_task::<A>),
        )
        .with_state(admission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::AdmissionService;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::Utc;
    use load_manager_clients::mock::task_with_status;
    use load_manager_clients::{InMemoryQueueStore, MockGateway, RecordingNotifier};
    use load_manager_core::{DatasetId, TaskId, TaskOptions, TaskStatus};
    use serde_json::{json, Value};

    struct Harness {
        store: Arc<InMemoryQueueStore>,
        gateway: Arc<MockGateway>,
        server: TestServer,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryQueueStore::new());
        let gateway = Arc::new(MockGateway::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let admission = Arc::new(AdmissionService::new(
            store.clone(),
            gateway.clone(),
            notifier,
        ));
        let server = TestServer::new(create_router(admission)).unwrap();
        Harness {
            store,
            gateway,
            server,
        }
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let h = harness();

        let response = h.server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn add_returns_queued() {
        let h = harness();
        let task_id = TaskId::generate();
        let options = TaskOptions::new(task_id, DatasetId::generate());

        let response = h
            .server
            .post("/loader/task-manager/add")
            .json(&options)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<TaskStatus>(), TaskStatus::Queued);
        assert!(h.store.get(&task_id).is_some());
    }

    #[tokio::test]
    async fn add_accepts_options_without_task_id() {
        let h = harness();
        let dataset_id = DatasetId::generate();

        let response = h
            .server
            .post("/loader/task-manager/add")
            .json(&json!({ "datasetId": dataset_id, "format": "parquet" }))
            .await;

        response.assert_status_ok();
        let stored = h.store.tasks();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].dataset_id(), dataset_id);
        assert_eq!(stored[0].options.params["format"], "parquet");
    }

    #[tokio::test]
    async fn add_keeps_opaque_fields() {
        let h = harness();
        let task_id = TaskId::generate();

        h.server
            .post("/loader/task-manager/add")
            .json(&json!({
                "taskId": task_id,
                "datasetId": DatasetId::generate(),
                "sourceUri": "s3://raw/batch-9",
                "partitions": 4
            }))
            .await
            .assert_status_ok();

        let stored = h.store.get(&task_id).unwrap();
        assert_eq!(stored.options.params["sourceUri"], "s3://raw/batch-9");
        assert_eq!(stored.options.params["partitions"], 4);
    }

    #[tokio::test]
    async fn add_store_failure_is_bad_gateway() {
        let h = harness();
        h.store.fail("queue_store.create");

        let response = h
            .server
            .post("/loader/task-manager/add")
            .json(&TaskOptions::new(TaskId::generate(), DatasetId::generate()))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "upstream_unavailable");
    }

    #[tokio::test]
    async fn remove_dispatched_task() {
        let h = harness();
        let task = task_with_status(TaskStatus::Active, Utc::now());
        h.store.insert(task.clone());

        let response = h
            .server
            .delete(&format!("/loader/task-manager/remove/{}", task.task_id))
            .await;

        response.assert_status_ok();
        assert!(response.json::<bool>());
        assert_eq!(h.gateway.stopped(), vec![task.task_id]);
        assert!(h.store.tasks().is_empty());
    }

    #[tokio::test]
    async fn remove_unknown_task_is_not_found() {
        let h = harness();

        let response = h
            .server
            .delete(&format!("/loader/task-manager/remove/{}", TaskId::generate()))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn remove_with_malformed_id_is_bad_request() {
        let h = harness();

        let response = h.server.delete("/loader/task-manager/remove/not-a-uuid").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(h.store.calls().is_empty());
    }
}
