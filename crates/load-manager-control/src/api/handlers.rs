//! Request handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use load_manager_core::{TaskId, TaskOptions};

use crate::admission::Admission;
use crate::api::error::ApiError;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check handler.
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health() -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    };

    (StatusCode::OK, Json(response))
}

/// Queue a new task. Responds with the status the queue store assigned.
///
/// # Errors
///
/// Returns `502` if the queue store cannot be reached.
pub async fn add_task<A>(
    State(admission): State<Arc<A>>,
    Json(options): Json<TaskOptions>,
) -> Result<impl IntoResponse, ApiError>
where
    A: Admission + 'static,
{
    let status = admission.submit(options).await?;
    Ok(Json(status))
}

/// Cancel a task. Responds with whether the queue store deleted it.
///
/// # Errors
///
/// Returns `400` for a malformed task ID, `404` if the task is unknown and
/// `502` if a collaborator cannot be reached.
pub async fn remove_task<A>(
    State(admission): State<Arc<A>>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    A: Admission + 'static,
{
    let task_id = parse_task_id(&task_id)?;
    let deleted = admission.cancel(&task_id).await?;
    Ok(Json(deleted))
}

fn parse_task_id(s: &str) -> Result<TaskId, ApiError> {
    s.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid task ID: {s}")))
}
