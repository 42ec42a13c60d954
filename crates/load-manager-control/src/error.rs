//! Error types for the control loop and admission service.

use load_manager_clients::ClientError;
use load_manager_core::TaskId;
use thiserror::Error;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur in control plane operations.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The requested task is not in the queue store.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A collaborator call failed after its retries.
    #[error(transparent)]
    RemoteCall(#[from] ClientError),
}

impl ControlError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::TaskNotFound(_) => 404,
            Self::RemoteCall(_) => 502,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        let task_id = TaskId::generate();
        let remote = ClientError::RemoteCall {
            operation: "gateway.stop",
            target: task_id.to_string(),
            attempts: 4,
            reason: "status 503 Service Unavailable".to_string(),
        };

        assert_eq!(ControlError::TaskNotFound(task_id).http_status_code(), 404);
        assert_eq!(ControlError::from(remote).http_status_code(), 502);
    }
}
