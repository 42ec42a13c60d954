//! Error types for the collaborator clients.

use thiserror::Error;

/// A result type using `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors returned by the collaborator clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A remote call exhausted its retries or was answered with a failure.
    #[error("{operation} failed for {target} after {attempts} attempt(s): {reason}")]
    RemoteCall {
        /// Stable operation name, e.g. `queue_store.find_next`.
        operation: &'static str,
        /// The task id or filter the call was about.
        target: String,
        /// How many attempts were made.
        attempts: u32,
        /// The last failure observed.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

impl ClientError {
    /// The operation name, for remote call failures.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::RemoteCall { operation, .. } => Some(operation),
            Self::Build(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_call_message_names_operation_and_target() {
        let err = ClientError::RemoteCall {
            operation: "gateway.start",
            target: "6f1c0b9e-6a55-4f5e-9f55-2d1c8f0b1a77".to_string(),
            attempts: 4,
            reason: "status 503 Service Unavailable".to_string(),
        };
        let message = err.to_string();
        assert!(message.starts_with("gateway.start failed for 6f1c0b9e"));
        assert!(message.contains("after 4 attempt(s)"));
        assert_eq!(err.operation(), Some("gateway.start"));
    }
}
