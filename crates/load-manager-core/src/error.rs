//! Common error types for load-manager.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur while handling domain values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),

    /// A task status string did not match any known status.
    #[error("unknown task status: {0}")]
    UnknownStatus(String),
}
