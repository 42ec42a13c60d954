//! Status values reported by the execution gateway.

use serde::{Deserialize, Serialize};

use crate::ids::{DatasetId, TaskId};

/// Remote status of a task inside the execution gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoaderStatus {
    /// The gateway accepted the task but has not begun loading.
    NotStarted,
    /// Loading is in progress.
    Loading,
    /// Loading failed.
    LoadingError,
    /// The downstream consumer declined the loaded data.
    AcceptingDeclined,
    /// The downstream consumer accepted the loaded data.
    AcceptingComplete,
    /// Loading finished.
    LoadingComplete,
    /// Any status this build does not recognise.
    #[serde(other)]
    Unknown,
}

impl LoaderStatus {
    /// Returns true for the statuses that mean the work finished successfully.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::AcceptingComplete | Self::LoadingComplete)
    }

    /// Returns true for the statuses that mean the work failed outright.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::LoadingError | Self::AcceptingDeclined)
    }
}

/// Status response returned by the gateway's status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderStatusReport {
    /// Task the report is about.
    pub task_id: TaskId,
    /// Dataset the task loads into.
    pub dataset_id: DatasetId,
    /// Current remote status.
    pub status: LoaderStatus,
}

/// Body sent to the scheduler notifier when reporting a task outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReportRequest {
    /// Status being reported.
    pub status: LoaderStatus,
}

impl StatusReportRequest {
    /// The error signal sent for every failed terminal path.
    #[must_use]
    pub const fn loading_error() -> Self {
        Self {
            status: LoaderStatus::LoadingError,
        }
    }
}
