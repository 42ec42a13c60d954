//! The queued task record and its lifecycle status.
//!
//! A [`Task`] is owned by the external queue store; the control loop reads it,
//! decides, and writes it back. Nothing here is cached between ticks.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::ids::{DatasetId, TaskId};

/// Lifecycle status of a task in the queue store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Waiting in the queue; not yet sent to the gateway.
    Queued,
    /// Sent to the gateway, not yet observed loading.
    Pending,
    /// Observed loading in the gateway.
    Active,
    /// Finished successfully.
    Complete,
    /// Failed, timed out or was declined.
    Error,
}

impl TaskStatus {
    /// The wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Complete => "COMPLETE",
            Self::Error => "ERROR",
        }
    }

    /// Returns true if the task has been handed to the gateway and not finished.
    ///
    /// At most one task may be in flight at any time.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(Self::Queued),
            "PENDING" => Ok(Self::Pending),
            "ACTIVE" => Ok(Self::Active),
            "COMPLETE" => Ok(Self::Complete),
            "ERROR" => Ok(Self::Error),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// Payload describing the loading work.
///
/// Only the identifiers are interpreted here; every other field is carried
/// through to the gateway untouched. The task id is optional on the wire;
/// the record's own id is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOptions {
    /// Task the payload belongs to, when the submitter supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    /// Dataset the gateway loads into.
    pub dataset_id: DatasetId,
    /// Remaining opaque fields.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl TaskOptions {
    /// Create options with no extra parameters.
    #[must_use]
    pub fn new(task_id: TaskId, dataset_id: DatasetId) -> Self {
        Self {
            task_id: Some(task_id),
            dataset_id,
            params: Map::new(),
        }
    }

    /// Copy of the payload addressed to `task_id`, whatever id it carried before.
    #[must_use]
    pub fn for_task(&self, task_id: TaskId) -> Self {
        Self {
            task_id: Some(task_id),
            ..self.clone()
        }
    }

    /// Add an opaque parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A task record as stored in the queue store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, assigned at submission.
    pub task_id: TaskId,
    /// The work payload.
    pub options: TaskOptions,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Last status-affecting write; drives the staleness window.
    pub updated_at: DateTime<Utc>,
    /// Submission time, when the store reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a freshly queued task. The payload is addressed to `task_id`.
    #[must_use]
    pub fn queued(task_id: TaskId, options: &TaskOptions, now: DateTime<Utc>) -> Self {
        Self {
            task_id,
            options: options.for_task(task_id),
            status: TaskStatus::Queued,
            updated_at: now,
            created_at: Some(now),
        }
    }

    /// The dataset the task loads into.
    #[must_use]
    pub const fn dataset_id(&self) -> DatasetId {
        self.options.dataset_id
    }

    /// Refresh `updated_at`, never moving it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Set a new status and refresh `updated_at`.
    pub fn transition(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.status = status;
        self.touch(now);
    }

    /// The instant after which the task counts as stalled.
    ///
    /// Returns `None` if the deadline is not representable.
    #[must_use]
    pub fn deadline(&self, timeout: Duration) -> Option<DateTime<Utc>> {
        let delta = TimeDelta::from_std(timeout).ok()?;
        self.updated_at.checked_add_signed(delta)
    }

    /// Returns true if `now` is strictly past `updated_at + timeout`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.deadline(timeout).is_some_and(|deadline| now > deadline)
    }

    /// Time elapsed since the last refresh, zero if the clock went backwards.
    #[must_use]
    pub fn waited(&self, now: DateTime<Utc>) -> Duration {
        (now - self.updated_at).to_std().unwrap_or_default()
    }
}
