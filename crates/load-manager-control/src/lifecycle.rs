//! Task lifecycle state machine.
//!
//! The controller reads a task, asks the gateway for its remote status and
//! lets [`decide`] pick what happens next. The decision is pure; applying it
//! is the controller's job.
//!
//! # State Machine
//!
//! ```text
//!   ┌────────┐  start ok   ┌─────────┐  loading  ┌────────┐
//!   │ Queued │────────────▶│ Pending │──────────▶│ Active │
//!   └───┬────┘             └────┬────┘           └───┬────┘
//!       │ start failed          │                    │
//!       ▼                       ▼                    ▼
//!   (deleted)        complete: deleted     failure / stale: deleted + notified
//! ```

use std::fmt;
use std::time::Duration;

use load_manager_core::{LoaderStatus, TaskStatus};

/// Why an in-flight task was given up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// No progress within the staleness window.
    Stale {
        /// Time since the task was last refreshed.
        waited: Duration,
    },
    /// The gateway reported a failure.
    RemoteFailure(LoaderStatus),
    /// The gateway reported a status this build does not recognise.
    UnrecognisedStatus,
    /// The gateway could not be asked.
    StatusQueryFailed(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stale { waited } => write!(f, "no progress for {}s", waited.as_secs()),
            Self::RemoteFailure(status) => write!(f, "gateway reported {status:?}"),
            Self::UnrecognisedStatus => f.write_str("gateway reported an unrecognised status"),
            Self::StatusQueryFailed(reason) => write!(f, "status query failed: {reason}"),
        }
    }
}

/// What to do with an in-flight task after a status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Leave the record untouched.
    Wait,
    /// Write `status` back and refresh `updated_at`.
    Promote {
        /// Status to store.
        status: TaskStatus,
    },
    /// Delete the record without notifying.
    Complete,
    /// Delete the record and report the failure.
    Abort(AbortReason),
}

/// Decide the next step for an in-flight task.
///
/// `stale` carries the time waited when the staleness window has passed and
/// is `None` otherwise. Gateway-reported outcomes win over staleness.
#[must_use]
pub fn decide(task_status: TaskStatus, remote: LoaderStatus, stale: Option<Duration>) -> Transition {
    if remote.is_success() {
        return Transition::Complete;
    }
    if remote.is_failure() {
        return Transition::Abort(AbortReason::RemoteFailure(remote));
    }
    if remote == LoaderStatus::Unknown {
        return Transition::Abort(AbortReason::UnrecognisedStatus);
    }

    match stale {
        Some(waited) => Transition::Abort(AbortReason::Stale { waited }),
        None if remote == LoaderStatus::Loading => Transition::Promote {
            status: promoted(task_status),
        },
        None => Transition::Wait,
    }
}

/// Status an in-flight task takes once the gateway reports it loading.
const fn promoted(status: TaskStatus) -> TaskStatus {
    match status {
        TaskStatus::Pending => TaskStatus::Active,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAITED: Duration = Duration::from_secs(61);

    #[test]
    fn loading_promotes_pending() {
        assert_eq!(
            decide(TaskStatus::Pending, LoaderStatus::Loading, None),
            Transition::Promote {
                status: TaskStatus::Active
            }
        );
    }

    #[test]
    fn loading_refreshes_active() {
        assert_eq!(
            decide(TaskStatus::Active, LoaderStatus::Loading, None),
            Transition::Promote {
                status: TaskStatus::Active
            }
        );
    }

    #[test]
    fn not_started_waits_until_stale() {
        assert_eq!(
            decide(TaskStatus::Pending, LoaderStatus::NotStarted, None),
            Transition::Wait
        );
        assert_eq!(
            decide(TaskStatus::Pending, LoaderStatus::NotStarted, Some(WAITED)),
            Transition::Abort(AbortReason::Stale { waited: WAITED })
        );
    }

    #[test]
    fn stale_loading_aborts() {
        assert_eq!(
            decide(TaskStatus::Active, LoaderStatus::Loading, Some(WAITED)),
            Transition::Abort(AbortReason::Stale { waited: WAITED })
        );
    }

    #[test]
    fn failures_abort_regardless_of_staleness() {
        for remote in [LoaderStatus::LoadingError, LoaderStatus::AcceptingDeclined] {
            for stale in [None, Some(WAITED)] {
                assert_eq!(
                    decide(TaskStatus::Active, remote, stale),
                    Transition::Abort(AbortReason::RemoteFailure(remote))
                );
            }
        }
    }

    #[test]
    fn completion_wins_over_staleness() {
        for remote in [LoaderStatus::AcceptingComplete, LoaderStatus::LoadingComplete] {
            assert_eq!(decide(TaskStatus::Pending, remote, Some(WAITED)), Transition::Complete);
            assert_eq!(decide(TaskStatus::Active, remote, None), Transition::Complete);
        }
    }

    #[test]
    fn unknown_status_aborts() {
        assert_eq!(
            decide(TaskStatus::Pending, LoaderStatus::Unknown, None),
            Transition::Abort(AbortReason::UnrecognisedStatus)
        );
    }

    #[test]
    fn abort_reason_messages() {
        assert_eq!(
            AbortReason::Stale { waited: WAITED }.to_string(),
            "no progress for 61s"
        );
        assert_eq!(
            AbortReason::RemoteFailure(LoaderStatus::LoadingError).to_string(),
            "gateway reported LoadingError"
        );
    }
}
