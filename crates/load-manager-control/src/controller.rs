//! The periodic control loop.
//!
//! Each tick examines at most one task, chosen in this order:
//!
//! 1. the task currently `Pending` in the store
//! 2. else the task currently `Active`
//! 3. else the earliest `Queued` task, which is handed to the gateway
//!
//! Only one task is ever in flight, so the first two lookups return the same
//! task whenever one exists. A tick never chains further work once it has
//! handled its task.

use std::future::Future;
use std::sync::Arc;

use load_manager_clients::{ExecutorGatewayClient, NotifierClient, QueueStoreClient};
use load_manager_core::{StatusReportRequest, Task, TaskId, TaskStatus};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::config::ManagerConfig;
use crate::error::Result;
use crate::lifecycle::{self, AbortReason, Transition};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The controller is switched off.
    Disabled,
    /// Another tick was still running.
    Skipped,
    /// Nothing in flight and nothing queued.
    Idle,
    /// A queued task was accepted by the gateway and is now `Pending`.
    Admitted(TaskId),
    /// The gateway refused a queued task, which was dropped from the queue.
    AdmissionAbandoned(TaskId),
    /// The in-flight task has not started yet and is within its window.
    Waiting(TaskId),
    /// The in-flight task is loading; its record was refreshed.
    Progressed {
        /// The task.
        task_id: TaskId,
        /// Status written back.
        status: TaskStatus,
    },
    /// The in-flight task finished and was removed.
    Completed(TaskId),
    /// The in-flight task failed or stalled; it was removed and reported.
    Aborted {
        /// The task.
        task_id: TaskId,
        /// Why it was given up on.
        reason: AbortReason,
    },
}

/// Drives tasks through their lifecycle against the remote services.
pub struct LifecycleController {
    store: Arc<dyn QueueStoreClient>,
    gateway: Arc<dyn ExecutorGatewayClient>,
    notifier: Arc<dyn NotifierClient>,
    clock: Arc<dyn Clock>,
    config: ManagerConfig,
    tick_lock: Mutex<()>,
}

impl LifecycleController {
    /// Create a new controller.
    #[must_use]
    pub fn new(
        store: Arc<dyn QueueStoreClient>,
        gateway: Arc<dyn ExecutorGatewayClient>,
        notifier: Arc<dyn NotifierClient>,
        clock: Arc<dyn Clock>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            clock,
            config,
            tick_lock: Mutex::new(()),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Run ticks on the configured period until `shutdown` resolves.
    ///
    /// A tick in progress always finishes before shutdown is observed.
    /// Failed ticks are logged; the next tick re-reads the store.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tracing::info!(
            enabled = self.config.enabled,
            waiting_timeout_seconds = self.config.waiting_timeout_seconds,
            tick_interval_seconds = self.config.tick_interval_seconds,
            "Lifecycle controller starting"
        );

        if !self.config.enabled {
            tracing::info!("Lifecycle controller disabled; no ticks will run");
            shutdown.await;
            return;
        }

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Lifecycle controller stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(outcome) => tracing::debug!(?outcome, "Tick finished"),
                        Err(e) => tracing::error!(error = %e, "Tick failed"),
                    }
                }
            }
        }
    }

    /// Run one pass of the control loop.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::RemoteCall` if a queue store or notifier call
    /// fails after its retries. Gateway failures are handled in place.
    pub async fn tick(&self) -> Result<TickOutcome> {
        if !self.config.enabled {
            return Ok(TickOutcome::Disabled);
        }

        let Ok(_guard) = self.tick_lock.try_lock() else {
            tracing::debug!("Previous tick still running; skipping");
            return Ok(TickOutcome::Skipped);
        };

        tracing::debug!("Looking for a pending task");
        if let Some(task) = self.store.find_by_status(TaskStatus::Pending).await? {
            return self.check_status(task).await;
        }

        tracing::debug!("Looking for an active task");
        if let Some(task) = self.store.find_by_status(TaskStatus::Active).await? {
            return self.check_status(task).await;
        }

        self.admit_next().await
    }

    async fn admit_next(&self) -> Result<TickOutcome> {
        let Some(mut task) = self.store.find_next().await? else {
            tracing::debug!("Queue is empty");
            return Ok(TickOutcome::Idle);
        };
        let task_id = task.task_id;

        // The gateway addresses the work by the record's id, whatever the payload says.
        tracing::debug!(task_id = %task_id, "Sending task to the gateway");
        if let Err(e) = self.gateway.start(&task.options.for_task(task_id)).await {
            tracing::error!(
                task_id = %task_id,
                error = %e,
                "Gateway refused task; dropping it from the queue"
            );
            self.store.delete(&task_id).await?;
            return Ok(TickOutcome::AdmissionAbandoned(task_id));
        }

        task.transition(TaskStatus::Pending, self.clock.now());
        self.store.update(&task).await?;
        tracing::info!(task_id = %task_id, "Task handed to the gateway");

        Ok(TickOutcome::Admitted(task_id))
    }

    async fn check_status(&self, mut task: Task) -> Result<TickOutcome> {
        let task_id = task.task_id;
        let now = self.clock.now();
        let timeout = self.config.waiting_timeout();

        tracing::debug!(task_id = %task_id, status = %task.status, "Checking task status");
        let transition = match self.gateway.status(&task_id, &task.dataset_id()).await {
            Ok(report) => {
                let stale = task.is_stale(now, timeout).then(|| task.waited(now));
                lifecycle::decide(task.status, report.status, stale)
            }
            Err(e) => Transition::Abort(AbortReason::StatusQueryFailed(e.to_string())),
        };

        match transition {
            Transition::Wait => {
                tracing::debug!(task_id = %task_id, "Task not started yet");
                Ok(TickOutcome::Waiting(task_id))
            }
            Transition::Promote { status } => {
                task.transition(status, now);
                self.store.update(&task).await?;
                tracing::debug!(task_id = %task_id, status = %status, "Task is loading");
                Ok(TickOutcome::Progressed { task_id, status })
            }
            Transition::Complete => {
                self.store.delete(&task_id).await?;
                tracing::info!(task_id = %task_id, "Task complete");
                Ok(TickOutcome::Completed(task_id))
            }
            Transition::Abort(reason) => {
                tracing::error!(task_id = %task_id, reason = %reason, "Aborting task");
                self.store.delete(&task_id).await?;
                self.notifier
                    .report_status(&task_id, StatusReportRequest::loading_error())
                    .await?;
                Ok(TickOutcome::Aborted { task_id, reason })
            }
        }
    }
}
