//! Task submission and cancellation.
//!
//! Calls arrive from the HTTP layer concurrently with the control loop. No
//! local locking is needed; all coordination state lives in the queue store.

use std::sync::Arc;

use async_trait::async_trait;
use load_manager_clients::{ExecutorGatewayClient, NotifierClient, QueueStoreClient};
use load_manager_core::{StatusReportRequest, TaskId, TaskOptions, TaskStatus};

use crate::error::{ControlError, Result};

/// Entry points for adding tasks to the queue and removing them.
#[async_trait]
pub trait Admission: Send + Sync {
    /// Queue a task. Returns the status the queue store assigned.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::RemoteCall` if the queue store cannot be reached.
    async fn submit(&self, options: TaskOptions) -> Result<TaskStatus>;

    /// Remove a task, stopping it in the gateway first if it was dispatched.
    ///
    /// Returns whether the queue store reported a deletion.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::TaskNotFound` if the task is not in the store.
    /// Returns `ControlError::RemoteCall` if a collaborator cannot be reached;
    /// a failed stop leaves the task in the store.
    async fn cancel(&self, task_id: &TaskId) -> Result<bool>;
}

/// Admission backed by the remote collaborators.
pub struct AdmissionService {
    store: Arc<dyn QueueStoreClient>,
    gateway: Arc<dyn ExecutorGatewayClient>,
    notifier: Arc<dyn NotifierClient>,
}

impl AdmissionService {
    /// Create a new admission service.
    #[must_use]
    pub fn new(
        store: Arc<dyn QueueStoreClient>,
        gateway: Arc<dyn ExecutorGatewayClient>,
        notifier: Arc<dyn NotifierClient>,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
        }
    }
}

#[async_trait]
impl Admission for AdmissionService {
    async fn submit(&self, options: TaskOptions) -> Result<TaskStatus> {
        let status = self.store.create(&options).await?;
        tracing::info!(
            task_id = ?options.task_id,
            dataset_id = %options.dataset_id,
            status = %status,
            "Task submitted"
        );
        Ok(status)
    }

    async fn cancel(&self, task_id: &TaskId) -> Result<bool> {
        let task = self
            .store
            .get_by_id(task_id)
            .await?
            .ok_or(ControlError::TaskNotFound(*task_id))?;

        if task.status == TaskStatus::Queued {
            let deleted = self.store.delete(task_id).await?;
            self.notifier
                .report_status(task_id, StatusReportRequest::loading_error())
                .await?;
            tracing::info!(task_id = %task_id, "Queued task cancelled");
            return Ok(deleted);
        }

        let acknowledged = self.gateway.stop(task_id, &task.dataset_id()).await?;
        if !acknowledged {
            tracing::warn!(
                task_id = %task_id,
                status = %task.status,
                "Gateway did not acknowledge stop; removing task anyway"
            );
        }

        let deleted = self.store.delete(task_id).await?;
        tracing::info!(task_id = %task_id, status = %task.status, "Dispatched task cancelled");
        Ok(deleted)
    }
}
