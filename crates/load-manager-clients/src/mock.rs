//! In-memory collaborators for testing without the remote services.
//!
//! Every mock records the calls it receives and can be told to fail a named
//! operation. Injected failures look like exhausted remote calls.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use load_manager_core::{
    DatasetId, LoaderStatus, LoaderStatusReport, StatusReportRequest, Task, TaskId, TaskOptions,
    TaskStatus,
};
use parking_lot::Mutex;

use crate::error::{ClientError, Result};
use crate::gateway::ExecutorGatewayClient;
use crate::notifier::NotifierClient;
use crate::queue_store::QueueStoreClient;

fn injected(operation: &'static str, target: impl ToString) -> ClientError {
    ClientError::RemoteCall {
        operation,
        target: target.to_string(),
        attempts: 1,
        reason: "injected failure".to_string(),
    }
}

/// A call received by [`InMemoryQueueStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `create`
    Create(TaskId),
    /// `get_by_id`
    GetById(TaskId),
    /// `find_by_status`
    FindByStatus(TaskStatus),
    /// `find_next`
    FindNext,
    /// `update`, with the status written.
    Update(TaskId, TaskStatus),
    /// `delete`
    Delete(TaskId),
}

impl StoreCall {
    /// Returns true for calls that change the store.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::Create(_) | Self::Update(..) | Self::Delete(_))
    }
}

#[derive(Default)]
struct StoreState {
    tasks: Vec<Task>,
    calls: Vec<StoreCall>,
    failing: HashSet<&'static str>,
}

/// A queue store that keeps tasks in submission order.
#[derive(Default)]
pub struct InMemoryQueueStore {
    state: Mutex<StoreState>,
}

impl InMemoryQueueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a task into the store without recording a call.
    pub fn insert(&self, task: Task) {
        self.state.lock().tasks.push(task);
    }

    /// Get a task without recording a call.
    #[must_use]
    pub fn get(&self, task_id: &TaskId) -> Option<Task> {
        self.state
            .lock()
            .tasks
            .iter()
            .find(|t| t.task_id == *task_id)
            .cloned()
    }

    /// All stored tasks in submission order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    /// Number of tasks that are `Pending` or `Active`.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.state
            .lock()
            .tasks
            .iter()
            .filter(|t| t.status.is_in_flight())
            .count()
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().calls.clone()
    }

    /// The calls that changed the store.
    #[must_use]
    pub fn mutations(&self) -> Vec<StoreCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Make an operation (e.g. `queue_store.delete`) fail until recovered.
    pub fn fail(&self, operation: &'static str) {
        self.state.lock().failing.insert(operation);
    }

    /// Stop failing an operation.
    pub fn recover(&self, operation: &'static str) {
        self.state.lock().failing.remove(operation);
    }

    fn record(&self, call: StoreCall, operation: &'static str, target: impl ToString) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.failing.contains(operation) {
            return Err(injected(operation, target));
        }
        Ok(())
    }
}

#[async_trait]
impl QueueStoreClient for InMemoryQueueStore {
    async fn create(&self, options: &TaskOptions) -> Result<TaskStatus> {
        let task_id = options.task_id.unwrap_or_else(TaskId::generate);
        self.record(StoreCall::Create(task_id), "queue_store.create", task_id)?;
        let task = Task::queued(task_id, options, Utc::now());
        let status = task.status;
        self.state.lock().tasks.push(task);
        Ok(status)
    }

    async fn get_by_id(&self, task_id: &TaskId) -> Result<Option<Task>> {
        self.record(StoreCall::GetById(*task_id), "queue_store.get_by_id", task_id)?;
        Ok(self.get(task_id))
    }

    async fn find_by_status(&self, status: TaskStatus) -> Result<Option<Task>> {
        self.record(
            StoreCall::FindByStatus(status),
            "queue_store.find_by_status",
            status,
        )?;
        Ok(self
            .state
            .lock()
            .tasks
            .iter()
            .find(|t| t.status == status)
            .cloned())
    }

    async fn find_next(&self) -> Result<Option<Task>> {
        self.record(StoreCall::FindNext, "queue_store.find_next", "queue")?;
        Ok(self
            .state
            .lock()
            .tasks
            .iter()
            .find(|t| t.status == TaskStatus::Queued)
            .cloned())
    }

    async fn update(&self, task: &Task) -> Result<Task> {
        self.record(
            StoreCall::Update(task.task_id, task.status),
            "queue_store.update",
            task.task_id,
        )?;
        let mut state = self.state.lock();
        match state.tasks.iter_mut().find(|t| t.task_id == task.task_id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(task.clone())
            }
            None => Err(ClientError::RemoteCall {
                operation: "queue_store.update",
                target: task.task_id.to_string(),
                attempts: 1,
                reason: "status 404 Not Found".to_string(),
            }),
        }
    }

    async fn delete(&self, task_id: &TaskId) -> Result<bool> {
        self.record(StoreCall::Delete(*task_id), "queue_store.delete", task_id)?;
        let mut state = self.state.lock();
        let before = state.tasks.len();
        state.tasks.retain(|t| t.task_id != *task_id);
        Ok(state.tasks.len() < before)
    }
}

struct GatewayState {
    statuses: HashMap<TaskId, LoaderStatus>,
    started: Vec<TaskOptions>,
    status_queries: Vec<TaskId>,
    stopped: Vec<TaskId>,
    stop_ack: bool,
    failing: HashSet<&'static str>,
}

impl Default for GatewayState {
    fn default() -> Self {
        Self {
            statuses: HashMap::new(),
            started: Vec::new(),
            status_queries: Vec::new(),
            stopped: Vec::new(),
            stop_ack: true,
            failing: HashSet::new(),
        }
    }
}

/// A gateway whose remote statuses are set by the test.
///
/// Started tasks report `NotStarted` until told otherwise. Querying a task
/// the gateway has never seen fails like an unreachable gateway.
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<GatewayState>,
}

impl MockGateway {
    /// Create a gateway with no tasks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the remote status reported for a task.
    pub fn set_status(&self, task_id: TaskId, status: LoaderStatus) {
        self.state.lock().statuses.insert(task_id, status);
    }

    /// Set the acknowledgement returned by `stop`.
    pub fn set_stop_ack(&self, ack: bool) {
        self.state.lock().stop_ack = ack;
    }

    /// Make an operation (e.g. `gateway.start`) fail until recovered.
    pub fn fail(&self, operation: &'static str) {
        self.state.lock().failing.insert(operation);
    }

    /// Stop failing an operation.
    pub fn recover(&self, operation: &'static str) {
        self.state.lock().failing.remove(operation);
    }

    /// Payloads passed to `start`, in call order.
    #[must_use]
    pub fn started(&self) -> Vec<TaskOptions> {
        self.state.lock().started.clone()
    }

    /// Tasks passed to `status`, in call order.
    #[must_use]
    pub fn status_queries(&self) -> Vec<TaskId> {
        self.state.lock().status_queries.clone()
    }

    /// Tasks passed to `stop`, in call order.
    #[must_use]
    pub fn stopped(&self) -> Vec<TaskId> {
        self.state.lock().stopped.clone()
    }

    /// Total number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        let state = self.state.lock();
        state.started.len() + state.status_queries.len() + state.stopped.len()
    }
}

#[async_trait]
impl ExecutorGatewayClient for MockGateway {
    async fn start(&self, options: &TaskOptions) -> Result<()> {
        let mut state = self.state.lock();
        state.started.push(options.clone());
        let Some(task_id) = options.task_id else {
            return Err(injected("gateway.start", options.dataset_id));
        };
        if state.failing.contains("gateway.start") {
            return Err(injected("gateway.start", task_id));
        }
        state
            .statuses
            .entry(task_id)
            .or_insert(LoaderStatus::NotStarted);
        Ok(())
    }

    async fn status(&self, task_id: &TaskId, dataset_id: &DatasetId) -> Result<LoaderStatusReport> {
        let mut state = self.state.lock();
        state.status_queries.push(*task_id);
        if state.failing.contains("gateway.status") {
            return Err(injected("gateway.status", task_id));
        }
        let status = state
            .statuses
            .get(task_id)
            .copied()
            .ok_or_else(|| injected("gateway.status", task_id))?;
        Ok(LoaderStatusReport {
            task_id: *task_id,
            dataset_id: *dataset_id,
            status,
        })
    }

    async fn stop(&self, task_id: &TaskId, _dataset_id: &DatasetId) -> Result<bool> {
        let mut state = self.state.lock();
        state.stopped.push(*task_id);
        if state.failing.contains("gateway.stop") {
            return Err(injected("gateway.stop", task_id));
        }
        state.statuses.remove(task_id);
        Ok(state.stop_ack)
    }
}

#[derive(Default)]
struct NotifierState {
    reports: Vec<(TaskId, StatusReportRequest)>,
    failing: bool,
}

/// A notifier that remembers every report.
#[derive(Default)]
pub struct RecordingNotifier {
    state: Mutex<NotifierState>,
}

impl RecordingNotifier {
    /// Create a notifier with no reports.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received, in call order.
    #[must_use]
    pub fn reports(&self) -> Vec<(TaskId, StatusReportRequest)> {
        self.state.lock().reports.clone()
    }

    /// Task ids reported, in call order.
    #[must_use]
    pub fn reported_ids(&self) -> Vec<TaskId> {
        self.state.lock().reports.iter().map(|(id, _)| *id).collect()
    }

    /// Make every report fail.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }
}

#[async_trait]
impl NotifierClient for RecordingNotifier {
    async fn report_status(&self, task_id: &TaskId, report: StatusReportRequest) -> Result<()> {
        let mut state = self.state.lock();
        state.reports.push((*task_id, report));
        if state.failing {
            return Err(injected("notifier.report_status", task_id));
        }
        Ok(())
    }
}

/// Build a task with the given status and `updated_at`.
#[must_use]
pub fn task_with_status(status: TaskStatus, updated_at: DateTime<Utc>) -> Task {
    let task_id = TaskId::generate();
    let mut task = Task::queued(
        task_id,
        &TaskOptions::new(task_id, DatasetId::generate()),
        updated_at,
    );
    task.status = status;
    task
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_finds_earliest_queued_first() {
        let store = InMemoryQueueStore::new();
        let now = Utc::now();
        let first = task_with_status(TaskStatus::Queued, now);
        let second = task_with_status(TaskStatus::Queued, now);
        store.insert(first.clone());
        store.insert(second);

        let next = store.find_next().await.unwrap().unwrap();
        assert_eq!(next.task_id, first.task_id);
        assert_eq!(store.calls(), vec![StoreCall::FindNext]);
        assert!(store.mutations().is_empty());
    }

    #[tokio::test]
    async fn store_update_and_delete() {
        let store = InMemoryQueueStore::new();
        let mut task = task_with_status(TaskStatus::Queued, Utc::now());
        store.insert(task.clone());

        task.status = TaskStatus::Pending;
        store.update(&task).await.unwrap();
        assert_eq!(store.in_flight_count(), 1);

        assert!(store.delete(&task.task_id).await.unwrap());
        assert!(!store.delete(&task.task_id).await.unwrap());
        assert!(store.update(&task).await.is_err());
    }

    #[tokio::test]
    async fn store_injected_failure() {
        let store = InMemoryQueueStore::new();
        store.fail("queue_store.find_next");
        let err = store.find_next().await.unwrap_err();
        assert_eq!(err.operation(), Some("queue_store.find_next"));

        store.recover("queue_store.find_next");
        assert!(store.find_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn gateway_reports_not_started_after_start() {
        let gateway = MockGateway::new();
        let task_id = TaskId::generate();
        let options = TaskOptions::new(task_id, DatasetId::generate());

        gateway.start(&options).await.unwrap();
        let report = gateway
            .status(&task_id, &options.dataset_id)
            .await
            .unwrap();
        assert_eq!(report.status, LoaderStatus::NotStarted);

        gateway.set_status(task_id, LoaderStatus::Loading);
        let report = gateway
            .status(&task_id, &options.dataset_id)
            .await
            .unwrap();
        assert_eq!(report.status, LoaderStatus::Loading);
        assert_eq!(gateway.call_count(), 3);
    }

    #[tokio::test]
    async fn notifier_records_even_when_failing() {
        let notifier = RecordingNotifier::new();
        let task_id = TaskId::generate();
        notifier.set_failing(true);

        assert!(notifier
            .report_status(&task_id, StatusReportRequest::loading_error())
            .await
            .is_err());
        assert_eq!(notifier.reported_ids(), vec![task_id]);
    }
}
