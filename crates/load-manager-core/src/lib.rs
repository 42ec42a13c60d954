//! Core types for load-manager.
//!
//! This crate provides the foundational types shared by the clients and the
//! control loop:
//!
//! - **Identifiers**: Strongly-typed IDs for tasks and datasets
//! - **Tasks**: The queue record, its payload and its lifecycle status
//! - **Loader status**: What the execution gateway reports about a task
//!
//! # Example
//!
//! ```
//! use load_manager_core::{DatasetId, Task, TaskId, TaskOptions, TaskStatus};
//! use chrono::Utc;
//!
//! let task_id = TaskId::generate();
//! let options = TaskOptions::new(task_id, DatasetId::generate());
//! let task = Task::queued(task_id, &options, Utc::now());
//! assert_eq!(task.status, TaskStatus::Queued);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod loader;
pub mod task;

pub use error::{CoreError, Result};
pub use ids::{DatasetId, IdError, TaskId};
pub use loader::{LoaderStatus, LoaderStatusReport, StatusReportRequest};
pub use task::{Task, TaskOptions, TaskStatus};
