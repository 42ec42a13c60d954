//! Clients for the services the load manager orchestrates.
//!
//! The manager owns no storage and executes no work itself. Every durable
//! fact lives in the queue store, every piece of work runs in the execution
//! gateway, and failures are reported to the scheduler notifier. This crate
//! wraps each of those services behind a trait:
//!
//! - [`QueueStoreClient`]: find, create, update and delete task records
//! - [`ExecutorGatewayClient`]: start, query and stop loading work
//! - [`NotifierClient`]: report terminal failures upstream
//!
//! The HTTP implementations share one contract: a non-success response,
//! transport failure or undecodable body is retried a fixed number of times
//! with a fixed delay (see [`RetryPolicy`]), after which the call fails with
//! [`ClientError::RemoteCall`]. Calls carry no idempotency token, so a
//! retried `create` or `start` may reach the remote service twice.
//!
//! # Usage
//!
//! ```no_run
//! use load_manager_clients::{ClientConfig, HttpQueueStoreClient, QueueStoreClient};
//! use load_manager_core::TaskStatus;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env();
//! let store = HttpQueueStoreClient::from_config(&config)?;
//!
//! if let Some(task) = store.find_by_status(TaskStatus::Pending).await? {
//!     println!("pending task: {}", task.task_id);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod gateway;
mod http;
pub mod notifier;
pub mod queue_store;
pub mod retry;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use gateway::{ExecutorGatewayClient, HttpExecutorGatewayClient};
pub use notifier::{HttpNotifierClient, NoopNotifierClient, NotifierClient};
pub use queue_store::{HttpQueueStoreClient, QueueStoreClient};
pub use retry::RetryPolicy;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{InMemoryQueueStore, MockGateway, RecordingNotifier, StoreCall};
