//! Task lifecycle control for the load manager.
//!
//! The load manager keeps at most one loading task in flight. It owns no
//! storage: every decision is read from and written back to the queue store,
//! and the loading itself happens in the execution gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐      ┌──────────────────────────┐
//! │  HTTP layer (api)        │      │  Tick timer (run)        │
//! └────────────┬─────────────┘      └────────────┬─────────────┘
//!              ▼                                 ▼
//! ┌──────────────────────────┐      ┌──────────────────────────┐
//! │  AdmissionService        │      │  LifecycleController     │
//! │  submit / cancel         │      │  admit / check / abort   │
//! └────────────┬─────────────┘      └────────────┬─────────────┘
//!              └───────────────┬─────────────────┘
//!               ┌──────────────┼──────────────┐
//!               ▼              ▼              ▼
//!        ┌──────────┐   ┌──────────┐   ┌──────────┐
//!        │  Queue   │   │ Gateway  │   │ Notifier │
//!        │  store   │   │          │   │          │
//!        └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use load_manager_clients::{
//!     ClientConfig, HttpExecutorGatewayClient, HttpQueueStoreClient, NoopNotifierClient,
//! };
//! use load_manager_control::{LifecycleController, ManagerConfig, SystemClock};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let clients = ClientConfig::from_env();
//! let controller = LifecycleController::new(
//!     Arc::new(HttpQueueStoreClient::from_config(&clients)?),
//!     Arc::new(HttpExecutorGatewayClient::from_config(&clients)?),
//!     Arc::new(NoopNotifierClient::new()),
//!     Arc::new(SystemClock),
//!     ManagerConfig::from_env(),
//! );
//!
//! let outcome = controller.tick().await?;
//! println!("tick: {outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! See the [`lifecycle`] module for the status transition table.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod admission;
pub mod api;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod lifecycle;

pub use admission::{Admission, AdmissionService};
pub use api::{create_router, ApiError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ManagerConfig;
pub use controller::{LifecycleController, TickOutcome};
pub use error::{ControlError, Result};
pub use lifecycle::{AbortReason, Transition};
