//! Load Manager - Task Lifecycle Service
//!
//! Runs the lifecycle controller on a timer and serves the admission API.
//!
//! # Notifier Integration
//!
//! Set `NOTIFIER_URL` to report failed tasks to the scheduler. If not set,
//! failures are only logged.

use std::sync::Arc;

use load_manager_clients::{
    ClientConfig, HttpExecutorGatewayClient, HttpNotifierClient, HttpQueueStoreClient,
    NoopNotifierClient, NotifierClient,
};
use load_manager_control::{
    create_router, AdmissionService, LifecycleController, ManagerConfig, SystemClock,
};
use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,load_manager=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Load Manager");

    // Load configuration from environment
    let manager_config = ManagerConfig::from_env();
    let client_config = ClientConfig::from_env();

    tracing::info!(
        listen_addr = %manager_config.listen_addr,
        queue_store_url = %client_config.queue_store_url,
        gateway_url = %client_config.gateway_url,
        notifier_url = ?client_config.notifier_url,
        max_retries = client_config.max_retries,
        retry_delay_ms = client_config.retry_delay_ms,
        "Load manager configuration loaded"
    );

    // Initialize collaborator clients
    let store = Arc::new(HttpQueueStoreClient::from_config(&client_config)?);
    let gateway = Arc::new(HttpExecutorGatewayClient::from_config(&client_config)?);
    let notifier: Arc<dyn NotifierClient> = match &client_config.notifier_url {
        Some(url) => {
            tracing::info!(notifier_url = %url, "Notifier integration enabled");
            Arc::new(HttpNotifierClient::from_config(&client_config, url.clone())?)
        }
        None => {
            tracing::warn!("No NOTIFIER_URL set - task failures will only be logged");
            Arc::new(NoopNotifierClient::new())
        }
    };

    // Start the control loop
    let controller = Arc::new(LifecycleController::new(
        store.clone(),
        gateway.clone(),
        notifier.clone(),
        Arc::new(SystemClock),
        manager_config.clone(),
    ));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let control_loop = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move {
            controller
                .run(async {
                    let _ = stop_rx.await;
                })
                .await;
        }
    });

    // Create router
    let admission = Arc::new(AdmissionService::new(store, gateway, notifier));
    let app = create_router(admission);

    // Start server
    tracing::info!(listen_addr = %manager_config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&manager_config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let the current tick finish
    let _ = stop_tx.send(());
    control_loop.await?;
    tracing::info!("Load Manager stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
