use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use order_dispatch::api;
use order_dispatch::config::Config;
use order_dispatch::engine::sync::SyncLoop;
use order_dispatch::error::AppError;
use order_dispatch::print::{ChannelPrintConnector, PrintJob};
use order_dispatch::state::AppState;
use order_dispatch::store::{HttpOrderStore, InMemoryOrderStore, OrderStore};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let store: Arc<dyn OrderStore> = match &config.order_store_url {
        Some(url) => {
            tracing::info!(url = %url, "using remote order store");
            Arc::new(HttpOrderStore::new(url, config.order_store_timeout)?)
        }
        None => {
            tracing::warn!("ORDER_STORE_URL not set; using an empty in-memory order store");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    let (connector, print_rx) = ChannelPrintConnector::new(config.print_queue_size);
    tokio::spawn(forward_print_jobs(print_rx));

    let shared_state = Arc::new(AppState::new(
        store,
        Arc::new(connector),
        config.event_buffer_size,
    ));

    let mut sync_loop = SyncLoop::new(shared_state.clone(), config.poll_interval);
    sync_loop.start();

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")));

    sync_loop.stop().await;
    served
}

/// Hands queued tickets to the print connector process. Its success/failure
/// reports come back through `POST /print/signals`.
async fn forward_print_jobs(mut jobs: mpsc::Receiver<PrintJob>) {
    while let Some(job) = jobs.recv().await {
        match serde_json::to_string(&job) {
            Ok(payload) => tracing::info!(
                order_id = %job.order.id,
                printer = %job.printer.name,
                bytes = payload.len(),
                "print job handed to connector"
            ),
            Err(err) => tracing::error!(order_id = %job.order.id, error = %err, "print job not serializable"),
        }
    }

    tracing::warn!("print queue closed");
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
