//! WebSub hub server binary.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use websub_core::{HubDispatcher, ReqwestHttpClient, SharedHttpClient};
use websub_server::{create_router, open_store, AppState, Args, PurgeTask};

/// How long shutdown waits for in-flight verifications and deliveries.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "websub_server=info,websub_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Args::parse().into_config();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.listen_addr,
        hub_url = %config.hub_url,
        in_memory = config.in_memory,
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        max_tasks = config.max_concurrent_tasks,
        "starting WebSub hub"
    );

    let store = open_store(&config)?;
    let http: SharedHttpClient = Arc::new(ReqwestHttpClient::new(config.request_timeout)?);
    let dispatcher = HubDispatcher::new(&config.hub_config(), store.clone(), http);

    let purge = config
        .purge_interval
        .map(|interval| PurgeTask::start(store.clone(), interval));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    let app = create_router(AppState::new(dispatcher.clone(), config.clone()));
    info!("hub listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(purge) = purge {
        purge.join().await;
    }

    let pending = dispatcher.in_flight();
    if pending > 0 {
        info!(pending, "waiting for background tasks");
        if tokio::time::timeout(DRAIN_TIMEOUT, dispatcher.wait_idle())
            .await
            .is_err()
        {
            warn!(
                pending = dispatcher.in_flight(),
                "background tasks still running at shutdown"
            );
        }
    }

    info!("hub shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl+c");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
