//! WebSub hub HTTP server.
//!
//! Exposes the hub endpoint over HTTP and wires the core engines to a
//! subscription store, an outbound HTTP client and a background purge task.

pub mod config;
pub mod error;
pub mod purge;
pub mod routes;

pub use config::{Args, ServerConfig};
pub use error::AppError;
pub use purge::PurgeTask;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use websub_core::{
    HubDispatcher, MemorySubscriptionStore, SharedStore, SledSubscriptionStore,
    SubscriptionStore,
};

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Hub protocol dispatcher.
    pub dispatcher: HubDispatcher,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create new application state.
    pub fn new(dispatcher: HubDispatcher, config: ServerConfig) -> Self {
        Self {
            dispatcher,
            config: Arc::new(config),
        }
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::root::routes())
        .merge(routes::hub::routes())
        .merge(routes::health::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the subscription store selected by `config`.
pub fn open_store(config: &ServerConfig) -> websub_core::Result<SharedStore> {
    if config.in_memory {
        tracing::warn!("using in-memory subscription store, subscriptions are lost on restart");
        return Ok(Arc::new(MemorySubscriptionStore::new()));
    }

    let store = SledSubscriptionStore::open(&config.store_config())?;
    tracing::info!(
        data_path = %config.data_path.display(),
        recovered = store.was_recovered(),
        subscriptions = store.len()?,
        "subscription store opened"
    );
    Ok(Arc::new(store))
}
