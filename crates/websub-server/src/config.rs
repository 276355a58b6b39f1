//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use websub_core::config::{DEFAULT_HUB_URL, DEFAULT_MAX_CONCURRENT_TASKS};
use websub_core::{HubConfig, StoreConfig};

/// Default address for the HTTP listener.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Default outbound request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default interval between expired-subscription purges in seconds (1 hour).
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 3600;

/// WebSub hub server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub listen_addr: String,

    /// Public URL of the hub endpoint, advertised to subscribers.
    pub hub_url: String,

    /// Path to the subscription database directory.
    pub data_path: PathBuf,

    /// Keep subscriptions in memory only.
    pub in_memory: bool,

    /// Timeout for every outbound HTTP call.
    pub request_timeout: Duration,

    /// Bound on concurrently running verification and delivery tasks.
    pub max_concurrent_tasks: usize,

    /// Interval between purges of expired subscriptions. None disables purging.
    pub purge_interval: Option<Duration>,
}

impl ServerConfig {
    /// Create a configuration storing subscriptions under `data_path`.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            hub_url: DEFAULT_HUB_URL.to_string(),
            data_path: data_path.into(),
            in_memory: false,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            purge_interval: Some(Duration::from_secs(DEFAULT_PURGE_INTERVAL_SECS)),
        }
    }

    /// Set the listen address.
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    /// Set the advertised hub URL.
    pub fn with_hub_url(mut self, url: impl Into<String>) -> Self {
        self.hub_url = url.into();
        self
    }

    /// Use the volatile in-memory store.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Set the outbound request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the background task bound.
    pub fn with_max_concurrent_tasks(mut self, tasks: usize) -> Self {
        self.max_concurrent_tasks = tasks.max(1);
        self
    }

    /// Set the purge interval.
    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = Some(interval);
        self
    }

    /// Disable periodic purging.
    pub fn without_purge(mut self) -> Self {
        self.purge_interval = None;
        self
    }

    /// Engine configuration derived from this server configuration.
    pub fn hub_config(&self) -> HubConfig {
        HubConfig::new(self.hub_url.clone())
            .with_request_timeout(self.request_timeout)
            .with_max_concurrent_tasks(self.max_concurrent_tasks)
    }

    /// Store configuration for the persistent backend.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.data_path)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("./data")
    }
}

/// Command-line arguments for the hub server.
#[derive(Parser, Debug)]
#[command(name = "websub-server")]
#[command(version, about = "WebSub Hub Server", long_about = None)]
pub struct Args {
    /// Address to listen on for HTTP requests.
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: String,

    /// Public URL of the hub endpoint, sent in delivery Link headers.
    #[arg(long, default_value = DEFAULT_HUB_URL)]
    pub hub_url: String,

    /// Path to the subscription database directory.
    #[arg(short, long, default_value = "./data")]
    pub data_path: PathBuf,

    /// Keep subscriptions in memory; they are lost on restart.
    #[arg(long)]
    pub in_memory: bool,

    /// Timeout (ms) for verification, fetch and delivery requests.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub request_timeout_ms: u64,

    /// Maximum number of background tasks running at once.
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_TASKS)]
    pub max_tasks: usize,

    /// Expired-subscription purge interval in seconds. Set to 0 to disable.
    #[arg(long, default_value_t = DEFAULT_PURGE_INTERVAL_SECS)]
    pub purge_interval: u64,
}

impl Args {
    /// Convert command-line arguments to server configuration.
    pub fn into_config(self) -> ServerConfig {
        let purge_interval = if self.purge_interval == 0 {
            None
        } else {
            Some(Duration::from_secs(self.purge_interval))
        };

        ServerConfig {
            listen_addr: self.listen,
            hub_url: self.hub_url,
            data_path: self.data_path,
            in_memory: self.in_memory,
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_concurrent_tasks: self.max_tasks.max(1),
            purge_interval,
        }
    }
}
