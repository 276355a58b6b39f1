//! Hub engine configuration.

use std::time::Duration;

use crate::http::DEFAULT_REQUEST_TIMEOUT;

/// Default public URL of the hub endpoint, advertised in delivery `Link` headers.
pub const DEFAULT_HUB_URL: &str = "http://localhost:8080/hub";

/// Default bound on concurrently running verification and delivery tasks.
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 64;

/// Configuration shared by the verification and distribution engines.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Public URL of this hub, advertised with `rel="hub"`.
    pub hub_url: String,

    /// Timeout applied to every outbound HTTP call.
    pub request_timeout: Duration,

    /// Maximum number of background tasks running at once.
    pub max_concurrent_tasks: usize,
}

impl HubConfig {
    /// Create a configuration for a hub reachable at `hub_url`.
    pub fn new(hub_url: impl Into<String>) -> Self {
        Self {
            hub_url: hub_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
        }
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
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_URL)
    }
}
