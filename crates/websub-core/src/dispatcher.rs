//! Hub protocol entry point.
//!
//! Turns a flat `hub.*` parameter map into a subscribe, unsubscribe or publish
//! intent and hands the slow work to the background engines. The outcome
//! returned here only means "accepted for processing".

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::HubConfig;
use crate::distribution::DistributionEngine;
use crate::error::HubError;
use crate::http::SharedHttpClient;
use crate::store::SharedStore;
use crate::tasks::TaskPool;
use crate::verification::{VerificationEngine, VerifyMode};

/// Request parameter names.
pub mod keys {
    /// Intent selector.
    pub const MODE: &str = "hub.mode";
    /// Subscriber callback URL.
    pub const CALLBACK: &str = "hub.callback";
    /// Topic URL.
    pub const TOPIC: &str = "hub.topic";
    /// Optional delivery signing secret.
    pub const SECRET: &str = "hub.secret";
    /// Optional lease in seconds.
    pub const LEASE_SECONDS: &str = "hub.lease_seconds";
    /// Optional fetch target overriding the topic on publish.
    pub const URL: &str = "hub.url";
}

/// Protocol-level outcome of a valid request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubResponse {
    /// Subscribe/unsubscribe accepted; verification runs in the background.
    Accepted,
    /// Publish acknowledged; distribution runs in the background.
    Ok,
}

/// A validated hub request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubRequest {
    /// Create or renew a subscription.
    Subscribe {
        /// Subscriber callback URL.
        callback_url: String,
        /// Topic URL.
        topic_url: String,
        /// Delivery signing secret.
        secret: Option<String>,
        /// Lease in seconds; `0` never expires.
        lease_seconds: i64,
    },
    /// Remove a subscription.
    Unsubscribe {
        /// Subscriber callback URL.
        callback_url: String,
        /// Topic URL.
        topic_url: String,
    },
    /// Announce a topic update.
    Publish {
        /// Updated topic; a publish without one is a no-op.
        topic_url: Option<String>,
        /// Resource to fetch instead of the topic URL.
        resource_url: Option<String>,
    },
}

impl HubRequest {
    /// Validate a parameter map.
    pub fn parse(params: &HashMap<String, String>) -> Result<Self, HubError> {
        match param(params, keys::MODE) {
            Some("subscribe") => {
                let (callback_url, topic_url) = required_pair(params)?;
                Ok(HubRequest::Subscribe {
                    callback_url,
                    topic_url,
                    secret: param(params, keys::SECRET).map(str::to_string),
                    lease_seconds: param(params, keys::LEASE_SECONDS)
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(0),
                })
            }
            Some("unsubscribe") => {
                let (callback_url, topic_url) = required_pair(params)?;
                Ok(HubRequest::Unsubscribe {
                    callback_url,
                    topic_url,
                })
            }
            Some("publish") => Ok(HubRequest::Publish {
                topic_url: param(params, keys::TOPIC).map(str::to_string),
                resource_url: param(params, keys::URL).map(str::to_string),
            }),
            _ => Err(HubError::UnsupportedMode(
                params.get(keys::MODE).cloned().unwrap_or_default(),
            )),
        }
    }
}

/// Non-empty value of a parameter.
fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn required_pair(params: &HashMap<String, String>) -> Result<(String, String), HubError> {
    let callback =
        param(params, keys::CALLBACK).ok_or(HubError::MissingParameter(keys::CALLBACK))?;
    let topic = param(params, keys::TOPIC).ok_or(HubError::MissingParameter(keys::TOPIC))?;
    Ok((callback.to_string(), topic.to_string()))
}

/// Single entry point for inbound hub requests.
#[derive(Clone)]
pub struct HubDispatcher {
    store: SharedStore,
    verification: VerificationEngine,
    distribution: DistributionEngine,
    pool: TaskPool,
}

impl HubDispatcher {
    /// Wire the engines over a store and an HTTP capability.
    pub fn new(config: &HubConfig, store: SharedStore, http: SharedHttpClient) -> Self {
        let pool = TaskPool::new(config.max_concurrent_tasks);
        let verification = VerificationEngine::new(http.clone(), pool.clone());
        let distribution =
            DistributionEngine::new(http, store.clone(), pool.clone(), &config.hub_url);

        Self {
            store,
            verification,
            distribution,
            pool,
        }
    }

    /// Validate and dispatch a raw parameter map.
    ///
    /// Must be called from within a Tokio runtime. Returns before any
    /// verification or distribution has completed.
    pub fn handle(&self, params: &HashMap<String, String>) -> Result<HubResponse, HubError> {
        match HubRequest::parse(params) {
            Ok(request) => Ok(self.dispatch(request)),
            Err(e) => {
                info!(error = %e, "rejected hub request");
                Err(e)
            }
        }
    }

    /// Dispatch a validated request.
    pub fn dispatch(&self, request: HubRequest) -> HubResponse {
        match request {
            HubRequest::Subscribe {
                callback_url,
                topic_url,
                secret,
                lease_seconds,
            } => {
                info!(
                    callback = %callback_url,
                    topic = %topic_url,
                    lease_seconds,
                    "accepted subscribe request"
                );
                let store = self.store.clone();
                self.verification.verify(
                    callback_url,
                    topic_url,
                    VerifyMode::Subscribe,
                    move |callback, topic| {
                        store
                            .upsert(callback, topic, secret.as_deref(), lease_seconds)
                            .map(|_| ())
                    },
                );
                HubResponse::Accepted
            }
            HubRequest::Unsubscribe {
                callback_url,
                topic_url,
            } => {
                info!(
                    callback = %callback_url,
                    topic = %topic_url,
                    "accepted unsubscribe request"
                );
                let store = self.store.clone();
                self.verification.verify(
                    callback_url,
                    topic_url,
                    VerifyMode::Unsubscribe,
                    move |callback, topic| {
                        if !store.delete(callback, topic)? {
                            debug!(callback, topic, "no subscription to remove");
                        }
                        Ok(())
                    },
                );
                HubResponse::Accepted
            }
            HubRequest::Publish {
                topic_url: Some(topic_url),
                resource_url,
            } => {
                info!(topic = %topic_url, url = ?resource_url, "accepted publish request");
                self.distribution.distribute(topic_url, resource_url);
                HubResponse::Ok
            }
            HubRequest::Publish {
                topic_url: None, ..
            } => {
                debug!("publish without hub.topic ignored");
                HubResponse::Ok
            }
        }
    }

    /// The subscription store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The verification engine.
    pub fn verification(&self) -> &VerificationEngine {
        &self.verification
    }

    /// The distribution engine.
    pub fn distribution(&self) -> &DistributionEngine {
        &self.distribution
    }

    /// Number of background tasks still pending or running.
    pub fn in_flight(&self) -> usize {
        self.pool.in_flight()
    }

    /// Wait for every scheduled verification and delivery to finish.
    pub async fn wait_idle(&self) {
        self.pool.wait_idle().await;
    }
}
