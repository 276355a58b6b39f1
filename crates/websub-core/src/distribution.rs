//! Fetch-once, fan-out-many content distribution.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::http::SharedHttpClient;
use crate::signature::{self, SIGNATURE_HEADER};
use crate::store::SharedStore;
use crate::subscription::{current_millis, Subscription};
use crate::tasks::TaskPool;

/// Content type used when the topic server does not send one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

/// Summary of one distribution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistributionReport {
    /// Whether the topic resource was fetched.
    pub fetched: bool,
    /// Number of deliveries scheduled.
    pub deliveries: usize,
}

/// Build the `Link` header advertising the hub and the topic.
pub fn link_header(hub_url: &str, topic_url: &str) -> String {
    format!("<{}>; rel=\"hub\", <{}>; rel=\"self\"", hub_url, topic_url)
}

/// Distributes topic updates to subscribers.
#[derive(Clone)]
pub struct DistributionEngine {
    http: SharedHttpClient,
    store: SharedStore,
    pool: TaskPool,
    hub_url: Arc<str>,
}

impl DistributionEngine {
    /// Create an engine advertising `hub_url` in deliveries.
    pub fn new(http: SharedHttpClient, store: SharedStore, pool: TaskPool, hub_url: &str) -> Self {
        Self {
            http,
            store,
            pool,
            hub_url: Arc::from(hub_url),
        }
    }

    /// Schedule a distribution without waiting for it.
    pub fn distribute(&self, topic_url: String, resource_url: Option<String>) {
        let engine = self.clone();
        self.pool.spawn(async move {
            engine.run(&topic_url, resource_url.as_deref()).await;
        });
    }

    /// Fetch the topic resource once and schedule one delivery per active
    /// subscriber.
    ///
    /// A fetch transport failure aborts the whole run. Deliveries run as
    /// independent pool tasks; one failing does not affect the others.
    pub async fn run(&self, topic_url: &str, resource_url: Option<&str>) -> DistributionReport {
        let fetch_url = resource_url.unwrap_or(topic_url);
        info!(topic = topic_url, url = fetch_url, "fetching topic resource");

        let response = match self.http.get(fetch_url, &[]).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    topic = topic_url,
                    url = fetch_url,
                    error = %e,
                    "failed to fetch topic resource, subscribers will not be notified"
                );
                return DistributionReport::default();
            }
        };

        let content_type = Arc::<str>::from(
            response
                .header("content-type")
                .unwrap_or(DEFAULT_CONTENT_TYPE),
        );
        let body = response.body;

        let subscriptions = match self.store.find_by_topic(topic_url) {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!(topic = topic_url, error = %e, "failed to load subscriptions");
                return DistributionReport {
                    fetched: true,
                    deliveries: 0,
                };
            }
        };

        let now = current_millis();
        let mut deliveries = 0;
        for subscription in subscriptions
            .into_iter()
            .filter(|s| s.is_active_at(now))
        {
            let engine = self.clone();
            let content_type = content_type.clone();
            let body = body.clone();
            self.pool.spawn(async move {
                engine.deliver(&subscription, &content_type, body).await;
            });
            deliveries += 1;
        }

        info!(
            topic = topic_url,
            content_type = %content_type,
            bytes = body.len(),
            deliveries,
            "topic update fanned out"
        );

        DistributionReport {
            fetched: true,
            deliveries,
        }
    }

    /// POST the content to one subscriber. The response is not inspected.
    pub async fn deliver(&self, subscription: &Subscription, content_type: &str, body: Bytes) {
        let link = link_header(&self.hub_url, &subscription.topic_url);
        let signature = subscription
            .secret
            .as_deref()
            .map(|secret| signature::sign(secret, &body));

        let mut headers = vec![("Content-Type", content_type), ("Link", link.as_str())];
        if let Some(signature) = signature.as_deref() {
            headers.push((SIGNATURE_HEADER, signature));
        }

        debug!(
            callback = %subscription.callback_url,
            topic = %subscription.topic_url,
            content_type,
            signed = signature.is_some(),
            "delivering topic content"
        );

        match self
            .http
            .post(&subscription.callback_url, &headers, body)
            .await
        {
            Ok(response) => debug!(
                callback = %subscription.callback_url,
                status = response.status,
                "delivery sent"
            ),
            Err(e) => warn!(
                callback = %subscription.callback_url,
                topic = %subscription.topic_url,
                error = %e,
                "delivery failed"
            ),
        }
    }
}
