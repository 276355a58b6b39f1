//! Subscription records and lease arithmetic.

use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Current wall-clock time in epoch milliseconds.
pub fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Compute the expiry timestamp for a lease.
///
/// A lease of zero or less never expires and yields `0`.
pub fn expires_at_for_lease(lease_seconds: i64, now_ms: u64) -> u64 {
    if lease_seconds <= 0 {
        0
    } else {
        now_ms.saturating_add((lease_seconds as u64).saturating_mul(1000))
    }
}

/// Natural key of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionKey {
    /// Subscriber delivery endpoint.
    pub callback_url: String,
    /// Topic the subscriber follows.
    pub topic_url: String,
}

impl SubscriptionKey {
    /// Create a new key.
    pub fn new(callback_url: impl Into<String>, topic_url: impl Into<String>) -> Self {
        Self {
            callback_url: callback_url.into(),
            topic_url: topic_url.into(),
        }
    }
}

/// A verified subscriber of a topic.
///
/// Equality and hashing consider only `(callback_url, topic_url)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscriber delivery endpoint.
    pub callback_url: String,
    /// Topic the subscriber follows.
    pub topic_url: String,
    /// Optional HMAC key used to sign deliveries.
    #[serde(default)]
    pub secret: Option<String>,
    /// Expiry in epoch milliseconds; `0` never expires.
    #[serde(default)]
    pub expires_at: u64,
}

impl Subscription {
    /// Create a subscription that never expires and has no secret.
    pub fn new(callback_url: impl Into<String>, topic_url: impl Into<String>) -> Self {
        Self {
            callback_url: callback_url.into(),
            topic_url: topic_url.into(),
            secret: None,
            expires_at: 0,
        }
    }

    /// Set the signing secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the expiry timestamp.
    pub fn with_expires_at(mut self, expires_at: u64) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// The natural key of this subscription.
    pub fn key(&self) -> SubscriptionKey {
        SubscriptionKey::new(&self.callback_url, &self.topic_url)
    }

    /// Whether the subscription should still receive deliveries at `now_ms`.
    pub fn is_active_at(&self, now_ms: u64) -> bool {
        self.expires_at == 0 || self.expires_at > now_ms
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        self.callback_url == other.callback_url && self.topic_url == other.topic_url
    }
}

impl Eq for Subscription {}

impl Hash for Subscription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.callback_url.hash(state);
        self.topic_url.hash(state);
    }
}
