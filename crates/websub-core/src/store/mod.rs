//! Subscription storage.
//!
//! The hub needs only a keyed upsert/lookup/delete capability over
//! `(callback_url, topic_url)`. Two backends are provided: a sled-based
//! persistent store and a dashmap-based volatile one.

mod config;
mod memory;
mod sled_store;

use std::sync::Arc;

pub use config::StoreConfig;
pub use memory::MemorySubscriptionStore;
pub use sled_store::SledSubscriptionStore;

use crate::error::Result;
use crate::subscription::{current_millis, Subscription};

/// Keyed storage of subscriptions.
///
/// Implementations must be safe to call concurrently from verification and
/// distribution tasks. At most one record exists per `(callback_url, topic_url)`.
pub trait SubscriptionStore: Send + Sync {
    /// Create or refresh the subscription for a pair, using `now_ms` as the
    /// lease start.
    ///
    /// The secret is overwritten, including clearing it when `None`.
    fn upsert_at(
        &self,
        callback_url: &str,
        topic_url: &str,
        secret: Option<&str>,
        lease_seconds: i64,
        now_ms: u64,
    ) -> Result<Subscription>;

    /// Remove the subscription for a pair.
    ///
    /// Returns whether a record was removed. A missing record is not an error.
    fn delete(&self, callback_url: &str, topic_url: &str) -> Result<bool>;

    /// Look up the subscription for a pair.
    fn find(&self, callback_url: &str, topic_url: &str) -> Result<Option<Subscription>>;

    /// All subscriptions of a topic, expired ones included, in no particular order.
    fn find_by_topic(&self, topic_url: &str) -> Result<Vec<Subscription>>;

    /// Remove every subscription whose lease has elapsed at `now_ms`.
    ///
    /// Returns the number of removed records.
    fn purge_expired(&self, now_ms: u64) -> Result<usize>;

    /// Number of stored subscriptions.
    fn len(&self) -> Result<usize>;

    /// Whether the store holds no subscriptions.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Create or refresh the subscription for a pair, starting the lease now.
    fn upsert(
        &self,
        callback_url: &str,
        topic_url: &str,
        secret: Option<&str>,
        lease_seconds: i64,
    ) -> Result<Subscription> {
        self.upsert_at(callback_url, topic_url, secret, lease_seconds, current_millis())
    }
}

/// Thread-safe store handle.
pub type SharedStore = Arc<dyn SubscriptionStore>;
