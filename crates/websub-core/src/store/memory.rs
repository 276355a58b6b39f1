//! Volatile subscription store.

use dashmap::DashMap;

use super::SubscriptionStore;
use crate::error::Result;
use crate::subscription::{expires_at_for_lease, Subscription, SubscriptionKey};

/// In-memory subscription store keyed by [`SubscriptionKey`].
///
/// Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySubscriptionStore {
    subscriptions: DashMap<SubscriptionKey, Subscription>,
}

impl MemorySubscriptionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubscriptionStore for MemorySubscriptionStore {
    fn upsert_at(
        &self,
        callback_url: &str,
        topic_url: &str,
        secret: Option<&str>,
        lease_seconds: i64,
        now_ms: u64,
    ) -> Result<Subscription> {
        let key = SubscriptionKey::new(callback_url, topic_url);
        let mut entry = self
            .subscriptions
            .entry(key)
            .or_insert_with(|| Subscription::new(callback_url, topic_url));

        entry.secret = secret.map(str::to_string);
        entry.expires_at = expires_at_for_lease(lease_seconds, now_ms);

        Ok(entry.value().clone())
    }

    fn delete(&self, callback_url: &str, topic_url: &str) -> Result<bool> {
        let key = SubscriptionKey::new(callback_url, topic_url);
        Ok(self.subscriptions.remove(&key).is_some())
    }

    fn find(&self, callback_url: &str, topic_url: &str) -> Result<Option<Subscription>> {
        let key = SubscriptionKey::new(callback_url, topic_url);
        Ok(self.subscriptions.get(&key).map(|entry| entry.value().clone()))
    }

    fn find_by_topic(&self, topic_url: &str) -> Result<Vec<Subscription>> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|entry| entry.key().topic_url == topic_url)
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn purge_expired(&self, now_ms: u64) -> Result<usize> {
        let mut removed = 0;
        self.subscriptions.retain(|_, subscription| {
            let keep = subscription.is_active_at(now_ms);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.subscriptions.len())
    }
}
