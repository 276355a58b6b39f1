//! Persistent subscription store backed by sled.

use sled::{Db, Tree};
use tracing::debug;

use super::{StoreConfig, SubscriptionStore};
use crate::error::Result;
use crate::subscription::{expires_at_for_lease, Subscription};

/// Tree name for subscription records.
const SUBSCRIPTIONS_TREE: &str = "subscriptions";

/// Subscription store persisted in a sled tree.
///
/// Key format: `len(topic_url) as u64 BE ++ topic_url ++ callback_url` ->
/// JSON-encoded [`Subscription`]. The length prefix keeps keys unambiguous
/// for any URL bytes; keying by topic first makes fan-out lookups a prefix scan.
pub struct SledSubscriptionStore {
    /// The underlying sled database.
    db: Db,

    /// Tree holding one record per subscription.
    tree: Tree,
}

impl SledSubscriptionStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let db = config.to_sled_config().open()?;
        Self::from_db(db)
    }

    /// Build a store over an already opened sled database.
    pub fn from_db(db: Db) -> Result<Self> {
        let tree = db.open_tree(SUBSCRIPTIONS_TREE)?;
        Ok(Self { db, tree })
    }

    /// Check if the database was recovered from a previous run.
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn record_key(callback_url: &str, topic_url: &str) -> Vec<u8> {
        let mut key = Self::topic_prefix(topic_url);
        key.extend_from_slice(callback_url.as_bytes());
        key
    }

    fn topic_prefix(topic_url: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(topic_url.len() + 8);
        prefix.extend_from_slice(&(topic_url.len() as u64).to_be_bytes());
        prefix.extend_from_slice(topic_url.as_bytes());
        prefix
    }
}

impl SubscriptionStore for SledSubscriptionStore {
    fn upsert_at(
        &self,
        callback_url: &str,
        topic_url: &str,
        secret: Option<&str>,
        lease_seconds: i64,
        now_ms: u64,
    ) -> Result<Subscription> {
        let subscription = Subscription {
            callback_url: callback_url.to_string(),
            topic_url: topic_url.to_string(),
            secret: secret.map(str::to_string),
            expires_at: expires_at_for_lease(lease_seconds, now_ms),
        };

        // Every field of the record comes from the request, so a single keyed
        // insert replaces any previous row atomically.
        let bytes = serde_json::to_vec(&subscription)?;
        let previous = self
            .tree
            .insert(Self::record_key(callback_url, topic_url), bytes)?;

        debug!(
            callback = callback_url,
            topic = topic_url,
            expires_at = subscription.expires_at,
            renewed = previous.is_some(),
            "subscription stored"
        );

        Ok(subscription)
    }

    fn delete(&self, callback_url: &str, topic_url: &str) -> Result<bool> {
        let removed = self.tree.remove(Self::record_key(callback_url, topic_url))?;
        Ok(removed.is_some())
    }

    fn find(&self, callback_url: &str, topic_url: &str) -> Result<Option<Subscription>> {
        match self.tree.get(Self::record_key(callback_url, topic_url))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn find_by_topic(&self, topic_url: &str) -> Result<Vec<Subscription>> {
        self.tree
            .scan_prefix(Self::topic_prefix(topic_url))
            .map(|entry| -> Result<Subscription> {
                let (_, bytes) = entry?;
                Ok(serde_json::from_slice(&bytes)?)
            })
            .filter(|record| match record {
                Ok(subscription) => subscription.topic_url == topic_url,
                Err(_) => true,
            })
            .collect()
    }

    fn purge_expired(&self, now_ms: u64) -> Result<usize> {
        let mut removed = 0;

        for entry in self.tree.iter() {
            let (key, bytes) = entry?;
            let subscription: Subscription = serde_json::from_slice(&bytes)?;
            if subscription.is_active_at(now_ms) {
                continue;
            }

            // Skip rows renewed since they were read.
            if self
                .tree
                .compare_and_swap(&key, Some(bytes), None as Option<&[u8]>)?
                .is_ok()
            {
                removed += 1;
            }
        }

        Ok(removed)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.tree.len())
    }
}
