//! In-memory [`SubscriptionStore`].
//!
//! Suitable for hosting platforms that keep subscription state in process and
//! for tests. Platforms with their own persistence implement the trait
//! directly.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::ports::SubscriptionStore;
use crate::{Subscription, SubscriptionKey};

/// Subscription records keyed by [`SubscriptionKey`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionStore {
    records: Arc<RwLock<HashMap<SubscriptionKey, Subscription>>>,
}

impl InMemorySubscriptionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subscriptions.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn load(&self, key: &SubscriptionKey) -> Result<Option<Subscription>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn insert(
        &self,
        key: &SubscriptionKey,
        subscription: &Subscription,
    ) -> Result<bool, StoreError> {
        match self.records.write().await.entry(key.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(subscription.clone());
                Ok(true)
            }
        }
    }

    async fn clear(&self, key: &SubscriptionKey) -> Result<(), StoreError> {
        self.records.write().await.remove(key);
        Ok(())
    }
}
