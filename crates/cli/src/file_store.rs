//! JSON-file [`SubscriptionStore`].
//!
//! All subscriptions live in one JSON object keyed by subscription key.
//! Writes go to a sibling temp file that is then renamed over the existing file.
//! The lock serializes callers within one process only.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use trigger::{StoreError, Subscription, SubscriptionKey, SubscriptionStore};

type Records = BTreeMap<String, Subscription>;

pub struct FileSubscriptionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSubscriptionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Records, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(Records::new()),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                StoreError(format!("{} is not a valid store: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Records::new()),
            Err(e) => Err(StoreError(format!(
                "cannot read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write_all(&self, records: &Records) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError(format!("cannot encode store: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text)
            .await
            .map_err(|e| StoreError(format!("cannot write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError(format!("cannot replace {}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), records = records.len(), "store written");
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for FileSubscriptionStore {
    async fn load(&self, key: &SubscriptionKey) -> Result<Option<Subscription>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key.as_str()))
    }

    async fn insert(
        &self,
        key: &SubscriptionKey,
        subscription: &Subscription,
    ) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        if records.contains_key(key.as_str()) {
            return Ok(false);
        }
        records.insert(key.to_string(), subscription.clone());
        self.write_all(&records).await?;
        Ok(true)
    }

    async fn clear(&self, key: &SubscriptionKey) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        if records.remove(key.as_str()).is_some() {
            self.write_all(&records).await?;
        }
        Ok(())
    }
}
