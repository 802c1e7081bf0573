//! Port trait definitions.
//!
//! The engine defines *what* it needs from the outside world; infrastructure
//! crates (see `admin-api`) define *how* to supply it. All ports are
//! object-safe so the engine can hold them as `Arc<dyn ...>`.

use async_trait::async_trait;

use crate::errors::{RemoteError, StoreError};
use crate::{AuthContext, Entity, ListQuery, RemoteSubscriptionId, ResourceName, Subscription};
use crate::{SubscriptionKey, Topic};

/// Reports the remote service's current version.
///
/// Implementations must query the remote side on every call: administrators
/// upgrade and downgrade sites between invocations.
#[async_trait]
pub trait RemoteVersionProvider: Send + Sync {
    /// Returns the version string exactly as the remote reports it, or `None`
    /// when the remote does not report one.
    async fn current_version(&self, auth: &AuthContext) -> Result<Option<String>, RemoteError>;
}

/// Resource-scoped access to the remote Admin API.
#[async_trait]
pub trait AdminApiClient: Send + Sync {
    /// Lists entities of a resource.
    async fn browse(
        &self,
        auth: &AuthContext,
        resource: &ResourceName,
        query: &ListQuery,
    ) -> Result<Vec<Entity>, RemoteError>;

    /// Creates an entity and returns it as stored remotely.
    async fn add(
        &self,
        auth: &AuthContext,
        resource: &ResourceName,
        payload: &Entity,
    ) -> Result<Entity, RemoteError>;

    /// Updates the entity with the given id and returns it as stored remotely.
    async fn edit(
        &self,
        auth: &AuthContext,
        resource: &ResourceName,
        id: &str,
        payload: &Entity,
    ) -> Result<Entity, RemoteError>;
}

/// Remote endpoints managing webhook subscriptions.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Registers a webhook and returns the identifier the remote issued.
    async fn create_subscription(
        &self,
        auth: &AuthContext,
        topic: &Topic,
        target_url: &str,
    ) -> Result<RemoteSubscriptionId, RemoteError>;

    /// Deletes a webhook. Returns [`RemoteError::NotFound`] when the remote no
    /// longer knows the id.
    async fn delete_subscription(
        &self,
        auth: &AuthContext,
        id: &RemoteSubscriptionId,
    ) -> Result<(), RemoteError>;
}

/// Key-value persistence owned by the hosting platform, holding one
/// [`Subscription`] per logical subscription between subscribe and
/// unsubscribe.
///
/// Concurrent subscribe calls for one key both pass the `load` check, so
/// [`SubscriptionStore::insert`] must be atomic per key: exactly one of them
/// may store its handle.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Returns the stored subscription, if any.
    async fn load(&self, key: &SubscriptionKey) -> Result<Option<Subscription>, StoreError>;

    /// Stores the subscription for `key` unless one is already stored.
    ///
    /// Returns `false`, leaving the existing record untouched, when `key`
    /// was taken.
    async fn insert(
        &self,
        key: &SubscriptionKey,
        subscription: &Subscription,
    ) -> Result<bool, StoreError>;

    /// Removes the subscription for `key`. Removing an absent key succeeds.
    async fn clear(&self, key: &SubscriptionKey) -> Result<(), StoreError>;
}
