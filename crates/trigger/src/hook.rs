//! Hook trigger orchestration.
//!
//! A [`HookTrigger`] represents one event type (e.g. "newsletter created") and
//! exposes the four operations the hosting platform drives:
//!
//! | Operation | Gated | Touches store |
//! |-----------|-------|---------------|
//! | [`HookTrigger::subscribe`] | yes | writes |
//! | [`HookTrigger::unsubscribe`] | no | reads, clears |
//! | [`HookTrigger::perform`] | no | no |
//! | [`HookTrigger::perform_list`] | yes | no |
//!
//! Deliveries are never version-checked: the remote cannot be told
//! synchronously that a delivery was refused, so gating happens when the
//! webhook is registered and whenever the platform polls.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::errors::TriggerError;
use crate::gate::VersionGate;
use crate::lifecycle::{LifecycleEvent, SubscriptionState};
use crate::ports::{AdminApiClient, RemoteVersionProvider, SubscriptionStore, WebhookTransport};
use crate::webhooks::{normalize_delivery, Deregistration, WebhookLifecycleManager};
use crate::{AuthContext, Entity, EventBundle, InvocationId, ListMode, ListQuery};
use crate::{ResourceName, Subscription, SubscriptionKey, Topic, TriggerKey, VersionRequirement};

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// How a trigger acquires events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionMode {
    /// Real-time delivery via a webhook on `topic`; polling remains available
    /// for samples and dropdowns.
    Push {
        /// Webhook topic to subscribe to.
        topic: Topic,
    },
    /// Polling only; the trigger cannot be subscribed.
    Pull,
}

/// Static description of one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDefinition {
    /// Stable trigger key.
    pub key: TriggerKey,
    /// Singular display noun (e.g. `"Newsletter"`).
    pub noun: String,
    /// Admin API resource listed by [`HookTrigger::perform_list`].
    pub resource: ResourceName,
    /// Event acquisition mode.
    pub mode: AcquisitionMode,
    /// Requirement checked before subscribing and listing.
    pub requirement: VersionRequirement,
}

/// The collaborators a trigger talks to. Cheap to clone; one set of ports
/// can back any number of triggers.
#[derive(Clone)]
pub struct TriggerPorts {
    /// Remote version lookup.
    pub versions: Arc<dyn RemoteVersionProvider>,
    /// Admin API access for listing.
    pub admin: Arc<dyn AdminApiClient>,
    /// Webhook registration endpoints.
    pub webhooks: Arc<dyn WebhookTransport>,
    /// Platform-owned subscription persistence.
    pub store: Arc<dyn SubscriptionStore>,
}

/// How an unsubscribe call ended. All three are successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsubscribed {
    /// The remote webhook was deleted.
    Removed,
    /// The remote webhook was already gone.
    AlreadyAbsent,
    /// No subscription was stored under the key.
    NothingStored,
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// Dual-mode event source for one trigger definition.
pub struct HookTrigger {
    definition: TriggerDefinition,
    gate: VersionGate,
    webhooks: WebhookLifecycleManager,
    admin: Arc<dyn AdminApiClient>,
    store: Arc<dyn SubscriptionStore>,
}

impl HookTrigger {
    /// Builds a trigger from its definition and ports.
    pub fn new(definition: TriggerDefinition, ports: TriggerPorts) -> Self {
        Self {
            definition,
            gate: VersionGate::new(ports.versions),
            webhooks: WebhookLifecycleManager::new(ports.webhooks),
            admin: ports.admin,
            store: ports.store,
        }
    }

    /// Returns the trigger's definition.
    pub fn definition(&self) -> &TriggerDefinition {
        &self.definition
    }

    /// Registers a webhook for this trigger and stores its handle under `key`.
    ///
    /// # Errors
    ///
    /// - [`TriggerError::InvalidTransition`] if a subscription is already
    ///   stored under `key`, including one stored by a concurrent call while
    ///   this one was registering. The webhook registered by the losing call
    ///   is removed again.
    /// - [`TriggerError::IncompatibleVersion`] if the remote is too old; no
    ///   registration is attempted.
    /// - [`TriggerError::Registration`] if the remote rejects the webhook.
    #[instrument(
        name = "trigger_subscribe",
        skip(self, target_url, auth),
        fields(
            trigger = %self.definition.key,
            key = %key,
            invocation_id = %InvocationId::new_random(),
        )
    )]
    pub async fn subscribe(
        &self,
        key: &SubscriptionKey,
        target_url: &str,
        auth: &AuthContext,
    ) -> Result<Subscription, TriggerError> {
        let topic = self.push_topic("subscribe")?;

        let current = self.state(key).await?;
        if current.on(LifecycleEvent::SubscribeRequested).is_none() {
            return Err(TriggerError::InvalidTransition {
                state: current,
                operation: "subscribe",
            });
        }

        self.register(key, topic, target_url, auth)
            .await
            .inspect_err(|err| warn!(error = %err, "subscribe failed"))
    }

    async fn register(
        &self,
        key: &SubscriptionKey,
        topic: &Topic,
        target_url: &str,
        auth: &AuthContext,
    ) -> Result<Subscription, TriggerError> {
        self.gate
            .check_compatible(&self.definition.requirement, auth)
            .await?;

        let subscription = self.webhooks.register(topic, target_url, auth).await?;

        // Without a stored handle the webhook could never be removed.
        match self.store.insert(key, &subscription).await {
            Ok(true) => Ok(subscription),
            Ok(false) => {
                warn!("a concurrent subscribe stored a handle first; removing webhook");
                self.discard(&subscription, auth).await;
                Err(TriggerError::InvalidTransition {
                    state: SubscriptionState::Active,
                    operation: "subscribe",
                })
            }
            Err(err) => {
                warn!(error = %err, "storing subscription failed; removing webhook");
                self.discard(&subscription, auth).await;
                Err(err.into())
            }
        }
    }

    async fn discard(&self, subscription: &Subscription, auth: &AuthContext) {
        if let Err(err) = self.webhooks.deregister(subscription, auth).await {
            warn!(error = %err, remote_id = %subscription.remote_id, "webhook left behind");
        }
    }

    /// Removes the webhook stored under `key` and clears the store.
    ///
    /// Succeeds when the remote had already dropped the webhook, and when
    /// nothing is stored at all.
    ///
    /// # Errors
    ///
    /// [`TriggerError::Deregistration`] or [`TriggerError::Transport`] when the
    /// remote could not delete the webhook. The stored handle is kept so the
    /// call can be repeated.
    #[instrument(
        name = "trigger_unsubscribe",
        skip(self, auth),
        fields(
            trigger = %self.definition.key,
            key = %key,
            invocation_id = %InvocationId::new_random(),
        )
    )]
    pub async fn unsubscribe(
        &self,
        key: &SubscriptionKey,
        auth: &AuthContext,
    ) -> Result<Unsubscribed, TriggerError> {
        let Some(subscription) = self.store.load(key).await? else {
            info!("no stored subscription");
            return Ok(Unsubscribed::NothingStored);
        };

        match self.webhooks.deregister(&subscription, auth).await {
            Ok(outcome) => {
                self.store.clear(key).await?;
                Ok(match outcome {
                    Deregistration::Removed => Unsubscribed::Removed,
                    Deregistration::AlreadyAbsent => Unsubscribed::AlreadyAbsent,
                })
            }
            Err(err) => {
                warn!(error = %err, "unsubscribe failed; stored handle kept");
                Err(err)
            }
        }
    }

    /// Turns a webhook delivery into the entity array handed to the platform.
    ///
    /// # Errors
    ///
    /// [`TriggerError::MalformedDelivery`] if the payload lacks the entity.
    #[instrument(
        name = "trigger_perform",
        skip(self, bundle),
        fields(trigger = %self.definition.key)
    )]
    pub fn perform(&self, bundle: &EventBundle) -> Result<Vec<Entity>, TriggerError> {
        let topic = self.push_topic("handle a delivery")?;
        let entities = normalize_delivery(bundle, topic)?;
        debug!(count = entities.len(), "delivery normalized");
        Ok(entities)
    }

    /// Polls the remote for entities, choosing the query from the platform's
    /// `isFillingDynamicDropdown` flag.
    ///
    /// - `Some(true)`: the full catalog ordered by name descending.
    /// - `Some(false)` / `None`: the newest entity only.
    pub async fn perform_list(
        &self,
        is_filling_dynamic_dropdown: Option<bool>,
        auth: &AuthContext,
    ) -> Result<Vec<Entity>, TriggerError> {
        let query = ListQuery::for_mode(ListMode::from_dropdown_flag(is_filling_dynamic_dropdown));
        self.list(&query, auth).await
    }

    /// Runs a list query after the version gate approves it.
    ///
    /// # Errors
    ///
    /// - [`TriggerError::IncompatibleVersion`] if the remote is too old; the
    ///   Admin API is not queried.
    /// - [`TriggerError::RemoteService`] / [`TriggerError::Transport`] if the
    ///   browse call fails.
    #[instrument(
        name = "trigger_list",
        skip(self, query, auth),
        fields(
            trigger = %self.definition.key,
            mode = ?query.mode,
            invocation_id = %InvocationId::new_random(),
        )
    )]
    pub async fn list(
        &self,
        query: &ListQuery,
        auth: &AuthContext,
    ) -> Result<Vec<Entity>, TriggerError> {
        self.gate
            .check_compatible(&self.definition.requirement, auth)
            .await?;

        let entities = self
            .admin
            .browse(auth, &self.definition.resource, query)
            .await?;
        debug!(count = entities.len(), "list complete");
        Ok(entities)
    }

    /// Reports whether a subscription is stored under `key`.
    pub async fn state(&self, key: &SubscriptionKey) -> Result<SubscriptionState, TriggerError> {
        Ok(match self.store.load(key).await? {
            Some(_) => SubscriptionState::Active,
            None => SubscriptionState::Unregistered,
        })
    }

    fn push_topic(&self, operation: &str) -> Result<&Topic, TriggerError> {
        match &self.definition.mode {
            AcquisitionMode::Push { topic } => Ok(topic),
            AcquisitionMode::Pull => Err(TriggerError::invalid_input(format!(
                "cannot {operation}: trigger '{}' is polling-only",
                self.definition.key
            ))),
        }
    }
}
