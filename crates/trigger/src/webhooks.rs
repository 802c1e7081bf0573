//! Webhook subscription lifecycle.
//!
//! [`WebhookLifecycleManager`] registers and removes webhooks through the
//! [`WebhookTransport`] port and turns raw deliveries into the entity arrays
//! the hosting platform expects. Nothing here is retried: a rejected
//! registration ends the subscribe attempt.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::errors::{RemoteError, TriggerError};
use crate::ports::WebhookTransport;
use crate::{AuthContext, Entity, EventBundle, Subscription, Timestamp, Topic};

/// How a deregistration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deregistration {
    /// The remote deleted the webhook.
    Removed,
    /// The remote no longer knew the webhook (expired, or its entity was
    /// deleted).
    AlreadyAbsent,
}

/// Registers, removes, and decodes webhook subscriptions.
#[derive(Clone)]
pub struct WebhookLifecycleManager {
    transport: Arc<dyn WebhookTransport>,
}

impl WebhookLifecycleManager {
    /// Creates a manager over the given transport.
    pub fn new(transport: Arc<dyn WebhookTransport>) -> Self {
        Self { transport }
    }

    /// Registers a webhook for `topic` delivering to `target_url`.
    ///
    /// # Errors
    ///
    /// - [`TriggerError::InvalidInput`] for an empty target URL.
    /// - [`TriggerError::Registration`] when the remote rejects the request;
    ///   the remote's message is passed through verbatim.
    /// - [`TriggerError::Transport`] when the remote could not be reached.
    #[instrument(name = "webhook_register", skip(self, auth), fields(topic = %topic))]
    pub async fn register(
        &self,
        topic: &Topic,
        target_url: &str,
        auth: &AuthContext,
    ) -> Result<Subscription, TriggerError> {
        let target_url = target_url.trim();
        if target_url.is_empty() {
            return Err(TriggerError::invalid_input("webhook target URL is empty"));
        }

        let remote_id = self
            .transport
            .create_subscription(auth, topic, target_url)
            .await
            .map_err(|err| match err {
                RemoteError::Transport { .. } | RemoteError::Credentials { .. } => err.into(),
                other => TriggerError::Registration {
                    topic: topic.clone(),
                    message: other.to_string(),
                },
            })?;

        info!(remote_id = %remote_id, "webhook registered");
        Ok(Subscription {
            topic: topic.clone(),
            target_url: target_url.to_string(),
            remote_id,
            created_at: Timestamp::now(),
        })
    }

    /// Removes a registered webhook by its remote identifier.
    ///
    /// A webhook the remote no longer knows counts as removed, so calling
    /// this twice for the same subscription never fails the second time.
    ///
    /// # Errors
    ///
    /// - [`TriggerError::Deregistration`] when the remote refuses the delete
    ///   for any reason other than "not found".
    /// - [`TriggerError::Transport`] when the remote could not be reached.
    #[instrument(
        name = "webhook_deregister",
        skip(self, subscription, auth),
        fields(topic = %subscription.topic, remote_id = %subscription.remote_id)
    )]
    pub async fn deregister(
        &self,
        subscription: &Subscription,
        auth: &AuthContext,
    ) -> Result<Deregistration, TriggerError> {
        match self
            .transport
            .delete_subscription(auth, &subscription.remote_id)
            .await
        {
            Ok(()) => {
                info!("webhook removed");
                Ok(Deregistration::Removed)
            }
            Err(RemoteError::NotFound { message }) => {
                warn!(remote_message = %message, "webhook already absent on remote");
                Ok(Deregistration::AlreadyAbsent)
            }
            Err(err @ (RemoteError::Transport { .. } | RemoteError::Credentials { .. })) => {
                Err(err.into())
            }
            Err(other) => Err(TriggerError::Deregistration {
                subscription_id: subscription.remote_id.clone(),
                message: other.to_string(),
            }),
        }
    }
}

/// Extracts the entity a delivery for `topic` carries and wraps it in a
/// single-element array.
///
/// The remote wraps each entity as `{ "<entity>": { "current": {...},
/// "previous": {...} } }`. Deletion topics carry the removed entity under
/// `previous`; every other topic under `current`.
///
/// # Errors
///
/// [`TriggerError::MalformedDelivery`] when the entity key or snapshot is
/// missing, or the snapshot is not a JSON object.
pub fn normalize_delivery(bundle: &EventBundle, topic: &Topic) -> Result<Vec<Entity>, TriggerError> {
    let malformed = |reason: String| TriggerError::MalformedDelivery {
        topic: topic.clone(),
        reason,
    };

    let entity_key = topic.entity_key();
    let wrapper = bundle
        .topic_payload
        .get(entity_key)
        .ok_or_else(|| malformed(format!("payload has no '{entity_key}' key")))?;

    let snapshot_key = if topic.is_deletion() {
        "previous"
    } else {
        "current"
    };
    let entity = wrapper
        .get(snapshot_key)
        .ok_or_else(|| malformed(format!("'{entity_key}' has no '{snapshot_key}' snapshot")))?;

    match entity {
        Value::Object(_) => Ok(vec![entity.clone()]),
        other => Err(malformed(format!(
            "'{entity_key}.{snapshot_key}' is {}, expected an object",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{auth, FakeWebhookTransport};
    use serde_json::json;

    fn topic() -> Topic {
        Topic::new("newsletter.added").unwrap()
    }

    #[tokio::test]
    async fn register_returns_remote_issued_id() {
        let transport = Arc::new(FakeWebhookTransport::new());
        transport.push_create(Ok("abc123"));
        let manager = WebhookLifecycleManager::new(transport.clone());

        let subscription = manager
            .register(&topic(), "https://hooks.example.com/catch/1", &auth())
            .await
            .unwrap();

        assert_eq!(subscription.remote_id.as_str(), "abc123");
        assert_eq!(subscription.topic, topic());
        assert_eq!(transport.created_count(), 1);
    }

    #[tokio::test]
    async fn register_passes_remote_message_through() {
        let transport = Arc::new(FakeWebhookTransport::new());
        transport.push_create(Err(RemoteError::Rejected {
            status: 500,
            message: "Authorization failed: Unable to determine the authenticated user or integration."
                .to_string(),
        }));
        let manager = WebhookLifecycleManager::new(transport);

        let err = manager
            .register(&topic(), "https://hooks.example.com/catch/1", &auth())
            .await
            .unwrap_err();

        assert!(matches!(err, TriggerError::Registration { .. }));
        assert!(err.to_string().contains("Authorization failed"));
        assert!(err.is_halting());
    }

    #[tokio::test]
    async fn register_not_found_is_a_registration_error_with_remote_text() {
        let transport = Arc::new(FakeWebhookTransport::new());
        transport.push_create(Err(RemoteError::NotFound {
            message: "Resource not found error, cannot save webhook.: Integration not found."
                .to_string(),
        }));
        let manager = WebhookLifecycleManager::new(transport);

        let err = manager
            .register(&topic(), "https://hooks.example.com/catch/1", &auth())
            .await
            .unwrap_err();

        assert!(matches!(err, TriggerError::Registration { .. }));
        assert!(err.to_string().contains("Integration not found."));
    }

    #[tokio::test]
    async fn register_rejects_blank_target_without_remote_call() {
        let transport = Arc::new(FakeWebhookTransport::new());
        let manager = WebhookLifecycleManager::new(transport.clone());

        let err = manager.register(&topic(), "  ", &auth()).await.unwrap_err();
        assert!(matches!(err, TriggerError::InvalidInput { .. }));
        assert_eq!(transport.created_count(), 0);
    }

    #[tokio::test]
    async fn deregister_is_idempotent() {
        let transport = Arc::new(FakeWebhookTransport::new());
        transport.push_create(Ok("abc123"));
        transport.push_delete(Ok(()));
        transport.push_delete(Err(RemoteError::NotFound {
            message: "Webhook not found.".to_string(),
        }));
        let manager = WebhookLifecycleManager::new(transport.clone());

        let subscription = manager
            .register(&topic(), "https://hooks.example.com/catch/1", &auth())
            .await
            .unwrap();

        let first = manager.deregister(&subscription, &auth()).await.unwrap();
        let second = manager.deregister(&subscription, &auth()).await.unwrap();

        assert_eq!(first, Deregistration::Removed);
        assert_eq!(second, Deregistration::AlreadyAbsent);
        assert_eq!(transport.deleted_ids(), vec!["abc123", "abc123"]);
    }

    #[tokio::test]
    async fn deregister_surfaces_other_rejections() {
        let transport = Arc::new(FakeWebhookTransport::new());
        transport.push_create(Ok("abc123"));
        transport.push_delete(Err(RemoteError::Rejected {
            status: 403,
            message: "Permission error, cannot delete webhook.".to_string(),
        }));
        let manager = WebhookLifecycleManager::new(transport);

        let subscription = manager
            .register(&topic(), "https://hooks.example.com/catch/1", &auth())
            .await
            .unwrap();
        let err = manager.deregister(&subscription, &auth()).await.unwrap_err();

        assert!(matches!(err, TriggerError::Deregistration { .. }));
        assert!(err.to_string().contains("cannot delete webhook"));
    }

    #[test]
    fn normalize_wraps_current_entity() {
        let bundle = EventBundle::new(json!({"newsletter": {"current": {"id": "x"}}}));
        let entities = normalize_delivery(&bundle, &topic()).unwrap();
        assert_eq!(entities, vec![json!({"id": "x"})]);
    }

    #[test]
    fn normalize_uses_previous_for_deletions() {
        let bundle = EventBundle::new(json!({
            "member": {"current": {}, "previous": {"id": "m1", "email": "a@example.com"}}
        }));
        let topic = Topic::new("member.deleted").unwrap();

        let entities = normalize_delivery(&bundle, &topic).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0]["id"], "m1");
    }

    #[test]
    fn normalize_rejects_missing_keys() {
        let missing_entity = EventBundle::new(json!({"post": {"current": {"id": "p"}}}));
        let err = normalize_delivery(&missing_entity, &topic()).unwrap_err();
        assert!(matches!(err, TriggerError::MalformedDelivery { .. }));
        assert!(err.to_string().contains("'newsletter'"));

        let missing_snapshot = EventBundle::new(json!({"newsletter": {"previous": {}}}));
        assert!(normalize_delivery(&missing_snapshot, &topic()).is_err());

        let null_snapshot = EventBundle::new(json!({"newsletter": {"current": null}}));
        let err = normalize_delivery(&null_snapshot, &topic()).unwrap_err();
        assert!(err.to_string().contains("null"));
    }
}
