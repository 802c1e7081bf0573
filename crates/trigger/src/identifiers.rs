//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`SubscriptionKey`] (chosen by the hosting platform) with a
//! [`RemoteSubscriptionId`] (issued by the remote service) even though both are
//! strings under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), from_static(),
// Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Wraps a non-empty compile-time constant.
            #[allow(dead_code)]
            pub(crate) fn from_static(value: &'static str) -> Self {
                Self(value.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single trigger invocation (one subscribe, unsubscribe, list or
/// delivery call).
///
/// Generated fresh for every call; recorded on the invocation's tracing span so
/// the version check and the gated remote call can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// Stable key of a trigger definition (e.g. `"newsletter_created"`).
    TriggerKey
}

string_id! {
    /// Webhook event topic as understood by the remote service
    /// (e.g. `"newsletter.added"`, `"member.deleted"`).
    Topic
}

string_id! {
    /// Plural Admin API resource name (e.g. `"newsletters"`, `"members"`).
    ResourceName
}

string_id! {
    /// Identifier the remote service issued for a registered webhook.
    ///
    /// This is the only handle used to deregister: the remote side may host
    /// several webhooks for the same topic and target URL.
    RemoteSubscriptionId
}

string_id! {
    /// Platform-chosen key addressing one logical subscription in the
    /// [`crate::SubscriptionStore`] (typically one automation).
    SubscriptionKey
}

impl Topic {
    /// Returns the entity key a delivery for this topic is wrapped in.
    ///
    /// `"newsletter.added"` → `"newsletter"`. Topics without a dot are their
    /// own entity key.
    pub fn entity_key(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(entity, _)| entity)
    }

    /// Returns the action half of the topic (`"added"`, `"deleted"`, ...), if
    /// any.
    pub fn action(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, action)| action)
    }

    /// Returns `true` for topics announcing an entity's removal.
    pub fn is_deletion(&self) -> bool {
        self.action() == Some("deleted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_identifiers_are_rejected() {
        assert!(Topic::new("").is_none());
        assert!(SubscriptionKey::new("   ").is_none());
        assert_eq!(
            RemoteSubscriptionId::new("abc123").map(|id| id.to_string()),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn topic_splits_into_entity_and_action() {
        let topic = Topic::new("newsletter.added").unwrap();
        assert_eq!(topic.entity_key(), "newsletter");
        assert_eq!(topic.action(), Some("added"));
        assert!(!topic.is_deletion());

        let deleted = Topic::new("member.deleted").unwrap();
        assert!(deleted.is_deletion());

        let bare = Topic::new("site").unwrap();
        assert_eq!(bare.entity_key(), "site");
        assert_eq!(bare.action(), None);
    }
}
