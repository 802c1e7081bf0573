//! Subscription lifecycle state machine.
//!
//! ```text
//! Unregistered --subscribe--> Registering --registered--> Active
//!      ^                          |                         |
//!      +------- failed -----------+                    unsubscribe
//!      |                                                    v
//!      +--------------- finished ---------------------- Deregistering
//! ```
//!
//! State is per logical subscription, never per process. Only `Unregistered`
//! and `Active` are observable between invocations; the other two exist while
//! a subscribe or unsubscribe call is in flight.

use serde::{Deserialize, Serialize};

/// Where one logical subscription is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    /// No webhook is registered.
    Unregistered,
    /// Version check and registration are in flight.
    Registering,
    /// A webhook is registered and its identifier is stored.
    Active,
    /// Deregistration is in flight.
    Deregistering,
}

/// Inputs that move a subscription between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The platform activated an automation.
    SubscribeRequested,
    /// The remote accepted the registration and the handle was stored.
    Registered,
    /// The version gate or the remote rejected the registration.
    RegistrationFailed,
    /// The platform deactivated an automation.
    UnsubscribeRequested,
    /// The remote webhook is gone (deleted now or already absent).
    DeregistrationFinished,
    /// The remote refused to delete the webhook; the handle is kept.
    DeregistrationFailed,
}

impl SubscriptionState {
    /// Returns the state reached by applying `event`, or `None` if the event
    /// is not legal in this state.
    pub fn on(self, event: LifecycleEvent) -> Option<Self> {
        use LifecycleEvent as E;
        match (self, event) {
            (Self::Unregistered, E::SubscribeRequested) => Some(Self::Registering),
            (Self::Registering, E::Registered) => Some(Self::Active),
            (Self::Registering, E::RegistrationFailed) => Some(Self::Unregistered),
            (Self::Active, E::UnsubscribeRequested) => Some(Self::Deregistering),
            (Self::Deregistering, E::DeregistrationFinished) => Some(Self::Unregistered),
            (Self::Deregistering, E::DeregistrationFailed) => Some(Self::Active),
            _ => None,
        }
    }

    /// Returns the lowercase name used in messages and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Registering => "registering",
            Self::Active => "active",
            Self::Deregistering => "deregistering",
        }
    }
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
