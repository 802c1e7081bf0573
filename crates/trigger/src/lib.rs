//! Trigger domain for HookRelay.
//!
//! This crate contains every domain concept, newtype identifier, port trait,
//! and error type used to turn remote-service events into automation triggers.
//! Infrastructure crates implement the port traits defined here; they never
//! add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`Topic`, `SubscriptionKey`, `InvocationId`, etc.) |
//! | [`types`] | Shared value types (`RemoteVersion`, `ListQuery`, `Subscription`, etc.) |
//! | [`errors`] | `TriggerError`, `RemoteError` and retry-policy types |
//! | [`ports`] | Traits the engine needs from the outside world |
//! | [`gate`] | `VersionGate` |
//! | [`webhooks`] | `WebhookLifecycleManager` and delivery normalization |
//! | [`lifecycle`] | Subscription state machine |
//! | [`hook`] | `HookTrigger`, the per-event orchestrator |
//! | [`writer`] | `GatedWriter` for field-gated Admin API writes |
//! | [`store`] | In-memory `SubscriptionStore` |
//! | [`catalog`] | Built-in trigger and action definitions |

pub mod catalog;
pub mod errors;
pub mod gate;
pub mod hook;
pub mod identifiers;
pub mod lifecycle;
pub mod ports;
pub mod store;
pub mod types;
pub mod webhooks;
pub mod writer;

#[cfg(test)]
mod testing;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{RemoteError, RetryPolicy, StoreError, TriggerError};
pub use gate::VersionGate;
pub use hook::{AcquisitionMode, HookTrigger, TriggerDefinition, TriggerPorts, Unsubscribed};
pub use identifiers::{
    InvocationId, RemoteSubscriptionId, ResourceName, SubscriptionKey, Topic, TriggerKey,
};
pub use lifecycle::{LifecycleEvent, SubscriptionState};
pub use ports::{AdminApiClient, RemoteVersionProvider, SubscriptionStore, WebhookTransport};
pub use store::InMemorySubscriptionStore;
pub use types::{
    AuthContext, Entity, EventBundle, FieldRequirement, ListLimit, ListMode, ListQuery,
    OrderDirection, RemoteVersion, Subscription, Timestamp, VersionRequirement,
};
pub use webhooks::{normalize_delivery, Deregistration, WebhookLifecycleManager};
pub use writer::GatedWriter;
