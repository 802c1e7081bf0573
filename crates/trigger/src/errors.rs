//! Error and retry-policy types for the HookRelay trigger domain.
//!
//! [`TriggerError`] covers every condition a single trigger invocation can end
//! in. [`RemoteError`] is the narrower vocabulary spoken by the remote-facing
//! ports; the engine translates it into a [`TriggerError`] that carries the
//! operator-facing message.
//!
//! [`RetryPolicy`] is a cross-cutting concern: the hosting platform uses it to
//! tell halting failures (shown to the user, never retried) apart from
//! transient transport failures.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lifecycle::SubscriptionState;
use crate::{RemoteSubscriptionId, RemoteVersion, Topic};

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// ## Rules
///
/// - `Retryable` errors: connection resets, timeouts, unreachable hosts.
/// - `NonRetryable` errors: incompatible remote version, rejected webhook
///   registration, malformed delivery payloads, remote validation failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately or apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried; the automation step halts.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Port-level errors
// ---------------------------------------------------------------------------

/// Failure reported by a remote-facing port (version provider, Admin API
/// client, webhook transport).
///
/// Infrastructure adapters are responsible for collapsing their transport
/// specifics into one of these variants. `message` fields carry the remote
/// service's own error text verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The addressed resource does not exist on the remote side.
    #[error("{message}")]
    NotFound {
        /// Error text extracted from the response body.
        message: String,
    },

    /// The remote service answered with a non-success status.
    #[error("{message}")]
    Rejected {
        /// HTTP status code returned by the remote service.
        status: u16,
        /// Error text extracted from the response body.
        message: String,
    },

    /// The request never produced a response (connection refused, reset,
    /// timed out).
    #[error("{message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The credentials in the [`crate::AuthContext`] could not be used to
    /// authenticate; no request was sent.
    #[error("invalid admin API key: {message}")]
    Credentials {
        /// What was wrong with the key.
        message: String,
    },

    /// The remote answered successfully but the body did not have the
    /// expected shape.
    #[error("unexpected response: {message}")]
    InvalidResponse {
        /// What was wrong with the body.
        message: String,
    },
}

impl RemoteError {
    /// Returns the retry classification for this failure.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            _ => RetryPolicy::NonRetryable,
        }
    }
}

/// Failure reported by a [`crate::SubscriptionStore`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

// ---------------------------------------------------------------------------
// Trigger-level errors
// ---------------------------------------------------------------------------

/// Errors that end a trigger invocation.
///
/// Every variant except [`TriggerError::Transport`] is halting: the hosting
/// platform shows the message to the user and stops the automation step.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The remote service reports a version below the one the capability
    /// needs, or its version could not be determined.
    #[error(
        "Unsupported version: {capability} requires version {minimum} or later, \
         but the connected site reports version {detected}. Please upgrade your site."
    )]
    IncompatibleVersion {
        /// Human-readable capability label (e.g. `"newsletters"`).
        capability: String,
        /// Minimum version the capability requires.
        minimum: RemoteVersion,
        /// Version string exactly as reported, or `"unknown"` when absent.
        detected: String,
    },

    /// The remote service rejected the webhook registration.
    #[error("Unable to subscribe to '{topic}': {message}")]
    Registration {
        /// Topic the registration was for.
        topic: Topic,
        /// Remote error text, verbatim.
        message: String,
    },

    /// The remote service rejected the webhook deletion for a reason other
    /// than the subscription already being gone.
    #[error("Unable to remove webhook {subscription_id}: {message}")]
    Deregistration {
        /// Remote identifier of the subscription being removed.
        subscription_id: RemoteSubscriptionId,
        /// Remote error text, verbatim.
        message: String,
    },

    /// A webhook delivery did not contain the entity the topic promises.
    #[error("Malformed delivery for '{topic}': {reason}")]
    MalformedDelivery {
        /// Topic the delivery was handled as.
        topic: Topic,
        /// Which part of the payload was missing or of the wrong type.
        reason: String,
    },

    /// Any other rejection from the remote Admin API (list, create, update).
    #[error("{message}")]
    RemoteService {
        /// HTTP status, when the failure came from a response.
        status: Option<u16>,
        /// Remote error text, verbatim.
        message: String,
    },

    /// The remote service could not be reached. Retry policy belongs to the
    /// remote-call collaborator; the engine only reports it.
    #[error("Remote service unreachable: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The requested operation is not legal in the subscription's current
    /// state (e.g. subscribing twice under the same key).
    #[error("Cannot {operation} while the subscription is {state}")]
    InvalidTransition {
        /// State the subscription was in.
        state: SubscriptionState,
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// Caller-supplied input was rejected before any remote call.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },

    /// The hosting platform's subscription store failed.
    #[error("Subscription store error: {0}")]
    Store(#[from] StoreError),
}

impl TriggerError {
    /// Returns the retry classification for this error.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            _ => RetryPolicy::NonRetryable,
        }
    }

    /// Returns `true` if this error must stop the automation step.
    pub fn is_halting(&self) -> bool {
        self.retry_policy() == RetryPolicy::NonRetryable
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl From<RemoteError> for TriggerError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound { message } => Self::RemoteService {
                status: Some(404),
                message,
            },
            RemoteError::Rejected { status, message } => Self::RemoteService {
                status: Some(status),
                message,
            },
            RemoteError::Transport { message } => Self::Transport { message },
            RemoteError::Credentials { .. } => Self::InvalidInput {
                message: err.to_string(),
            },
            RemoteError::InvalidResponse { .. } => Self::RemoteService {
                status: None,
                message: err.to_string(),
            },
        }
    }
}
