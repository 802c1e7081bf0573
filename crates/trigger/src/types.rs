//! Shared value types for the HookRelay trigger domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (versions order numerically, list limits
//! are positive) and participate in domain computations.

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RemoteSubscriptionId, Topic};

/// A single entity as returned by the remote service (a newsletter, a member,
/// ...). Entities are passed through to the hosting platform untouched.
pub type Entity = serde_json::Value;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Semantic version reported by the remote service.
///
/// Ordering is numeric: major, then minor, then patch. `3.10.0` is newer than
/// `3.9.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RemoteVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl RemoteVersion {
    /// Creates a new [`RemoteVersion`].
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses a version string as reported by the remote service.
    ///
    /// Accepts `"5"`, `"3.0"`, `"5.1.0"`, a leading `v`, and ignores
    /// pre-release or build suffixes (`"5.1.0-beta.1"`). Returns `None` for
    /// anything else, including the empty string.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let core = trimmed.split(['-', '+']).next().unwrap_or_default();

        let mut parts = core.split('.');
        let major = parse_component(parts.next()?)?;
        let minor = parts.next().map_or(Some(0), parse_component)?;
        let patch = parts.next().map_or(Some(0), parse_component)?;
        if parts.next().is_some() {
            return None;
        }

        Some(Self::new(major, minor, patch))
    }

    /// Returns `true` if `self` meets the given minimum.
    pub fn satisfies(self, minimum: RemoteVersion) -> bool {
        self >= minimum
    }
}

fn parse_component(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl std::fmt::Display for RemoteVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ---------------------------------------------------------------------------

/// Minimum remote version an operation needs, together with the label used to
/// describe it in error messages.
///
/// The capability label carries no behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRequirement {
    /// Oldest remote version that supports the capability.
    pub minimum: RemoteVersion,
    /// Human-readable capability name (e.g. `"newsletters"`).
    pub capability: String,
}

impl VersionRequirement {
    /// Creates a new requirement.
    pub fn new(minimum: RemoteVersion, capability: impl Into<String>) -> Self {
        Self {
            minimum,
            capability: capability.into(),
        }
    }
}

/// A version requirement that only applies when a given payload field is
/// present, e.g. member `labels` need 3.6 even though member updates work on
/// 3.0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRequirement {
    /// Top-level payload field the requirement is attached to.
    pub field: String,
    /// Requirement applied when the field is present and not null.
    pub requirement: VersionRequirement,
}

impl FieldRequirement {
    /// Creates a field requirement labelled with the field name.
    pub fn new(field: impl Into<String>, minimum: RemoteVersion) -> Self {
        let field = field.into();
        Self {
            requirement: VersionRequirement::new(minimum, field.clone()),
            field,
        }
    }
}

// ---------------------------------------------------------------------------
// Authentication context
// ---------------------------------------------------------------------------

/// Credentials and location of one remote account.
///
/// Passed explicitly through every call so concurrent automations for
/// different accounts never share state. `Debug` output redacts the key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Base URL of the remote site (e.g. `"https://example.com"`).
    pub admin_api_url: String,
    /// Admin API key in `"{id}:{secret}"` form.
    pub admin_api_key: String,
}

impl AuthContext {
    /// Creates a new auth context.
    pub fn new(admin_api_url: impl Into<String>, admin_api_key: impl Into<String>) -> Self {
        Self {
            admin_api_url: admin_api_url.into(),
            admin_api_key: admin_api_key.into(),
        }
    }

    /// Returns the site URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.admin_api_url.trim_end_matches('/')
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("admin_api_url", &self.admin_api_url)
            .field("admin_api_key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Subscriptions and deliveries
// ---------------------------------------------------------------------------

/// A webhook registered with the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Event topic the webhook listens to.
    pub topic: Topic,
    /// URL the remote service delivers events to.
    pub target_url: String,
    /// Identifier issued by the remote service; the deregistration handle.
    pub remote_id: RemoteSubscriptionId,
    /// When the registration succeeded.
    pub created_at: Timestamp,
}

/// Payload delivered to the webhook endpoint, as handed over by the hosting
/// platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBundle {
    /// Parsed JSON body of the delivery.
    pub topic_payload: serde_json::Value,
    /// Raw query string of the delivery URL (may be empty).
    #[serde(default)]
    pub raw_query_string: String,
}

impl EventBundle {
    /// Creates a bundle with an empty query string.
    pub fn new(topic_payload: serde_json::Value) -> Self {
        Self {
            topic_payload,
            raw_query_string: String::new(),
        }
    }

    /// Sets the raw query string.
    #[must_use]
    pub fn with_query_string(mut self, query: impl Into<String>) -> Self {
        self.raw_query_string = query.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Why a list call is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    /// One-shot connectivity/sample check: newest item only.
    SingleLatest,
    /// Populate a dynamic dropdown: every item, ordered by name.
    FullCatalog,
}

impl ListMode {
    /// Selects the mode from the platform's `isFillingDynamicDropdown` flag.
    /// An absent flag means a sample check.
    pub fn from_dropdown_flag(is_filling_dynamic_dropdown: Option<bool>) -> Self {
        if is_filling_dynamic_dropdown.unwrap_or(false) {
            Self::FullCatalog
        } else {
            Self::SingleLatest
        }
    }
}

/// Sort direction of a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl OrderDirection {
    /// Returns the wire form (`"ASC"` / `"DESC"`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Maximum number of entities a list query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListLimit {
    /// No limit.
    All,
    /// At most this many.
    Count(NonZeroU32),
}

impl std::fmt::Display for ListLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

/// Parameters of a browse call against the Admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Field to order by.
    pub order_by: String,
    /// Sort direction.
    pub direction: OrderDirection,
    /// Result limit.
    pub limit: ListLimit,
    /// Mode the query was built for.
    pub mode: ListMode,
}

impl ListQuery {
    /// Builds the query for a list mode.
    ///
    /// - [`ListMode::FullCatalog`]: `name DESC`, no limit.
    /// - [`ListMode::SingleLatest`]: `created_at DESC`, limit 1.
    pub fn for_mode(mode: ListMode) -> Self {
        match mode {
            ListMode::FullCatalog => Self {
                order_by: "name".to_string(),
                direction: OrderDirection::Desc,
                limit: ListLimit::All,
                mode,
            },
            ListMode::SingleLatest => Self {
                order_by: "created_at".to_string(),
                direction: OrderDirection::Desc,
                limit: ListLimit::Count(NonZeroU32::MIN),
                mode,
            },
        }
    }

    /// Returns the `order` parameter in wire form (e.g. `"name DESC"`).
    pub fn order_clause(&self) -> String {
        format!("{} {}", self.order_by, self.direction.as_str())
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
