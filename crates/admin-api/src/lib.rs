//! HookRelay Admin API client adapter.
//!
//! Implements the [`trigger::RemoteVersionProvider`], [`trigger::AdminApiClient`]
//! and [`trigger::WebhookTransport`] traits over the remote site's HTTP Admin
//! API.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Token signing, URL layout, error-body decoding and
//! connection retries all live here. The [`trigger`] crate sees only the port
//! traits and [`trigger::RemoteError`].
//!
//! ## Endpoints
//!
//! | Port call | Request |
//! |-----------|---------|
//! | `current_version` | `GET /ghost/api/v2/admin/site/` |
//! | `browse` | `GET /ghost/api/v3/admin/{resource}/?order=..&limit=..` |
//! | `add` | `POST /ghost/api/v3/admin/{resource}/` |
//! | `edit` | `PUT /ghost/api/v3/admin/{resource}/{id}/` |
//! | `create_subscription` | `POST /ghost/api/v3/admin/webhooks/` |
//! | `delete_subscription` | `DELETE /ghost/api/v3/admin/webhooks/{id}/` |
//!
//! API versions are taken from [`AdminApiConfig`].

pub mod client;
pub mod config;
pub mod errors;
pub mod token;

pub use client::AdminApiHttpClient;
pub use config::AdminApiConfig;
pub use errors::AdminApiError;
pub use token::AdminKey;
