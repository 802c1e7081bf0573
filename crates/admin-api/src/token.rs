//! Admin API token signing.
//!
//! An admin key has the form `"{id}:{secret}"` where `secret` is hex. Each
//! request carries a short-lived HS256 JWT signed with the decoded secret,
//! with the key id in the `kid` header and the API root as audience.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::errors::AdminApiError;

/// Claims of an admin token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// API root the token is valid for, e.g. `"/v3/admin/"`.
    pub aud: String,
}

/// A parsed admin API key.
#[derive(Clone)]
pub struct AdminKey {
    id: String,
    secret: Vec<u8>,
}

impl AdminKey {
    /// Splits and decodes a raw `"{id}:{secret}"` key.
    ///
    /// # Errors
    ///
    /// [`AdminApiError::InvalidKey`] when the separator is missing, either
    /// half is empty, or the secret is not hex.
    pub fn parse(raw: &str) -> Result<Self, AdminApiError> {
        let (id, secret) = raw
            .trim()
            .split_once(':')
            .ok_or_else(|| AdminApiError::InvalidKey("expected '{id}:{secret}'".to_string()))?;
        if id.is_empty() || secret.is_empty() {
            return Err(AdminApiError::InvalidKey(
                "key id and secret must both be present".to_string(),
            ));
        }
        let secret = hex::decode(secret)
            .map_err(|e| AdminApiError::InvalidKey(format!("secret is not hex: {e}")))?;

        Ok(Self {
            id: id.to_string(),
            secret,
        })
    }

    /// Returns the key id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Signs a token for the API version `api_version` (e.g. `"v3"`).
    pub fn sign(&self, api_version: &str, ttl: Duration) -> Result<String, AdminApiError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            iat: now,
            exp: now.saturating_add(ttl),
            aud: audience(api_version),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.id.clone());

        Ok(encode(
            &header,
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )?)
    }
}

impl std::fmt::Debug for AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminKey")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Audience claim for an API version.
pub fn audience(api_version: &str) -> String {
    format!("/{api_version}/admin/")
}
