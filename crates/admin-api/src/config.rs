//! Adapter configuration.

use std::time::Duration;

/// Settings for [`crate::AdminApiHttpClient`].
///
/// The defaults match a stock remote site; tests shrink the timeouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminApiConfig {
    /// API version segment for resource and webhook endpoints (`"v3"`).
    pub api_version: String,
    /// API version segment of the site endpoint. The site endpoint is read
    /// through an older API so very old remotes can still report their
    /// version.
    pub site_api_version: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Lifetime of each signed admin token.
    pub token_ttl: Duration,
    /// Extra attempts for GET and DELETE requests that failed to connect.
    pub transport_retries: u32,
    /// Delay before the first retry; doubled on every further retry.
    pub retry_backoff: Duration,
}

impl Default for AdminApiConfig {
    fn default() -> Self {
        Self {
            api_version: "v3".to_string(),
            site_api_version: "v2".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("hookrelay/", env!("CARGO_PKG_VERSION")).to_string(),
            token_ttl: Duration::from_secs(5 * 60),
            transport_retries: 2,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

impl AdminApiConfig {
    /// Delay before retry number `retry` (1-based).
    pub(crate) fn backoff(&self, retry: u32) -> Duration {
        self.retry_backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}
