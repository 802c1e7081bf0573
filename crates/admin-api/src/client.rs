//! HTTP implementation of the remote ports.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use trigger::{
    AdminApiClient, AuthContext, Entity, ListQuery, RemoteError, RemoteSubscriptionId,
    RemoteVersionProvider, ResourceName, Topic, WebhookTransport,
};

use crate::config::AdminApiConfig;
use crate::errors::{error_message, AdminApiError};
use crate::token::AdminKey;

/// Admin API client over `reqwest`.
///
/// Holds no per-account state: every call signs a fresh token from the
/// [`AuthContext`] it is given, so one client serves any number of sites.
#[derive(Debug, Clone)]
pub struct AdminApiHttpClient {
    http: reqwest::Client,
    config: AdminApiConfig,
}

/// One request against the Admin API.
struct Call<'a> {
    method: Method,
    api_version: &'a str,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<Value>,
}

impl<'a> Call<'a> {
    fn new(method: Method, api_version: &'a str, path: impl Into<String>) -> Self {
        Self {
            method,
            api_version,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    fn query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn is_idempotent(&self) -> bool {
        matches!(self.method, Method::GET | Method::DELETE)
    }
}

impl AdminApiHttpClient {
    /// Builds a client with the given configuration.
    ///
    /// # Errors
    ///
    /// [`AdminApiError::Client`] if the TLS backend cannot be initialised.
    pub fn new(config: AdminApiConfig) -> Result<Self, AdminApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http, config })
    }

    fn url(&self, auth: &AuthContext, call: &Call<'_>) -> String {
        format!(
            "{}/ghost/api/{}/admin/{}",
            auth.base_url(),
            call.api_version,
            call.path
        )
    }

    /// Sends `call`, retrying idempotent requests that failed to connect.
    /// Returns the decoded body, or `None` for empty success responses.
    async fn send(&self, auth: &AuthContext, call: Call<'_>) -> Result<Option<Value>, RemoteError> {
        let key = AdminKey::parse(&auth.admin_api_key)?;
        let url = self.url(auth, &call);
        let attempts = if call.is_idempotent() {
            self.config.transport_retries.saturating_add(1)
        } else {
            1
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let token = key.sign(call.api_version, self.config.token_ttl)?;
            let mut request = self
                .http
                .request(call.method.clone(), &url)
                .header(AUTHORIZATION, format!("Ghost {token}"));
            if !call.query.is_empty() {
                request = request.query(&call.query);
            }
            if let Some(body) = &call.body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => return read_response(response).await,
                Err(err) if attempt < attempts && (err.is_connect() || err.is_timeout()) => {
                    let delay = self.config.backoff(attempt);
                    warn!(
                        method = %call.method,
                        path = %call.path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    return Err(RemoteError::Transport {
                        message: err.to_string(),
                    })
                }
            }
        }
    }

    async fn send_expecting(
        &self,
        auth: &AuthContext,
        call: Call<'_>,
    ) -> Result<Value, RemoteError> {
        self.send(auth, call)
            .await?
            .ok_or_else(|| invalid("response body was empty"))
    }
}

async fn read_response(response: reqwest::Response) -> Result<Option<Value>, RemoteError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| RemoteError::Transport {
        message: e.to_string(),
    })?;
    debug!(status = status.as_u16(), "admin api response");

    if status == StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound {
            message: error_message(status, &text),
        });
    }
    if !status.is_success() {
        return Err(RemoteError::Rejected {
            status: status.as_u16(),
            message: error_message(status, &text),
        });
    }
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| invalid(format!("body is not JSON: {e}")))
}

fn invalid(message: impl Into<String>) -> RemoteError {
    RemoteError::InvalidResponse {
        message: message.into(),
    }
}

/// Wraps a payload as `{resource: [payload]}`.
fn envelope(resource: &ResourceName, payload: &Entity) -> Value {
    let mut body = serde_json::Map::new();
    body.insert(resource.to_string(), Value::Array(vec![payload.clone()]));
    Value::Object(body)
}

/// Returns `body[resource]` as an array.
fn collection(mut body: Value, resource: &str) -> Result<Vec<Value>, RemoteError> {
    match body.get_mut(resource).map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(invalid(format!("'{resource}' is not an array"))),
        None => Err(invalid(format!("response has no '{resource}' key"))),
    }
}

/// Returns the first element of `body[resource]`.
fn first(body: Value, resource: &str) -> Result<Value, RemoteError> {
    collection(body, resource)?
        .into_iter()
        .next()
        .ok_or_else(|| invalid(format!("'{resource}' is empty")))
}

// ---------------------------------------------------------------------------
// Port implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl RemoteVersionProvider for AdminApiHttpClient {
    #[instrument(name = "admin_api_site", skip_all)]
    async fn current_version(&self, auth: &AuthContext) -> Result<Option<String>, RemoteError> {
        let call = Call::new(Method::GET, &self.config.site_api_version, "site/");
        let body = self.send_expecting(auth, call).await?;
        let site = body
            .get("site")
            .ok_or_else(|| invalid("response has no 'site' key"))?;
        Ok(site
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[async_trait]
impl AdminApiClient for AdminApiHttpClient {
    #[instrument(name = "admin_api_browse", skip(self, auth, query), fields(resource = %resource))]
    async fn browse(
        &self,
        auth: &AuthContext,
        resource: &ResourceName,
        query: &ListQuery,
    ) -> Result<Vec<Entity>, RemoteError> {
        let call = Call::new(
            Method::GET,
            &self.config.api_version,
            format!("{resource}/"),
        )
        .query("order", query.order_clause())
        .query("limit", query.limit.to_string());
        let body = self.send_expecting(auth, call).await?;
        collection(body, resource.as_str())
    }

    #[instrument(name = "admin_api_add", skip(self, auth, payload), fields(resource = %resource))]
    async fn add(
        &self,
        auth: &AuthContext,
        resource: &ResourceName,
        payload: &Entity,
    ) -> Result<Entity, RemoteError> {
        let call = Call::new(
            Method::POST,
            &self.config.api_version,
            format!("{resource}/"),
        )
        .body(envelope(resource, payload));
        let body = self.send_expecting(auth, call).await?;
        first(body, resource.as_str())
    }

    #[instrument(name = "admin_api_edit", skip(self, auth, payload), fields(resource = %resource))]
    async fn edit(
        &self,
        auth: &AuthContext,
        resource: &ResourceName,
        id: &str,
        payload: &Entity,
    ) -> Result<Entity, RemoteError> {
        let call = Call::new(
            Method::PUT,
            &self.config.api_version,
            format!("{resource}/{id}/"),
        )
        .body(envelope(resource, payload));
        let body = self.send_expecting(auth, call).await?;
        first(body, resource.as_str())
    }
}

#[async_trait]
impl WebhookTransport for AdminApiHttpClient {
    #[instrument(name = "admin_api_webhook_create", skip(self, auth, target_url), fields(topic = %topic))]
    async fn create_subscription(
        &self,
        auth: &AuthContext,
        topic: &Topic,
        target_url: &str,
    ) -> Result<RemoteSubscriptionId, RemoteError> {
        let call = Call::new(Method::POST, &self.config.api_version, "webhooks/").body(json!({
            "webhooks": [{ "event": topic.as_str(), "target_url": target_url }]
        }));
        let body = self.send_expecting(auth, call).await?;
        let webhook = first(body, "webhooks")?;
        webhook
            .get("id")
            .and_then(Value::as_str)
            .and_then(RemoteSubscriptionId::new)
            .ok_or_else(|| invalid("webhook has no id"))
    }

    #[instrument(name = "admin_api_webhook_delete", skip(self, auth), fields(remote_id = %id))]
    async fn delete_subscription(
        &self,
        auth: &AuthContext,
        id: &RemoteSubscriptionId,
    ) -> Result<(), RemoteError> {
        let call = Call::new(
            Method::DELETE,
            &self.config.api_version,
            format!("webhooks/{id}/"),
        );
        self.send(auth, call).await?;
        Ok(())
    }
}
