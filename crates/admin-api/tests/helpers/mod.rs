//! Fake remote site for adapter integration tests.
//!
//! [`spawn_fake_site`] serves a minimal Admin API on `127.0.0.1:0` that checks
//! admin tokens, records every request and keeps webhooks in memory.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::{json, Value};

pub const KEY_ID: &str = "5c3e1182e79eace7f58c9c3b";
pub const KEY_SECRET: &str = "7202e874ccae6f1ee6688bb700f356b672fb078d8465860852652037f7c7459d";

pub fn admin_key() -> String {
    format!("{KEY_ID}:{KEY_SECRET}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct FakeSite {
    pub version: Option<String>,
    pub newsletters: Vec<Value>,
    pub webhooks: HashMap<String, Value>,
    /// Member ids that answer edits with 404.
    pub removed_members: Vec<String>,
    /// When set, webhook creation answers 404 as if the integration was deleted.
    pub integration_revoked: bool,
    pub requests: Vec<RecordedRequest>,
    next_id: u32,
}

pub type SharedSite = Arc<Mutex<FakeSite>>;

pub fn fake_site(version: Option<&str>) -> SharedSite {
    Arc::new(Mutex::new(FakeSite {
        version: version.map(str::to_string),
        newsletters: vec![
            json!({"id": "n2", "name": "Weekly", "created_at": "2024-02-01T00:00:00.000Z"}),
            json!({"id": "n1", "name": "Daily", "created_at": "2024-01-01T00:00:00.000Z"}),
        ],
        ..FakeSite::default()
    }))
}

/// Serves `site` on an ephemeral port and returns its base URL.
pub async fn spawn_fake_site(site: SharedSite) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake site");
    let addr = listener.local_addr().expect("Failed to get local addr");

    let router = Router::new()
        .route("/ghost/api/v2/admin/site/", get(site_info))
        .route("/ghost/api/v3/admin/newsletters/", get(browse_newsletters))
        .route("/ghost/api/v3/admin/webhooks/", post(create_webhook))
        .route("/ghost/api/v3/admin/webhooks/{id}/", delete(delete_webhook))
        .route("/ghost/api/v3/admin/members/", post(add_member))
        .route("/ghost/api/v3/admin/members/{id}/", put(edit_member))
        .with_state(site);

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Fake site failed");
    });

    format!("http://{addr}")
}

/// Returns a base URL nothing listens on.
pub async fn closed_site_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    drop(listener);
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn record(site: &SharedSite, method: Method, path: String, query: HashMap<String, String>) {
    site.lock().unwrap().requests.push(RecordedRequest {
        method,
        path,
        query,
    });
}

fn error(status: StatusCode, message: &str, context: Option<&str>, kind: &str) -> Response {
    (
        status,
        Json(json!({"errors": [{"message": message, "context": context, "type": kind}]})),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap, audience: &str) -> bool {
    let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Ghost "))
    else {
        return false;
    };

    let kid_matches = decode_header(token)
        .map(|header| header.kid.as_deref() == Some(KEY_ID))
        .unwrap_or(false);

    let secret = hex::decode(KEY_SECRET).unwrap();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);
    kid_matches && decode::<Value>(token, &DecodingKey::from_secret(&secret), &validation).is_ok()
}

fn unauthorized() -> Response {
    error(
        StatusCode::UNAUTHORIZED,
        "Authorization failed",
        Some("Unable to determine the authenticated user or integration."),
        "UnauthorizedError",
    )
}

async fn site_info(State(site): State<SharedSite>, headers: HeaderMap) -> Response {
    record(&site, Method::GET, "site".to_string(), HashMap::new());
    if !authorized(&headers, "/v2/admin/") {
        return unauthorized();
    }
    let version = site.lock().unwrap().version.clone();
    Json(json!({"site": {"title": "Fake Site", "version": version}})).into_response()
}

async fn browse_newsletters(
    State(site): State<SharedSite>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&site, Method::GET, "newsletters".to_string(), query.clone());
    if !authorized(&headers, "/v3/admin/") {
        return unauthorized();
    }
    let mut newsletters = site.lock().unwrap().newsletters.clone();
    if query.get("limit").map(String::as_str) == Some("1") {
        newsletters.truncate(1);
    }
    Json(json!({"newsletters": newsletters, "meta": {}})).into_response()
}

async fn create_webhook(
    State(site): State<SharedSite>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&site, Method::POST, "webhooks".to_string(), HashMap::new());
    if !authorized(&headers, "/v3/admin/") {
        return unauthorized();
    }
    if site.lock().unwrap().integration_revoked {
        return error(
            StatusCode::NOT_FOUND,
            "Resource not found error, cannot save webhook.",
            Some("Integration not found."),
            "NotFoundError",
        );
    }
    let webhook = body["webhooks"][0].clone();
    if webhook["target_url"].as_str().unwrap_or_default().is_empty() {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Validation error, cannot save webhook.",
            Some("Value in [webhooks.target_url] cannot be blank."),
            "ValidationError",
        );
    }

    let mut state = site.lock().unwrap();
    state.next_id += 1;
    let id = format!("wh{}", state.next_id);
    let stored = json!({
        "id": id,
        "event": webhook["event"],
        "target_url": webhook["target_url"],
    });
    state.webhooks.insert(id, stored.clone());
    (StatusCode::CREATED, Json(json!({"webhooks": [stored]}))).into_response()
}

async fn delete_webhook(
    State(site): State<SharedSite>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    record(&site, Method::DELETE, format!("webhooks/{id}"), HashMap::new());
    if !authorized(&headers, "/v3/admin/") {
        return unauthorized();
    }
    match site.lock().unwrap().webhooks.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            "Resource not found error, cannot delete webhook.",
            Some("Webhook not found."),
            "NotFoundError",
        ),
    }
}

async fn add_member(State(site): State<SharedSite>, headers: HeaderMap) -> Response {
    record(&site, Method::POST, "members".to_string(), HashMap::new());
    if !authorized(&headers, "/v3/admin/") {
        return unauthorized();
    }
    error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Authorization failed",
        Some("Unable to determine the authenticated user or integration. Check that cookies are being passed through if using session authentication."),
        "InternalServerError",
    )
}

async fn edit_member(
    State(site): State<SharedSite>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&site, Method::PUT, format!("members/{id}"), HashMap::new());
    if !authorized(&headers, "/v3/admin/") {
        return unauthorized();
    }
    if site.lock().unwrap().removed_members.contains(&id) {
        return error(
            StatusCode::NOT_FOUND,
            "Resource not found error, cannot edit member.",
            Some("Member not found."),
            "NotFoundError",
        );
    }
    let mut member = body["members"][0].clone();
    let email_ok = member
        .get("email")
        .and_then(Value::as_str)
        .map_or(true, |email| email.contains('@'));
    if !email_ok {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Validation error, cannot edit member.",
            Some("Validation (isEmail) failed for email"),
            "ValidationError",
        );
    }
    member["id"] = json!(id);
    Json(json!({"members": [member]})).into_response()
}
