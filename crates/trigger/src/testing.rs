//! In-memory fakes of every remote port, shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::RemoteError;
use crate::ports::{AdminApiClient, RemoteVersionProvider, WebhookTransport};
use crate::{AuthContext, Entity, ListQuery, RemoteSubscriptionId, ResourceName, Topic};

pub(crate) fn auth() -> AuthContext {
    AuthContext::new(
        "http://hookrelay-test.example.com",
        "5c3e1182e79eace7f58c9c3b:7202e874ccae6f1ee6688bb700f356b672fb078d8465860852652037f7c7459d",
    )
}

// ---------------------------------------------------------------------------

pub(crate) struct FakeVersionProvider {
    version: Mutex<Result<Option<String>, RemoteError>>,
    calls: Mutex<usize>,
}

impl FakeVersionProvider {
    pub(crate) fn new(version: Option<&str>) -> Self {
        Self {
            version: Mutex::new(Ok(version.map(str::to_string))),
            calls: Mutex::new(0),
        }
    }

    pub(crate) fn unreachable() -> Self {
        Self {
            version: Mutex::new(Err(RemoteError::Transport {
                message: "connection refused".to_string(),
            })),
            calls: Mutex::new(0),
        }
    }

    pub(crate) fn set_version(&self, version: Option<&str>) {
        *self.version.lock().unwrap() = Ok(version.map(str::to_string));
    }

    pub(crate) fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RemoteVersionProvider for FakeVersionProvider {
    async fn current_version(&self, _auth: &AuthContext) -> Result<Option<String>, RemoteError> {
        *self.calls.lock().unwrap() += 1;
        self.version.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct FakeWebhookTransport {
    create_responses: Mutex<VecDeque<Result<String, RemoteError>>>,
    delete_responses: Mutex<VecDeque<Result<(), RemoteError>>>,
    pub(crate) created: Mutex<Vec<(String, String)>>,
    pub(crate) deleted: Mutex<Vec<String>>,
}

impl FakeWebhookTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_create(&self, response: Result<&str, RemoteError>) {
        self.create_responses
            .lock()
            .unwrap()
            .push_back(response.map(str::to_string));
    }

    pub(crate) fn push_delete(&self, response: Result<(), RemoteError>) {
        self.delete_responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub(crate) fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookTransport for FakeWebhookTransport {
    async fn create_subscription(
        &self,
        _auth: &AuthContext,
        topic: &Topic,
        target_url: &str,
    ) -> Result<RemoteSubscriptionId, RemoteError> {
        self.created
            .lock()
            .unwrap()
            .push((topic.to_string(), target_url.to_string()));
        let id = self
            .create_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("generated-id".to_string()))?;
        RemoteSubscriptionId::new(id).ok_or_else(|| RemoteError::InvalidResponse {
            message: "empty webhook id".to_string(),
        })
    }

    async fn delete_subscription(
        &self,
        _auth: &AuthContext,
        id: &RemoteSubscriptionId,
    ) -> Result<(), RemoteError> {
        self.deleted.lock().unwrap().push(id.to_string());
        self.delete_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct FakeAdminApi {
    pub(crate) entities: Mutex<Vec<Entity>>,
    pub(crate) queries: Mutex<Vec<(String, ListQuery)>>,
    pub(crate) writes: Mutex<Vec<(String, Option<String>, Entity)>>,
    pub(crate) write_error: Mutex<Option<RemoteError>>,
}

impl FakeAdminApi {
    pub(crate) fn with_entities(entities: Vec<Entity>) -> Self {
        Self {
            entities: Mutex::new(entities),
            ..Self::default()
        }
    }

    pub(crate) fn fail_writes_with(&self, err: RemoteError) {
        *self.write_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn last_query(&self) -> Option<(String, ListQuery)> {
        self.queries.lock().unwrap().last().cloned()
    }

    pub(crate) fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    fn record_write(
        &self,
        resource: &ResourceName,
        id: Option<&str>,
        payload: &Entity,
    ) -> Result<Entity, RemoteError> {
        if let Some(err) = self.write_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.writes.lock().unwrap().push((
            resource.to_string(),
            id.map(str::to_string),
            payload.clone(),
        ));
        let mut stored = payload.clone();
        if let (Some(id), Some(object)) = (id, stored.as_object_mut()) {
            object.insert("id".to_string(), Entity::String(id.to_string()));
        }
        Ok(stored)
    }
}

#[async_trait]
impl AdminApiClient for FakeAdminApi {
    async fn browse(
        &self,
        _auth: &AuthContext,
        resource: &ResourceName,
        query: &ListQuery,
    ) -> Result<Vec<Entity>, RemoteError> {
        self.queries
            .lock()
            .unwrap()
            .push((resource.to_string(), query.clone()));
        Ok(self.entities.lock().unwrap().clone())
    }

    async fn add(
        &self,
        _auth: &AuthContext,
        resource: &ResourceName,
        payload: &Entity,
    ) -> Result<Entity, RemoteError> {
        self.record_write(resource, None, payload)
    }

    async fn edit(
        &self,
        _auth: &AuthContext,
        resource: &ResourceName,
        id: &str,
        payload: &Entity,
    ) -> Result<Entity, RemoteError> {
        self.record_write(resource, Some(id), payload)
    }
}
