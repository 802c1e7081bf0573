//! Version-gated Admin API writes.
//!
//! Some actions (create or update a member) work on every supported remote
//! version, but individual fields only exist on newer ones. [`GatedWriter`]
//! checks the resource-wide requirement plus the requirement of each field the
//! payload actually sets, then performs the write.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::errors::TriggerError;
use crate::gate::VersionGate;
use crate::ports::{AdminApiClient, RemoteVersionProvider};
use crate::{AuthContext, Entity, FieldRequirement, ResourceName, VersionRequirement};

/// Writes entities of one resource after checking field-level requirements.
pub struct GatedWriter {
    resource: ResourceName,
    base: VersionRequirement,
    fields: Vec<FieldRequirement>,
    gate: VersionGate,
    admin: Arc<dyn AdminApiClient>,
}

impl GatedWriter {
    /// Creates a writer for `resource` with no field requirements.
    pub fn new(
        resource: ResourceName,
        base: VersionRequirement,
        versions: Arc<dyn RemoteVersionProvider>,
        admin: Arc<dyn AdminApiClient>,
    ) -> Self {
        Self {
            resource,
            base,
            fields: Vec::new(),
            gate: VersionGate::new(versions),
            admin,
        }
    }

    /// Adds a field that needs a newer version than the resource itself.
    #[must_use]
    pub fn with_field(mut self, field: FieldRequirement) -> Self {
        self.fields.push(field);
        self
    }

    /// Creates a new entity.
    ///
    /// # Errors
    ///
    /// - [`TriggerError::InvalidInput`] if `payload` is not a JSON object.
    /// - [`TriggerError::IncompatibleVersion`] if the resource or any field
    ///   the payload sets is unsupported; nothing is written.
    /// - [`TriggerError::RemoteService`] with the remote's message when the
    ///   write is rejected.
    #[instrument(name = "gated_add", skip(self, payload, auth), fields(resource = %self.resource))]
    pub async fn create(&self, payload: &Entity, auth: &AuthContext) -> Result<Entity, TriggerError> {
        self.check(payload, auth).await?;
        let entity = self.admin.add(auth, &self.resource, payload).await?;
        info!("entity created");
        Ok(entity)
    }

    /// Updates the entity with the given id. Same errors as
    /// [`GatedWriter::create`].
    #[instrument(name = "gated_edit", skip(self, payload, auth), fields(resource = %self.resource))]
    pub async fn update(
        &self,
        id: &str,
        payload: &Entity,
        auth: &AuthContext,
    ) -> Result<Entity, TriggerError> {
        if id.trim().is_empty() {
            return Err(TriggerError::invalid_input("entity id is empty"));
        }
        self.check(payload, auth).await?;
        let entity = self.admin.edit(auth, &self.resource, id, payload).await?;
        info!("entity updated");
        Ok(entity)
    }

    async fn check(&self, payload: &Entity, auth: &AuthContext) -> Result<(), TriggerError> {
        if !payload.is_object() {
            return Err(TriggerError::invalid_input(format!(
                "{} payload must be a JSON object",
                self.resource
            )));
        }
        self.gate
            .check_fields(&self.base, &self.fields, payload, auth)
            .await?;
        Ok(())
    }
}
