//! Built-in trigger and action definitions.

use std::sync::Arc;

use crate::hook::{AcquisitionMode, HookTrigger, TriggerDefinition, TriggerPorts};
use crate::ports::{AdminApiClient, RemoteVersionProvider};
use crate::writer::GatedWriter;
use crate::{FieldRequirement, RemoteVersion, ResourceName, Topic, TriggerKey, VersionRequirement};

/// Fires when a newsletter is created. Needs newsletter support (5.0).
pub fn newsletter_created() -> TriggerDefinition {
    TriggerDefinition {
        key: TriggerKey::from_static("newsletter_created"),
        noun: "Newsletter".to_string(),
        resource: ResourceName::from_static("newsletters"),
        mode: AcquisitionMode::Push {
            topic: Topic::from_static("newsletter.added"),
        },
        requirement: VersionRequirement::new(RemoteVersion::new(5, 0, 0), "newsletters"),
    }
}

/// Every trigger shipped with the crate.
pub fn all() -> Vec<TriggerDefinition> {
    vec![newsletter_created()]
}

/// Looks a trigger definition up by key.
pub fn find(key: &str) -> Option<TriggerDefinition> {
    all().into_iter().find(|definition| definition.key.as_str() == key)
}

/// Builds the trigger for `definition` over `ports`.
pub fn build(definition: TriggerDefinition, ports: TriggerPorts) -> HookTrigger {
    HookTrigger::new(definition, ports)
}

/// Member writes. Members need 3.0; `labels` need 3.6 and `comped` 3.36.
pub fn member_writer(
    versions: Arc<dyn RemoteVersionProvider>,
    admin: Arc<dyn AdminApiClient>,
) -> GatedWriter {
    GatedWriter::new(
        ResourceName::from_static("members"),
        VersionRequirement::new(RemoteVersion::new(3, 0, 0), "members"),
        versions,
        admin,
    )
    .with_field(FieldRequirement::new("labels", RemoteVersion::new(3, 6, 0)))
    .with_field(FieldRequirement::new("comped", RemoteVersion::new(3, 36, 0)))
}
