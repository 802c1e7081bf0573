//! Version gating.
//!
//! [`VersionGate`] is the single policy object applied before every gated
//! remote call (subscribe, list, gated writes). It fetches the remote version
//! fresh on every check and fails closed when the version is missing or
//! unparsable.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::errors::TriggerError;
use crate::ports::RemoteVersionProvider;
use crate::{AuthContext, Entity, FieldRequirement, RemoteVersion, VersionRequirement};

/// Shown in place of the detected version when the remote reports none.
const UNKNOWN_VERSION: &str = "unknown";

/// Decides whether the connected remote service supports an operation.
#[derive(Clone)]
pub struct VersionGate {
    provider: Arc<dyn RemoteVersionProvider>,
}

impl VersionGate {
    /// Creates a gate backed by the given version provider.
    pub fn new(provider: Arc<dyn RemoteVersionProvider>) -> Self {
        Self { provider }
    }

    /// Fetches the remote version and checks it against `requirement`.
    ///
    /// Returns the detected version on success.
    ///
    /// # Errors
    ///
    /// - [`TriggerError::IncompatibleVersion`] when the version is below the
    ///   minimum, absent, or unparsable.
    /// - [`TriggerError::Transport`] / [`TriggerError::RemoteService`] when the
    ///   version could not be fetched.
    #[instrument(
        name = "version_gate",
        skip(self, requirement, auth),
        fields(capability = %requirement.capability, minimum = %requirement.minimum)
    )]
    pub async fn check_compatible(
        &self,
        requirement: &VersionRequirement,
        auth: &AuthContext,
    ) -> Result<RemoteVersion, TriggerError> {
        let reported = self.provider.current_version(auth).await?;
        evaluate(requirement, reported.as_deref())
    }

    /// Checks a base requirement plus the requirement of every field present
    /// in `payload`, using a single version fetch.
    ///
    /// Fields that are absent or `null` are not checked. The first unmet
    /// requirement is reported, labelled with its own capability.
    #[instrument(name = "version_gate_fields", skip_all, fields(fields = fields.len()))]
    pub async fn check_fields(
        &self,
        base: &VersionRequirement,
        fields: &[FieldRequirement],
        payload: &Entity,
        auth: &AuthContext,
    ) -> Result<RemoteVersion, TriggerError> {
        let reported = self.provider.current_version(auth).await?;
        let reported = reported.as_deref();

        let version = evaluate(base, reported)?;
        for field in fields {
            let present = payload
                .get(&field.field)
                .is_some_and(|value| !value.is_null());
            if present {
                evaluate(&field.requirement, reported)?;
            }
        }
        Ok(version)
    }
}

/// Evaluates a reported version string against a requirement without any
/// I/O.
///
/// # Errors
///
/// [`TriggerError::IncompatibleVersion`] when `reported` is `None`, does not
/// parse, or is older than the requirement's minimum.
pub fn evaluate(
    requirement: &VersionRequirement,
    reported: Option<&str>,
) -> Result<RemoteVersion, TriggerError> {
    let incompatible = |detected: &str| TriggerError::IncompatibleVersion {
        capability: requirement.capability.clone(),
        minimum: requirement.minimum,
        detected: detected.to_string(),
    };

    let Some(raw) = reported else {
        warn!(capability = %requirement.capability, "remote did not report a version");
        return Err(incompatible(UNKNOWN_VERSION));
    };

    let Some(version) = RemoteVersion::parse(raw) else {
        warn!(capability = %requirement.capability, reported = raw, "unparsable remote version");
        return Err(incompatible(raw));
    };

    if !version.satisfies(requirement.minimum) {
        warn!(
            capability = %requirement.capability,
            minimum = %requirement.minimum,
            detected = raw,
            "remote version below requirement"
        );
        return Err(incompatible(raw));
    }

    debug!(detected = %version, "remote version accepted");
    Ok(version)
}
