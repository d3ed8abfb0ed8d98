//! [`ServiceIdentity`]: the resource attributes stamped onto every exported span.

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{
    DEPLOYMENT_ENVIRONMENT, SERVICE_INSTANCE_ID, SERVICE_NAME,
};

/// Fallback service name when neither the caller nor the environment supply one.
pub const DEFAULT_SERVICE_NAME: &str = "kodekloud-record-store-service";

/// Fixed `deployment.environment` resource label.
pub const DEPLOYMENT_ENVIRONMENT_LABEL: &str = "development";

/// Immutable description of the emitting process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    service_name: String,
    instance_id: String,
    environment: String,
}

impl ServiceIdentity {
    /// Build an identity for `service_name` on the current host.
    ///
    /// The instance id is the host name, or `"unknown"` if it cannot be read.
    pub fn detect(service_name: impl Into<String>) -> Self {
        let instance_id = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());
        Self::new(service_name, instance_id)
    }

    /// Build an identity with an explicit instance id.
    pub fn new(service_name: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            instance_id: instance_id.into(),
            environment: DEPLOYMENT_ENVIRONMENT_LABEL.to_string(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// OpenTelemetry resource carrying name, instance id, and environment.
    pub fn to_resource(&self) -> Resource {
        Resource::new(vec![
            KeyValue::new(SERVICE_NAME, self.service_name.clone()),
            KeyValue::new(SERVICE_INSTANCE_ID, self.instance_id.clone()),
            KeyValue::new(DEPLOYMENT_ENVIRONMENT, self.environment.clone()),
        ])
    }
}

/// Pick the effective service name: explicit > environment default > constant.
///
/// Blank values count as absent at every level.
pub fn resolve_service_name(explicit: Option<&str>, env_default: Option<&str>) -> String {
    [explicit, env_default]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SERVICE_NAME)
        .to_string()
}
