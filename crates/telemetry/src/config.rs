//! Telemetry configuration loaded from environment variables.
//!
//! The collector address is deliberately absent: exports always go to
//! [`crate::probe::CollectorEndpoint::default`].

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::bootstrap::{BootstrapOptions, VerificationWait};

/// Validated telemetry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Default service name used when `setup` is called without one.
    #[serde(default)]
    pub otel_service_name: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long the verification span is held open before it ends.
    #[serde(default = "default_verification_hold_ms")]
    pub telemetry_verification_hold_ms: u64,

    /// Flush the provider after the verification span instead of holding it open.
    #[serde(default)]
    pub telemetry_verification_flush: bool,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_verification_hold_ms() -> u64 {
    500
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otel_service_name: None,
            log_level: default_log_level(),
            telemetry_verification_hold_ms: default_verification_hold_ms(),
            telemetry_verification_flush: false,
        }
    }
}

impl TelemetryConfig {
    /// Load and validate configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_source(None)
    }

    /// Load from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: config::Map<String, String>) -> Result<Self> {
        Self::from_source(Some(vars))
    }

    fn from_source(vars: Option<config::Map<String, String>>) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default().source(vars))
            .build()
            .context("failed to build telemetry configuration from environment")?;

        let c: TelemetryConfig = cfg
            .try_deserialize()
            .context("failed to deserialise telemetry configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            anyhow::bail!("LOG_LEVEL must not be empty");
        }
        Ok(())
    }

    /// Bootstrap options derived from this configuration.
    pub fn bootstrap_options(&self) -> BootstrapOptions {
        let verification = if self.telemetry_verification_flush {
            VerificationWait::Flush
        } else {
            VerificationWait::Hold(Duration::from_millis(self.telemetry_verification_hold_ms))
        };
        BootstrapOptions {
            default_service_name: self.otel_service_name.clone(),
            verification,
            ..BootstrapOptions::default()
        }
    }
}
