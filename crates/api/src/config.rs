//! Configuration loading and validation for the API host.
//!
//! Telemetry settings live in [`telemetry::TelemetryConfig`] and are loaded
//! separately from the same environment.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated API host configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on.
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_port() -> u16 {
    8000
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be a non-zero port");
        }
        if self.log_level.trim().is_empty() {
            anyhow::bail!("LOG_LEVEL is required and must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_api_port(), 8000);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_rejects_zero_port() {
        let cfg = Config {
            api_port: 0,
            log_level: default_log_level(),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_log_level() {
        let cfg = Config {
            api_port: default_api_port(),
            log_level: "".into(),
        };
        assert!(cfg.validate().is_err());
    }
}
