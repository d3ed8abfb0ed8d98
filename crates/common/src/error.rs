//! Common error types shared across crates.

use thiserror::Error;

/// Errors surfaced by the telemetry bootstrap and the metric layer.
///
/// Setup never propagates these past the boolean shim; they exist so that
/// callers holding a `Bootstrap` can tell the outcomes apart:
/// - [`TelemetryError::AlreadyInitialised`] is a no-op, not a failure.
/// - [`TelemetryError::ProbeFailure`] is logged and ignored by setup.
/// - Every other variant is a setup failure.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Setup already ran to completion in this process.
    #[error("telemetry already initialised")]
    AlreadyInitialised,

    /// The collector did not accept a TCP connection within the probe timeout.
    #[error("collector unreachable at {endpoint}: {reason}")]
    ProbeFailure { endpoint: String, reason: String },

    /// The span exporter could not be constructed.
    #[error("failed to build span exporter: {0}")]
    Exporter(String),

    /// Any other failure while assembling or installing the pipeline.
    #[error("telemetry setup failed: {0}")]
    Setup(String),

    /// A metric could not be registered or encoded.
    #[error("metrics error: {0}")]
    Metrics(String),

    /// The tracing subscriber could not be installed or reloaded.
    #[error("logging error: {0}")]
    Logging(String),
}

impl TelemetryError {
    /// Returns `true` for the idempotent no-op outcome.
    pub fn is_already_initialised(&self) -> bool {
        matches!(self, TelemetryError::AlreadyInitialised)
    }
}
