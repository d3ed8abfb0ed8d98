//! Shared application state injected into every Axum handler.

use telemetry::{RecordMetrics, TelemetryHandle};

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (registry and provider are `Arc`-backed)
/// so that Axum can clone the state for each request.
#[derive(Clone)]
pub struct AppState {
    /// Instruments exposed on `/metrics`.
    pub metrics: RecordMetrics,
    /// The installed tracing pipeline; `None` when setup failed or was skipped.
    pub telemetry: Option<TelemetryHandle>,
}

impl AppState {
    pub fn new(metrics: RecordMetrics, telemetry: Option<TelemetryHandle>) -> Self {
        Self { metrics, telemetry }
    }
}

impl Default for AppState {
    /// Fresh instruments and no tracing pipeline, suitable for tests.
    fn default() -> Self {
        Self::new(
            RecordMetrics::new().unwrap_or_else(|_| telemetry::metrics::global().clone()),
            None,
        )
    }
}
