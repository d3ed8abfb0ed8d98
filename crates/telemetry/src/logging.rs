//! Structured JSON logging with a late-bound OpenTelemetry layer.
//!
//! The subscriber is installed before the tracing pipeline exists so that the
//! bootstrap's own log lines reach stdout. Once setup returns a
//! [`TelemetryHandle`], [`TracingBridge::attach`] swaps the handle's tracer
//! into the reloadable layer and `tracing` spans start flowing to the exporter.

use common::TelemetryError;
use opentelemetry_sdk::trace::Tracer;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use crate::bootstrap::TelemetryHandle;

type OtelLayer = Option<OpenTelemetryLayer<Registry, Tracer>>;

/// Tracer name under which `tracing` spans are exported.
pub const BRIDGE_TRACER: &str = "tracing";

/// Handle to the reloadable OpenTelemetry layer.
#[derive(Clone)]
pub struct TracingBridge {
    otel: reload::Handle<OtelLayer, Registry>,
}

impl TracingBridge {
    /// Export `tracing` spans through `telemetry`'s provider from now on.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Logging`] if the subscriber has been dropped.
    pub fn attach(&self, telemetry: &TelemetryHandle) -> Result<(), TelemetryError> {
        let layer = tracing_opentelemetry::layer().with_tracer(telemetry.tracer(BRIDGE_TRACER));
        self.otel
            .reload(Some(layer))
            .map_err(|e| TelemetryError::Logging(format!("failed to attach OpenTelemetry layer: {e}")))
    }
}

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` overrides `log_level` when set.
///
/// # Errors
///
/// Returns [`TelemetryError::Logging`] if a global subscriber is already set.
pub fn init(log_level: &str) -> Result<TracingBridge, TelemetryError> {
    let (otel, handle) = reload::Layer::new(None);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(otel)
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .map_err(|e| TelemetryError::Logging(format!("failed to initialise tracing subscriber: {e}")))?;

    Ok(TracingBridge { otel: handle })
}
