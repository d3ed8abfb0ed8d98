//! OpenTelemetry bootstrap and Prometheus instruments for the record-store service.
//!
//! - [`Bootstrap::setup`] installs an OTLP/gRPC tracing pipeline at most once
//!   and returns a [`TelemetryHandle`] that consumers pass around explicitly.
//! - [`setup_telemetry`] and [`get_tracer`] are process-wide shims over
//!   [`global_bootstrap`] for code that expects ambient globals.
//! - [`metrics`] declares the service's counters and histograms.
//!
//! # Telemetry invariants
//!
//! - Setup never panics and never propagates a failure as anything but a
//!   value; a host that ignores the outcome runs without tracing.
//! - Once a provider has been installed it is never replaced by this crate.

pub mod bootstrap;
pub mod config;
pub mod exporter;
pub mod identity;
pub mod logging;
pub mod metrics;
pub mod probe;

use std::borrow::Cow;
use std::sync::OnceLock;

use opentelemetry::global::{self, BoxedTracer};
use tracing::warn;

pub use bootstrap::{Bootstrap, BootstrapOptions, TelemetryHandle, VerificationWait};
pub use config::TelemetryConfig;
pub use exporter::{OtlpExporterFactory, SpanExporterFactory};
pub use identity::ServiceIdentity;
pub use metrics::RecordMetrics;
pub use probe::CollectorEndpoint;

static GLOBAL_BOOTSTRAP: OnceLock<Bootstrap<OtlpExporterFactory>> = OnceLock::new();

/// The process-wide bootstrap, configured from the environment on first use.
///
/// Configuration errors fall back to defaults with a warning.
pub fn global_bootstrap() -> &'static Bootstrap<OtlpExporterFactory> {
    GLOBAL_BOOTSTRAP.get_or_init(|| {
        let cfg = TelemetryConfig::from_env().unwrap_or_else(|e| {
            warn!(error = %e, "invalid telemetry configuration; using defaults");
            TelemetryConfig::default()
        });
        Bootstrap::new(OtlpExporterFactory, cfg.bootstrap_options())
    })
}

/// Install the process-wide tracing pipeline.
///
/// Returns `true` only for the call that installed it. Repeat calls and
/// failures return `false`; failures are logged by [`Bootstrap::setup`].
pub async fn setup_telemetry(service_name: Option<&str>) -> bool {
    installed(global_bootstrap(), service_name).await
}

async fn installed<F: SpanExporterFactory>(bootstrap: &Bootstrap<F>, service_name: Option<&str>) -> bool {
    bootstrap.setup(service_name).await.is_ok()
}

/// A tracer from the globally installed provider.
///
/// Before setup (or after a failed setup) this is the no-op tracer.
pub fn get_tracer(name: impl Into<Cow<'static, str>>) -> BoxedTracer {
    global::tracer(name)
}
