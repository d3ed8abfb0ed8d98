//! Span exporter construction, behind a trait so setup can be exercised
//! without a live collector.

use std::time::Duration;

use common::TelemetryError;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::export::trace::SpanExporter;

use crate::probe::CollectorEndpoint;

/// Per-export deadline for the OTLP exporter.
pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the exporter that the batch processor will drive.
#[cfg_attr(
    test,
    mockall::automock(type Exporter = opentelemetry_sdk::testing::trace::InMemorySpanExporter;)
)]
pub trait SpanExporterFactory: Send + Sync {
    type Exporter: SpanExporter + 'static;

    /// Construct an exporter bound to `collector`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Exporter`] if the exporter cannot be built.
    fn build(&self, collector: &CollectorEndpoint) -> Result<Self::Exporter, TelemetryError>;
}

/// OTLP/gRPC exporter over plaintext tonic.
#[derive(Debug, Clone, Copy, Default)]
pub struct OtlpExporterFactory;

impl SpanExporterFactory for OtlpExporterFactory {
    type Exporter = opentelemetry_otlp::SpanExporter;

    fn build(&self, collector: &CollectorEndpoint) -> Result<Self::Exporter, TelemetryError> {
        opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(collector.grpc_url())
            .with_timeout(EXPORT_TIMEOUT)
            .build_span_exporter()
            .map_err(|e| TelemetryError::Exporter(e.to_string()))
    }
}
