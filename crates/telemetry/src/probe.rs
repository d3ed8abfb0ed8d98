//! Collector address and the best-effort TCP reachability probe.

use std::fmt;
use std::time::Duration;

use common::TelemetryError;
use tokio::net::TcpStream;

/// Connect timeout applied to the reachability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Host and OTLP/gRPC port of the trace collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorEndpoint {
    pub host: String,
    pub port: u16,
}

impl CollectorEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Plaintext gRPC URL handed to the OTLP exporter.
    pub fn grpc_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for CollectorEndpoint {
    /// The Jaeger OTLP ingestion port.
    fn default() -> Self {
        Self::new("jaeger", 4317)
    }
}

impl fmt::Display for CollectorEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Attempt one TCP connection to `endpoint`, closing it immediately.
///
/// Name resolution counts against `timeout`.
///
/// # Errors
///
/// Returns [`TelemetryError::ProbeFailure`] if the connection is refused,
/// the host does not resolve, or the timeout elapses.
pub async fn probe(endpoint: &CollectorEndpoint, timeout: Duration) -> Result<(), TelemetryError> {
    let failure = |reason: String| TelemetryError::ProbeFailure {
        endpoint: endpoint.to_string(),
        reason,
    };

    let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
    match tokio::time::timeout(timeout, connect).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(failure(e.to_string())),
        Err(_) => Err(failure(format!("timed out after {}ms", timeout.as_millis()))),
    }
}
