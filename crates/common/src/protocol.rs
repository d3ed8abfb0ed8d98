//! Response bodies returned by the record-store API.
//!
//! These types are serialised as JSON over the public HTTP API.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Root / health
// ---------------------------------------------------------------------------

/// Response body for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process is serving.
    pub status: String,
    /// Package version of the running binary.
    pub version: String,
    /// Whether the tracing pipeline was installed at startup.
    pub tracing: bool,
}

// ---------------------------------------------------------------------------
// Trace test
// ---------------------------------------------------------------------------

/// Response body for `GET /trace-test`.
///
/// Identifiers are lowercase hex (32 chars for traces, 16 for spans) and are
/// `None` when tracing is not installed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceTestResponse {
    pub message: String,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
}

/// Response body for `GET /error-test`, sent with `500 Internal Server Error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorTestResponse {
    pub error: String,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"not_found"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_new() {
        let e = ErrorResponse::new("not_found", "the requested resource does not exist");
        assert_eq!(e.code, "not_found");
        assert!(e.message.contains("does not exist"));
    }

    #[test]
    fn trace_test_without_ids_serialises_nulls() {
        let body = TraceTestResponse {
            message: "Test spans created".into(),
            trace_id: None,
            span_id: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["trace_id"].is_null());
        assert!(json["span_id"].is_null());
    }
}
