//! Axum request handlers for all service endpoints.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    ErrorResponse, ErrorTestResponse, HealthResponse, RootResponse, TraceTestResponse,
};
use opentelemetry::trace::{Span as _, SpanContext, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};
use tracing::{error, info, warn};

use super::state::AppState;

/// Tracer name for spans created by the API's own routes.
pub(super) const TRACER_NAME: &str = "record-store-api";

/// `GET /` — liveness banner.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "KodeKloud Record Store API is running!".into(),
    })
}

/// `GET /health` — always `200 OK` while serving.
///
/// `tracing` reports whether the tracing pipeline was installed; its absence
/// is degraded telemetry, not an unhealthy service.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        tracing: state.telemetry.is_some(),
    })
}

/// `GET /metrics` — Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, telemetry::metrics::CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "metrics rendering failed");
            let err = ErrorResponse::new("internal_error", "metrics unavailable");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(err)).into_response()
        }
    }
}

/// `GET /trace-test` — emit a parent span and one child span.
pub async fn trace_test(State(state): State<AppState>) -> Json<TraceTestResponse> {
    let body = match &state.telemetry {
        Some(t) => emit_test_spans(&t.tracer(TRACER_NAME)),
        None => emit_test_spans(&telemetry::get_tracer(TRACER_NAME)),
    };
    Json(body)
}

/// `GET /error-test` — emit a span marked as failed and answer `500`.
pub async fn error_test(State(state): State<AppState>) -> Response {
    let body = match &state.telemetry {
        Some(t) => emit_error_span(&t.tracer(TRACER_NAME)),
        None => emit_error_span(&telemetry::get_tracer(TRACER_NAME)),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

fn emit_test_spans<T>(tracer: &T) -> TraceTestResponse
where
    T: Tracer,
    T::Span: Send + Sync + 'static,
{
    let mut parent = tracer.start("test-span");
    parent.set_attribute(KeyValue::new("test.attribute", "test-value"));
    parent.set_attribute(KeyValue::new("custom.operation", "trace-test"));
    let parent_cx = Context::current_with_span(parent);

    let mut child = tracer.start_with_context("child-span", &parent_cx);
    child.set_attribute(KeyValue::new("relationship", "child"));
    child.end();

    let parent = parent_cx.span();
    let (trace_id, span_id) = hex_ids(parent.span_context());
    parent.end();

    info!(
        trace_id = trace_id.as_deref().unwrap_or("-"),
        span_id = span_id.as_deref().unwrap_or("-"),
        "trace test executed"
    );

    TraceTestResponse {
        message: "Test spans created".into(),
        trace_id,
        span_id,
    }
}

fn emit_error_span<T: Tracer>(tracer: &T) -> ErrorTestResponse {
    let mut span = tracer.start("error-span");
    span.set_attribute(KeyValue::new("error", true));
    span.set_attribute(KeyValue::new("custom.operation", "error-simulation"));
    span.set_status(Status::error("Simulated error for testing"));
    let (trace_id, span_id) = hex_ids(span.span_context());

    error!(
        span_name = "error-span",
        error_type = "SimulatedError",
        trace_id = trace_id.as_deref().unwrap_or("-"),
        span_id = span_id.as_deref().unwrap_or("-"),
        "error test executed"
    );
    span.end();

    ErrorTestResponse {
        error: "Simulated error".into(),
        trace_id,
        span_id,
    }
}

fn hex_ids(sc: &SpanContext) -> (Option<String>, Option<String>) {
    if sc.is_valid() {
        (Some(sc.trace_id().to_string()), Some(sc.span_id().to_string()))
    } else {
        (None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use opentelemetry::trace::{SpanId, TraceFlags, TraceId, TraceState};
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/trace-test", get(trace_test))
            .with_state(AppState::default())
    }

    #[tokio::test]
    async fn health_is_ok_without_tracing() {
        let app = test_router();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn trace_test_without_pipeline_returns_no_ids() {
        let Json(body) = trace_test(State(AppState::default())).await;
        assert!(body.trace_id.is_none());
        assert!(body.span_id.is_none());
    }

    #[tokio::test]
    async fn error_test_answers_500_without_pipeline() {
        let resp = error_test(State(AppState::default())).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn hex_ids_for_valid_context() {
        let sc = SpanContext::new(
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(),
            SpanId::from_hex("00f067aa0ba902b7").unwrap(),
            TraceFlags::SAMPLED,
            false,
            TraceState::default(),
        );
        let (trace_id, span_id) = hex_ids(&sc);
        assert_eq!(trace_id.as_deref(), Some("4bf92f3577b34da6a3ce929d0e0e4736"));
        assert_eq!(span_id.as_deref(), Some("00f067aa0ba902b7"));
    }

    #[test]
    fn hex_ids_for_invalid_context() {
        assert_eq!(hex_ids(&SpanContext::empty_context()), (None, None));
    }
}
