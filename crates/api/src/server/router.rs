//! Axum router construction.

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/trace-test", get(handlers::trace_test))
        .route("/error-test", get(handlers::error_test))
        .fallback(handlers::not_found)
        .layer(from_fn_with_state(state.clone(), middleware::track_request))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{body::Body, http::Request};
    use common::protocol::ErrorTestResponse;
    use common::TelemetryError;
    use opentelemetry::global;
    use opentelemetry::trace::{SpanId, SpanKind, Status, TraceId};
    use opentelemetry::Value;
    use opentelemetry_sdk::export::trace::SpanData;
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
    use telemetry::{
        Bootstrap, BootstrapOptions, CollectorEndpoint, RecordMetrics, SpanExporterFactory,
        VerificationWait,
    };
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    struct InMemoryFactory(InMemorySpanExporter);

    impl SpanExporterFactory for InMemoryFactory {
        type Exporter = InMemorySpanExporter;

        fn build(&self, _collector: &CollectorEndpoint) -> Result<Self::Exporter, TelemetryError> {
            Ok(self.0.clone())
        }
    }

    /// State backed by a local pipeline exporting into `exporter`.
    async fn traced_state(exporter: &InMemorySpanExporter) -> (Bootstrap<InMemoryFactory>, AppState) {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let bootstrap = Bootstrap::new(
            InMemoryFactory(exporter.clone()),
            BootstrapOptions {
                default_service_name: None,
                collector: CollectorEndpoint::new("127.0.0.1", port),
                probe_timeout: Duration::from_millis(200),
                verification: VerificationWait::Flush,
                install_global: false,
            },
        );
        let handle = bootstrap.setup(Some("record-store-api")).await.unwrap();
        let state = AppState::new(RecordMetrics::new().unwrap(), Some(handle));
        (bootstrap, state)
    }

    async fn finished_spans(state: &AppState, exporter: &InMemorySpanExporter) -> Vec<SpanData> {
        state.telemetry.as_ref().unwrap().flush().await.unwrap();
        exporter.get_finished_spans().unwrap()
    }

    fn named<'a>(spans: &'a [SpanData], name: &str) -> &'a SpanData {
        spans
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("no span named {name}"))
    }

    fn attr<'a>(span: &'a SpanData, key: &str) -> Option<&'a Value> {
        span.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| &kv.value)
    }

    // Dropping the last provider clone shuts the batch processor down synchronously.
    async fn release(bootstrap: Bootstrap<InMemoryFactory>, state: AppState) {
        tokio::task::spawn_blocking(move || drop((bootstrap, state)))
            .await
            .unwrap();
    }

    async fn get_status(app: Router, uri: &str) -> axum::http::StatusCode {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build(AppState::default());
        assert_eq!(get_status(app, "/unknown").await, 404);
    }

    #[tokio::test]
    async fn root_and_health_are_ok() {
        let state = AppState::default();
        assert_eq!(get_status(build(state.clone()), "/").await, 200);
        assert_eq!(get_status(build(state), "/health").await, 200);
    }

    #[tokio::test]
    async fn requests_are_counted_under_normalised_route() {
        let state = AppState::default();
        assert_eq!(get_status(build(state.clone()), "/records/42").await, 404);

        let counted = state
            .metrics
            .http_requests_total
            .with_label_values(&["GET", "/records/{id}", "404"])
            .get();
        assert_eq!(counted, 1);
        let errors = state
            .metrics
            .http_errors_total
            .with_label_values(&["/records/{id}", "4xx"])
            .get();
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn metrics_endpoint_exposes_text_format() {
        let state = AppState::default();
        let app = build(state.clone());
        assert_eq!(get_status(app.clone(), "/health").await, 200);

        let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()[axum::http::header::CONTENT_TYPE],
            telemetry::metrics::CONTENT_TYPE
        );
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("http_requests_total{"));
        assert!(text.contains(r#"endpoint="/health""#));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn request_span_continues_incoming_trace() {
        let exporter = InMemorySpanExporter::default();
        let (bootstrap, state) = traced_state(&exporter).await;

        let req = Request::builder()
            .uri("/records/42")
            .header(
                "traceparent",
                "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            )
            .body(Body::empty())
            .unwrap();
        let resp = build(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);

        let spans = finished_spans(&state, &exporter).await;
        let span = named(&spans, "GET /records/{id}");
        assert_eq!(span.span_kind, SpanKind::Server);
        assert_eq!(
            span.span_context.trace_id(),
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
        );
        assert_eq!(span.parent_span_id, SpanId::from_hex("00f067aa0ba902b7").unwrap());
        assert_eq!(attr(span, "http.method"), Some(&Value::from("GET")));
        assert_eq!(attr(span, "http.route"), Some(&Value::from("/records/{id}")));
        assert_eq!(attr(span, "http.status_code"), Some(&Value::I64(404)));
        assert!(matches!(span.status, Status::Error { .. }));

        release(bootstrap, state).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn successful_request_span_is_not_failed() {
        let exporter = InMemorySpanExporter::default();
        let (bootstrap, state) = traced_state(&exporter).await;

        assert_eq!(get_status(build(state.clone()), "/health").await, 200);

        let spans = finished_spans(&state, &exporter).await;
        let span = named(&spans, "GET /health");
        assert_eq!(span.parent_span_id, SpanId::INVALID);
        assert_eq!(attr(span, "http.status_code"), Some(&Value::I64(200)));
        assert!(!matches!(span.status, Status::Error { .. }));

        release(bootstrap, state).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn error_test_returns_500_and_failed_spans() {
        let exporter = InMemorySpanExporter::default();
        let (bootstrap, state) = traced_state(&exporter).await;

        let req = Request::builder().uri("/error-test").body(Body::empty()).unwrap();
        let resp = build(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 500);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: ErrorTestResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Simulated error");

        let spans = finished_spans(&state, &exporter).await;
        let error_span = named(&spans, "error-span");
        let request_span = named(&spans, "GET /error-test");

        assert_eq!(
            body.trace_id.as_deref(),
            Some(error_span.span_context.trace_id().to_string().as_str())
        );
        assert_eq!(
            body.span_id.as_deref(),
            Some(error_span.span_context.span_id().to_string().as_str())
        );
        assert_eq!(error_span.parent_span_id, request_span.span_context.span_id());
        assert_eq!(attr(error_span, "error"), Some(&Value::Bool(true)));
        assert_eq!(
            attr(error_span, "custom.operation"),
            Some(&Value::from("error-simulation"))
        );
        assert_eq!(
            error_span.status,
            Status::error("Simulated error for testing")
        );
        assert!(matches!(request_span.status, Status::Error { .. }));
        assert_eq!(attr(request_span, "http.status_code"), Some(&Value::I64(500)));

        release(bootstrap, state).await;
    }
}
