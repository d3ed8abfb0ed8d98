//! Axum middleware applied to the router.
//!
//! Includes the per-request server span and request metrics, plus the timeout
//! constant used by the timeout layer.

use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use common::labels::normalize_route;
use opentelemetry::global;
use opentelemetry::propagation::{Extractor, TextMapPropagator as _};
use opentelemetry::trace::{FutureExt as _, SpanKind, Status, TraceContextExt as _, Tracer};
use opentelemetry::{Context, KeyValue};

use super::handlers::TRACER_NAME;
use super::state::AppState;

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads W3C trace-context headers off an incoming request.
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Wrap every request in a server span and record its metrics.
///
/// The span is named `"{method} {route}"` and continues any trace carried in
/// the request headers. Statuses of 400 and above mark it as failed. The
/// route label is the normalised path so that ids do not mint new series.
pub async fn track_request(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = normalize_route(req.uri().path());
    let parent =
        global::get_text_map_propagator(|propagator| propagator.extract(&HeaderExtractor(req.headers())));

    let cx = match &state.telemetry {
        Some(t) => start_request_span(&t.tracer(TRACER_NAME), &parent, &method, &route),
        None => start_request_span(&telemetry::get_tracer(TRACER_NAME), &parent, &method, &route),
    };

    let resp = next.run(req).with_context(cx.clone()).await;
    let status = resp.status().as_u16();

    let span = cx.span();
    span.set_attribute(KeyValue::new("http.status_code", i64::from(status)));
    if status >= 400 {
        span.set_status(Status::error(format!("HTTP {status}")));
    }
    span.end();

    state
        .metrics
        .record_request(&method, &route, status, start.elapsed().as_secs_f64());
    resp
}

fn start_request_span<T>(tracer: &T, parent: &Context, method: &str, route: &str) -> Context
where
    T: Tracer,
    T::Span: Send + Sync + 'static,
{
    let span = tracer
        .span_builder(format!("{method} {route}"))
        .with_kind(SpanKind::Server)
        .with_attributes(vec![
            KeyValue::new("http.method", method.to_string()),
            KeyValue::new("http.route", route.to_string()),
        ])
        .start_with_context(tracer, parent);
    parent.with_span(span)
}
