//! Prometheus instruments for the record-store service.
//!
//! Every instrument is declared once with a fixed label schema. New label
//! values create series on demand; a label list of the wrong length is
//! rejected with [`prometheus::Error::InconsistentCardinality`] by the
//! `get_metric_with_label_values` accessors (the `with_label_values`
//! shorthand panics instead).

use common::labels::error_class;
use common::TelemetryError;
use lazy_static::lazy_static;
use prometheus::{
    histogram_opts, opts, register_histogram_vec_with_registry,
    register_histogram_with_registry, register_int_counter_vec_with_registry, Encoder, Histogram,
    HistogramVec, IntCounterVec, Registry, TextEncoder,
};

/// Content type of [`RecordMetrics::render`] output.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Bucket boundaries (seconds) for end-to-end order processing.
pub const ORDER_PROCESSING_BUCKETS: [f64; 6] = [1.0, 2.0, 3.0, 5.0, 10.0, 30.0];

lazy_static! {
    static ref GLOBAL: RecordMetrics = RecordMetrics::new()
        .expect("FATAL: failed to register record-store metrics - check for duplicate registration");
}

/// Process-wide instruments, registered on first use.
pub fn global() -> &'static RecordMetrics {
    &GLOBAL
}

/// The service's instruments and the registry that exposes them.
///
/// Cloning is cheap; every clone shares the same series.
#[derive(Clone)]
pub struct RecordMetrics {
    registry: Registry,

    /// Time for an order to be fully processed.
    pub order_processing_time: Histogram,

    // --- Traffic / latency / errors ---
    /// Labels: `method`, `endpoint`, `status_code`.
    pub http_requests_total: IntCounterVec,
    /// Labels: `method`, `endpoint`.
    pub http_request_duration_seconds: HistogramVec,
    /// Labels: `endpoint`, `error_type`.
    pub http_errors_total: IntCounterVec,

    // --- Business ---
    /// Labels: `action_type`, `status`.
    pub user_actions_total: IntCounterVec,
}

impl RecordMetrics {
    /// Register all instruments on a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns the registry's error if any instrument is rejected.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let order_processing_time = register_histogram_with_registry!(
            histogram_opts!(
                "order_processing_time_seconds",
                "Time taken for an order to be fully processed",
                ORDER_PROCESSING_BUCKETS.to_vec()
            ),
            registry
        )?;

        let http_requests_total = register_int_counter_vec_with_registry!(
            opts!("http_requests_total", "Total HTTP requests"),
            &["method", "endpoint", "status_code"],
            registry
        )?;

        let http_request_duration_seconds = register_histogram_vec_with_registry!(
            histogram_opts!(
                "http_request_duration_seconds",
                "HTTP request duration in seconds"
            ),
            &["method", "endpoint"],
            registry
        )?;

        let http_errors_total = register_int_counter_vec_with_registry!(
            opts!("http_errors_total", "Total HTTP errors"),
            &["endpoint", "error_type"],
            registry
        )?;

        let user_actions_total = register_int_counter_vec_with_registry!(
            opts!("user_actions_total", "Total user actions"),
            &["action_type", "status"],
            registry
        )?;

        Ok(Self {
            registry,
            order_processing_time,
            http_requests_total,
            http_request_duration_seconds,
            http_errors_total,
            user_actions_total,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record one served HTTP request.
    ///
    /// `endpoint` should already be normalised. Statuses of 400 and above also
    /// count towards `http_errors_total` under their status class.
    pub fn record_request(&self, method: &str, endpoint: &str, status: u16, elapsed_secs: f64) {
        let status_code = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_code])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(elapsed_secs);
        if status >= 400 {
            self.http_errors_total
                .with_label_values(&[endpoint, &error_class(status)])
                .inc();
        }
    }

    /// Record a user action outcome.
    pub fn record_user_action(&self, action_type: &str, success: bool) {
        let status = if success { "success" } else { "failure" };
        self.user_actions_total
            .with_label_values(&[action_type, status])
            .inc();
    }

    pub fn observe_order_processing(&self, elapsed_secs: f64) {
        self.order_processing_time.observe(elapsed_secs);
    }

    /// Encode every series in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Metrics`] if encoding fails.
    pub fn render(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| TelemetryError::Metrics(format!("failed to encode metrics: {e}")))?;
        String::from_utf8(buf)
            .map_err(|e| TelemetryError::Metrics(format!("metrics output is not UTF-8: {e}")))
    }
}
