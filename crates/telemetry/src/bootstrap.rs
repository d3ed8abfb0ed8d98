//! [`Bootstrap`]: installs the tracing pipeline at most once.
//!
//! # Setup sequence
//!
//! 1. Resolve the service name (explicit > configured default > constant).
//! 2. Short-circuit with [`TelemetryError::AlreadyInitialised`] if a pipeline
//!    is already installed.
//! 3. Probe the collector over TCP. Failure is logged, never gating.
//! 4. Build the resource, the exporter, and a batch processor on the Tokio runtime.
//! 5. Install the provider and the W3C trace-context propagator globally.
//! 6. Mark the bootstrap initialised.
//! 7. Emit the verification span and wait per [`VerificationWait`].
//!
//! The initialised flag is the bootstrap's own state and is checked and set
//! under one lock. It is set only once the provider is installed: an exporter
//! that fails to build leaves the bootstrap free to retry.

use std::borrow::Cow;
use std::time::Duration;

use common::TelemetryError;
use opentelemetry::global;
use opentelemetry::trace::{Span as _, Tracer as _, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime;
use opentelemetry_sdk::trace::{Config, Tracer, TracerProvider};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::exporter::SpanExporterFactory;
use crate::identity::{resolve_service_name, ServiceIdentity};
use crate::probe::{self, CollectorEndpoint, PROBE_TIMEOUT};

/// Tracer name used for the verification span.
pub const SETUP_TRACER: &str = "telemetry_setup";
/// Name of the verification span.
pub const VERIFICATION_SPAN: &str = "telemetry_test_span";

/// How setup waits for the verification span to leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationWait {
    /// Keep the span open for this long, then end it and let the batch timer export it.
    Hold(Duration),
    /// End the span at once and force-flush the provider.
    Flush,
}

impl Default for VerificationWait {
    fn default() -> Self {
        VerificationWait::Hold(Duration::from_millis(500))
    }
}

/// Knobs for a [`Bootstrap`].
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Name used when `setup` is called without one (normally `OTEL_SERVICE_NAME`).
    pub default_service_name: Option<String>,
    pub collector: CollectorEndpoint,
    pub probe_timeout: Duration,
    pub verification: VerificationWait,
    /// Install the provider and propagator as the process-wide globals.
    pub install_global: bool,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            default_service_name: None,
            collector: CollectorEndpoint::default(),
            probe_timeout: PROBE_TIMEOUT,
            verification: VerificationWait::default(),
            install_global: true,
        }
    }
}

/// An installed tracing pipeline.
///
/// Cheap to clone; every clone shares the same provider.
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    identity: ServiceIdentity,
    provider: TracerProvider,
}

impl TelemetryHandle {
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub fn provider(&self) -> &TracerProvider {
        &self.provider
    }

    /// A tracer scoped to `name`, backed by this pipeline's provider.
    pub fn tracer(&self, name: impl Into<Cow<'static, str>>) -> Tracer {
        self.provider.tracer(name)
    }

    /// Export everything buffered by the batch processor and wait for it.
    ///
    /// Runs on the blocking pool: the batch worker lives on the same runtime
    /// and must stay free to drain its queue.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Setup`] with the first processor error.
    pub async fn flush(&self) -> Result<(), TelemetryError> {
        let provider = self.provider.clone();
        let results = tokio::task::spawn_blocking(move || provider.force_flush())
            .await
            .map_err(|e| TelemetryError::Setup(format!("flush task failed: {e}")))?;

        results
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map(|_| ())
            .map_err(|e| TelemetryError::Setup(format!("flush failed: {e}")))
    }
}

/// One-shot installer for the tracing pipeline.
pub struct Bootstrap<F: SpanExporterFactory> {
    factory: F,
    options: BootstrapOptions,
    state: Mutex<Option<TelemetryHandle>>,
}

impl<F: SpanExporterFactory> Bootstrap<F> {
    pub fn new(factory: F, options: BootstrapOptions) -> Self {
        Self {
            factory,
            options,
            state: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &BootstrapOptions {
        &self.options
    }

    /// The installed pipeline, if setup has completed.
    pub async fn handle(&self) -> Option<TelemetryHandle> {
        self.state.lock().await.clone()
    }

    pub async fn is_initialised(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Install the tracing pipeline for `service_name`.
    ///
    /// # Errors
    ///
    /// - [`TelemetryError::AlreadyInitialised`] if a pipeline is already installed.
    /// - [`TelemetryError::Exporter`] if the exporter cannot be built; the
    ///   bootstrap stays uninitialised.
    pub async fn setup(&self, service_name: Option<&str>) -> Result<TelemetryHandle, TelemetryError> {
        let name = resolve_service_name(service_name, self.options.default_service_name.as_deref());
        info!(service_name = %name, "setting up OpenTelemetry");

        let mut state = self.state.lock().await;
        if state.is_some() {
            info!(service_name = %name, "telemetry already initialised; ignoring setup");
            return Err(TelemetryError::AlreadyInitialised);
        }

        let collector = &self.options.collector;
        match probe::probe(collector, self.options.probe_timeout).await {
            Ok(()) => info!(collector = %collector, "collector reachable"),
            Err(e) => error!(error = %e, "collector connectivity probe failed; continuing"),
        }

        let handle = self.install(name).map_err(|e| {
            error!(error = %e, "error setting up OpenTelemetry");
            e
        })?;
        *state = Some(handle.clone());
        drop(state);

        self.verify(&handle).await;
        info!(service_name = %handle.identity.service_name(), "OpenTelemetry setup complete");
        Ok(handle)
    }

    fn install(&self, name: String) -> Result<TelemetryHandle, TelemetryError> {
        let identity = ServiceIdentity::detect(name);

        info!(collector = %self.options.collector, "configuring OTLP exporter");
        let exporter = self.factory.build(&self.options.collector)?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_config(Config::default().with_resource(identity.to_resource()))
            .build();

        if self.options.install_global {
            global::set_tracer_provider(provider.clone());
            global::set_text_map_propagator(TraceContextPropagator::new());
            info!("global tracer provider and W3C propagator installed");
        }

        Ok(TelemetryHandle { identity, provider })
    }

    async fn verify(&self, handle: &TelemetryHandle) {
        let tracer = handle.tracer(SETUP_TRACER);
        let mut span = tracer.start(VERIFICATION_SPAN);
        span.set_attribute(KeyValue::new("test.attribute", "test-value"));
        span.set_attribute(KeyValue::new(
            "service.name",
            handle.identity.service_name().to_string(),
        ));

        match self.options.verification {
            VerificationWait::Hold(hold) => {
                if !hold.is_zero() {
                    tokio::time::sleep(hold).await;
                }
                span.end();
            }
            VerificationWait::Flush => {
                span.end();
                if let Err(e) = handle.flush().await {
                    warn!(error = %e, "verification span flush failed");
                }
            }
        }
    }
}
