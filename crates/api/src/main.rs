//! `record-store-api` — binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Install the tracing pipeline (best-effort; the API serves without it).
//! 4. Build the Axum router and serve until Ctrl-C.
//! 5. Flush buffered spans.

mod config;
mod server;

use anyhow::Result;
use tracing::{info, warn};

use config::Config;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Logging is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Logging
    // -----------------------------------------------------------------------
    let bridge = telemetry::logging::init(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.api_port,
        "record-store-api starting"
    );

    // -----------------------------------------------------------------------
    // 3. Tracing pipeline
    // -----------------------------------------------------------------------
    let handle = match telemetry::global_bootstrap().setup(None).await {
        Ok(handle) => {
            if let Err(e) = bridge.attach(&handle) {
                warn!(error = %e, "tracing spans will not be exported");
            }
            Some(handle)
        }
        Err(e) => {
            warn!(error = %e, "running without tracing");
            None
        }
    };

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(telemetry::metrics::global().clone(), handle.clone());
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.api_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // -----------------------------------------------------------------------
    // 5. Flush
    // -----------------------------------------------------------------------
    if let Some(handle) = handle {
        if let Err(e) = handle.flush().await {
            warn!(error = %e, "final span flush failed");
        }
    }
    info!("record-store-api stopped");
    Ok(())
}
