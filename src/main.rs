//! Traced backend service.
//!
//! A minimal HTTP service answering `GET /api/data` with a greeting and a
//! per-process request count, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌────────────────────────────────────────────┐
//!                        │              TRACED BACKEND                │
//!                        │                                            │
//!   Client Request       │  ┌──────────┐   ┌───────────────────────┐  │
//!   ────────────────────►│  │   http   │──►│ telemetry/propagation │  │
//!   (traceparent?)       │  │  server  │   │  (extract context)    │  │
//!                        │  └────┬─────┘   └──────────┬────────────┘  │
//!                        │       │                    ▼               │
//!                        │       │         ┌───────────────────────┐  │
//!                        │       │         │   telemetry/tracer    │  │
//!                        │       │         │ (open → close span)   │  │
//!                        │       ▼         └──────────┬────────────┘  │
//!                        │  ┌──────────┐              ▼               │
//!   Client Response      │  │  state   │   ┌───────────────────────┐  │
//!   ◄────────────────────│  │ counter  │   │   telemetry/export    │──┼──► OTLP
//!   {message, count}     │  └──────────┘   │ (OTLP/HTTP delivery)  │  │    collector
//!                        │                 └───────────────────────┘  │
//!                        └────────────────────────────────────────────┘
//! ```
//!
//! Every request produces exactly one SERVER span: a child of the caller's
//! trace when a valid `traceparent` header arrives, a fresh root otherwise.

use std::path::Path;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use traced_backend::config::{load_config, ServiceConfig};
use traced_backend::http::HttpServer;
use traced_backend::lifecycle::Shutdown;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "traced_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("traced-backend v{} starting", env!("CARGO_PKG_VERSION"));

    // Load configuration; defaults apply when no file is given.
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => ServiceConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        collector_endpoint = %config.telemetry.collector_endpoint,
        service_name = %config.telemetry.service_name,
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Create and run HTTP server
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
