//! HTTP server setup and request handling.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (CORS, request logging)
//! - Bind the server to a listener with graceful shutdown
//! - Orchestrate the per-request tracing lifecycle around domain logic
//!
//! # Design Decisions
//! - The span boundary is strict: domain logic (the counter) knows nothing
//!   about tracing and cannot leave a span open if it fails
//! - The span is closed after the response value is built; closing is a
//!   non-blocking channel send, so span finalization never adds latency
//!   observable by the caller

use axum::{
    extract::State,
    http::{HeaderMap, Method},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::response::DataResponse;
use crate::state::RequestCounter;
use crate::telemetry::{extract_context, OtlpHttpExporter, SpanKind, Tracer};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub tracer: Tracer,
    pub counter: Arc<RequestCounter>,
}

/// HTTP server for the traced backend.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server exporting spans to the configured OTLP collector.
    pub fn new(config: ServiceConfig) -> Self {
        let exporter = Arc::new(OtlpHttpExporter::new(&config.telemetry));
        let tracer = Tracer::new(&config.telemetry.service_name, exporter);
        Self::with_tracer(config, tracer)
    }

    /// Create a server around an existing tracer. Tests use this to swap in
    /// an in-memory exporter.
    pub fn with_tracer(config: ServiceConfig, tracer: Tracer) -> Self {
        tracing::info!(
            service_name = tracer.service_name(),
            "Tracer initialized"
        );

        let state = AppState {
            tracer,
            counter: Arc::new(RequestCounter::new()),
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        // Browser callers live on a different origin; responses must be
        // readable cross-origin.
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET])
            .allow_headers(Any);

        Router::new()
            .route("/api/data", get(get_data))
            .with_state(state)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires or ctrl-c arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {}
                    _ = ctrl_c() => {}
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Handler for `GET /api/data`.
///
/// Lifecycle per request: extract upstream context → open exactly one
/// SERVER span → domain logic → build response → close span. The handle's
/// drop guard seals the span even if the connection is aborted mid-way.
async fn get_data(State(state): State<AppState>, headers: HeaderMap) -> Json<DataResponse> {
    let parent = extract_context(&headers);

    let mut span = state.tracer.start_span("handle-api-data", SpanKind::Server, parent);
    span.set_attribute("http.method", "GET");
    span.set_attribute("http.route", "/api/data");

    let count = state.counter.increment_and_get();

    let response = Json(DataResponse::new(count));

    // Sealed after the response value is handed to the framework; the send
    // to the export worker does not block.
    span.end();

    response
}

async fn ctrl_c() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to install Ctrl+C handler");
        // Leave shutdown to the broadcast channel.
        std::future::pending::<()>().await;
    }
}
