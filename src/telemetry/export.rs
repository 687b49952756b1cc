//! Span export boundary.
//!
//! # Data Flow
//! ```text
//! SpanHandle::end
//!     → unbounded channel (synchronous handoff)
//!     → run_export_worker (background task)
//!     → SpanExporter::export
//!     → OTLP/HTTP POST {collector}/v1/traces
//! ```
//!
//! # Design Decisions
//! - Delivery is fire-and-forget from the request's point of view: a dead or
//!   slow collector never fails an HTTP request, failures are logged here
//! - One span per export call, matching a simple span processor; batching is
//!   the collector pipeline's job
//! - `InMemoryExporter` gives tests the collector's view of finished spans

use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use super::span::{AttributeValue, SpanData};
use crate::config::TelemetryConfig;

/// Errors from one delivery attempt.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("collector returned status {0}")]
    Rejected(reqwest::StatusCode),
}

/// Sink for sealed spans.
///
/// Implementations own delivery entirely; retry and backoff policy lives
/// behind this trait, not in the request path.
#[async_trait]
pub trait SpanExporter: Send + Sync {
    async fn export(&self, spans: Vec<SpanData>) -> Result<(), ExportError>;
}

/// Drain the span channel into the exporter until all senders are gone.
pub(crate) async fn run_export_worker(
    mut rx: mpsc::UnboundedReceiver<SpanData>,
    exporter: Arc<dyn SpanExporter>,
) {
    while let Some(span) = rx.recv().await {
        if let Err(error) = exporter.export(vec![span]).await {
            tracing::warn!(%error, "Span export failed");
        }
    }
    tracing::debug!("Export worker stopped");
}

/// OTLP-over-HTTP exporter posting JSON-encoded spans to a collector.
pub struct OtlpHttpExporter {
    client: reqwest::Client,
    /// Full URL of the collector's trace endpoint.
    url: String,
    service_name: String,
    timeout: Duration,
}

impl OtlpHttpExporter {
    /// Build an exporter for the configured collector endpoint. The OTLP
    /// trace path (`/v1/traces`) is appended here.
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/v1/traces", config.collector_endpoint.trim_end_matches('/')),
            service_name: config.service_name.clone(),
            timeout: Duration::from_millis(config.export_timeout_ms),
        }
    }

    fn attribute_json(key: &str, value: &AttributeValue) -> serde_json::Value {
        let value = match value {
            AttributeValue::String(v) => json!({ "stringValue": v }),
            AttributeValue::Int(v) => json!({ "intValue": v.to_string() }),
            AttributeValue::Float(v) => json!({ "doubleValue": v }),
            AttributeValue::Bool(v) => json!({ "boolValue": v }),
        };
        json!({ "key": key, "value": value })
    }

    fn span_json(span: &SpanData) -> serde_json::Value {
        json!({
            "traceId": span.context.trace_id.to_hex(),
            "spanId": span.context.span_id.to_hex(),
            "parentSpanId": span.parent_span_id().map(|id| id.to_hex()).unwrap_or_default(),
            "name": span.name,
            "kind": span.kind.otlp_code(),
            "flags": span.context.trace_flags.as_u8(),
            "startTimeUnixNano": span.start_time.timestamp_nanos_opt().unwrap_or(0).to_string(),
            "endTimeUnixNano": span.end_time
                .and_then(|t| t.timestamp_nanos_opt())
                .unwrap_or(0)
                .to_string(),
            "attributes": span.attributes.iter()
                .map(|(k, v)| Self::attribute_json(k, v))
                .collect::<Vec<_>>(),
            "events": span.events.iter().map(|e| json!({
                "timeUnixNano": e.timestamp.timestamp_nanos_opt().unwrap_or(0).to_string(),
                "name": e.name,
            })).collect::<Vec<_>>(),
            "status": {}
        })
    }

    /// Assemble the `ExportTraceServiceRequest` JSON body.
    fn request_body(&self, spans: &[SpanData]) -> serde_json::Value {
        json!({
            "resourceSpans": [{
                "resource": {
                    "attributes": [
                        Self::attribute_json("service.name", &AttributeValue::from(self.service_name.as_str())),
                    ]
                },
                "scopeSpans": [{
                    "scope": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                    "spans": spans.iter().map(Self::span_json).collect::<Vec<_>>(),
                }]
            }]
        })
    }
}

#[async_trait]
impl SpanExporter for OtlpHttpExporter {
    async fn export(&self, spans: Vec<SpanData>) -> Result<(), ExportError> {
        if spans.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&self.request_body(&spans))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExportError::Rejected(response.status()));
        }

        tracing::debug!(count = spans.len(), url = %self.url, "Spans delivered to collector");
        Ok(())
    }
}

/// Exporter that records finished spans in memory, standing in for a
/// collector in tests.
#[derive(Default)]
pub struct InMemoryExporter {
    spans: Mutex<Vec<SpanData>>,
}

impl InMemoryExporter {
    /// Snapshot of every span delivered so far, in delivery order.
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans.lock().expect("exporter lock poisoned").clone()
    }
}

#[async_trait]
impl SpanExporter for InMemoryExporter {
    async fn export(&self, spans: Vec<SpanData>) -> Result<(), ExportError> {
        self.spans.lock().expect("exporter lock poisoned").extend(spans);
        Ok(())
    }
}
