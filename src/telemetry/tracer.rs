//! Span lifecycle management.
//!
//! # Responsibilities
//! - Open spans linked to an upstream trace, or as fresh roots
//! - Hand sealed spans to the export worker without blocking the request
//!
//! # Design Decisions
//! - Opening a span is pure bookkeeping, no I/O and no locks
//! - The handoff to the exporter is an unbounded channel send: synchronous
//!   from the span's point of view, asynchronous delivery
//! - Export failures never propagate back into request handling

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::context::{SpanContext, SpanId, TraceFlags, TraceId};
use super::export::{run_export_worker, SpanExporter};
use super::span::{SpanData, SpanHandle, SpanKind};

/// Factory for request spans.
///
/// One tracer per service process. Cloning is cheap; clones feed the same
/// export worker.
#[derive(Clone)]
pub struct Tracer {
    service_name: Arc<str>,
    sink: mpsc::UnboundedSender<SpanData>,
}

impl Tracer {
    /// Create a tracer and spawn the export worker draining its spans into
    /// `exporter`. Must be called from within a Tokio runtime.
    pub fn new(service_name: &str, exporter: Arc<dyn SpanExporter>) -> Self {
        let (sink, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_export_worker(rx, exporter));
        Self {
            service_name: Arc::from(service_name),
            sink,
        }
    }

    /// Service name stamped on the exported resource.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Open a span.
    ///
    /// With a parent context the new span joins the parent's trace: same
    /// trace id, parent's span id recorded as the logical parent. Without
    /// one the span becomes the root of a brand new trace. The returned
    /// handle exclusively owns the span until it is ended.
    pub fn start_span(
        &self,
        name: impl Into<String>,
        kind: SpanKind,
        parent: Option<SpanContext>,
    ) -> SpanHandle {
        let name = name.into();
        let context = match &parent {
            Some(upstream) => SpanContext::new(
                upstream.trace_id,
                SpanId::generate(),
                upstream.trace_flags,
                false,
            ),
            None => SpanContext::new(
                TraceId::generate(),
                SpanId::generate(),
                TraceFlags::SAMPLED,
                false,
            ),
        };

        tracing::debug!(
            trace_id = %context.trace_id,
            span_id = %context.span_id,
            parent_span_id = ?parent.as_ref().map(|p| p.span_id.to_hex()),
            kind = %kind,
            name = %name,
            "Span opened"
        );

        SpanHandle::new(
            SpanData {
                context,
                parent,
                name,
                kind,
                start_time: chrono::Utc::now(),
                end_time: None,
                attributes: HashMap::new(),
                events: Vec::new(),
            },
            self.sink.clone(),
        )
    }
}
