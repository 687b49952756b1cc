//! Span records and lifecycle handles.
//!
//! # Data Flow
//! ```text
//! Tracer::start_span
//!     → SpanHandle (exclusive owner, OPEN)
//!     → set_attribute / add_event during handling
//!     → end() or Drop
//!     → SpanData sealed (end_time set, CLOSED)
//!     → sent once on the export channel
//! ```
//!
//! # Design Decisions
//! - `end` consumes the handle, so a double close does not typecheck
//! - Dropping an un-ended handle seals and submits the span, so the span is
//!   closed on every exit path, including connection aborts and panics
//! - The CLOSED state is terminal: a sealed `SpanData` leaves the handle and
//!   is never mutated again

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::mpsc;

use super::context::SpanContext;

/// Role of a span relative to its trace, per the OpenTelemetry model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanKind {
    #[default]
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

impl SpanKind {
    /// Numeric code used by the OTLP wire format.
    pub fn otlp_code(&self) -> u8 {
        match self {
            SpanKind::Internal => 1,
            SpanKind::Server => 2,
            SpanKind::Client => 3,
            SpanKind::Producer => 4,
            SpanKind::Consumer => 5,
        }
    }
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpanKind::Internal => write!(f, "INTERNAL"),
            SpanKind::Server => write!(f, "SERVER"),
            SpanKind::Client => write!(f, "CLIENT"),
            SpanKind::Producer => write!(f, "PRODUCER"),
            SpanKind::Consumer => write!(f, "CONSUMER"),
        }
    }
}

/// Scalar attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<u64> for AttributeValue {
    fn from(v: u64) -> Self {
        AttributeValue::Int(v as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

/// Timestamped annotation within a span.
#[derive(Debug, Clone)]
pub struct SpanEvent {
    pub name: String,
    pub timestamp: DateTime<Utc>,
}

/// Complete record of one timed unit of work.
///
/// While a request is in flight this lives inside a [`SpanHandle`];
/// `end_time` is `None` exactly until the span is sealed.
#[derive(Debug, Clone)]
pub struct SpanData {
    /// This span's own identity.
    pub context: SpanContext,
    /// Upstream context this span descends from, if any.
    pub parent: Option<SpanContext>,
    pub name: String,
    pub kind: SpanKind,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub attributes: HashMap<String, AttributeValue>,
    pub events: Vec<SpanEvent>,
}

impl SpanData {
    /// Span id of the logical parent, when this span is not a root.
    pub fn parent_span_id(&self) -> Option<super::context::SpanId> {
        self.parent.as_ref().map(|p| p.span_id)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Exclusive owner of an open span.
///
/// Created by [`Tracer::start_span`](super::tracer::Tracer::start_span).
/// Mutation is only possible through the handle, and ending the span
/// consumes it, which is what makes the OPEN → CLOSED transition one-way.
pub struct SpanHandle {
    // None after sealing; Drop uses this to tell whether `end` already ran.
    data: Option<SpanData>,
    sink: mpsc::UnboundedSender<SpanData>,
}

impl SpanHandle {
    pub(crate) fn new(data: SpanData, sink: mpsc::UnboundedSender<SpanData>) -> Self {
        Self { data: Some(data), sink }
    }

    /// Identity of the span being recorded.
    pub fn context(&self) -> &SpanContext {
        // Invariant: `data` is Some for the whole life of the handle.
        &self.data.as_ref().expect("span already sealed").context
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        if let Some(data) = self.data.as_mut() {
            data.attributes.insert(key.into(), value.into());
        }
    }

    /// Record a named, timestamped annotation. Events keep insertion order,
    /// which is also timestamp order within the span.
    pub fn add_event(&mut self, name: impl Into<String>) {
        if let Some(data) = self.data.as_mut() {
            data.events.push(SpanEvent {
                name: name.into(),
                timestamp: Utc::now(),
            });
        }
    }

    /// Seal the span and hand it to the exporter.
    ///
    /// Consuming `self` means a second close does not compile; the `Drop`
    /// guard sees the emptied slot and does nothing more.
    pub fn end(mut self) {
        self.seal();
    }

    fn seal(&mut self) {
        let Some(mut data) = self.data.take() else {
            return;
        };
        data.end_time = Some(Utc::now());

        tracing::debug!(
            trace_id = %data.context.trace_id,
            span_id = %data.context.span_id,
            name = %data.name,
            "Span closed"
        );

        // The receiver only disappears during shutdown; losing a span there
        // is acceptable, failing the request is not.
        if self.sink.send(data).is_err() {
            tracing::warn!("Export channel closed, span discarded");
        }
    }
}

impl Drop for SpanHandle {
    fn drop(&mut self) {
        self.seal();
    }
}
