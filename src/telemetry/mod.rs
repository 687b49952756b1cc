//! Distributed tracing subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request headers
//!     → propagation.rs (extract upstream context, W3C Trace Context)
//!     → tracer.rs (open span: child of upstream, or new root)
//!     → span.rs (SpanHandle: attributes, events, sealed on close)
//!     → export.rs (OTLP/HTTP delivery to the collector)
//! ```
//!
//! # Design Decisions
//! - Context extraction never fails; malformed headers start a new root
//! - A span is sealed exactly once on every exit path (ending the handle
//!   consumes it, dropping an open handle seals it)
//! - Export is decoupled from request handling by a channel; a collector
//!   outage is invisible to HTTP callers

pub mod context;
pub mod export;
pub mod propagation;
pub mod span;
pub mod tracer;

pub use context::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};
pub use export::{ExportError, InMemoryExporter, OtlpHttpExporter, SpanExporter};
pub use propagation::{extract_context, inject_context, HeaderCarrier};
pub use span::{AttributeValue, SpanData, SpanEvent, SpanHandle, SpanKind};
pub use tracer::Tracer;
