//! W3C Trace Context propagation.
//!
//! # Responsibilities
//! - Extract an upstream span context from inbound request headers
//! - Inject a span context into outbound header carriers
//!
//! # Design Decisions
//! - Extraction is a pure function of the carrier, no side effects
//! - Malformed headers degrade to "no parent found", never to an error;
//!   the caller starts a new root trace instead
//! - `tracestate` is carried through verbatim, never interpreted

use axum::http::HeaderMap;
use std::collections::HashMap;

use super::context::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};

/// Header carrying version, trace id, parent span id and flags.
pub const TRACEPARENT: &str = "traceparent";

/// Companion header for vendor-specific trace data.
pub const TRACESTATE: &str = "tracestate";

/// The only `traceparent` version this service emits.
const VERSION: &str = "00";

/// Read access to a request's header mapping.
///
/// Keys are handed to the carrier in lowercase; implementations must match
/// case-insensitively (HTTP header names are).
pub trait HeaderCarrier {
    fn get(&self, key: &str) -> Option<&str>;
    fn set(&mut self, key: &'static str, value: String);
}

impl HeaderCarrier for HeaderMap {
    fn get(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.to_str().ok())
    }

    fn set(&mut self, key: &'static str, value: String) {
        if let Ok(value) = axum::http::HeaderValue::from_str(&value) {
            self.insert(key, value);
        }
    }
}

impl HeaderCarrier for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        self.get(key)
            .or_else(|| {
                self.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .map(|s| s.as_str())
    }

    fn set(&mut self, key: &'static str, value: String) {
        self.insert(key.to_string(), value);
    }
}

/// Reconstruct the upstream span context from inbound headers, if present.
///
/// Returns `None` when no `traceparent` header exists or when it is
/// malformed in any way (wrong field count, wrong field widths, non-hex
/// characters, all-zero identifiers, unparseable flags). The caller treats
/// `None` as "start a new root trace".
pub fn extract_context(carrier: &dyn HeaderCarrier) -> Option<SpanContext> {
    let traceparent = carrier.get(TRACEPARENT)?;
    let (trace_id, span_id, trace_flags) = parse_traceparent(traceparent)?;

    let trace_state = carrier
        .get(TRACESTATE)
        .map(TraceState::from_header)
        .unwrap_or_default();

    Some(SpanContext::new(trace_id, span_id, trace_flags, true).with_trace_state(trace_state))
}

/// Write a span context into an outbound header carrier.
///
/// Invalid contexts are not propagated.
pub fn inject_context(context: &SpanContext, carrier: &mut dyn HeaderCarrier) {
    if !context.is_valid() {
        return;
    }

    carrier.set(TRACEPARENT, format_traceparent(context));
    if !context.trace_state.is_empty() {
        carrier.set(TRACESTATE, context.trace_state.to_header());
    }
}

/// Parse `{version}-{trace-id}-{parent-id}-{flags}`.
///
/// Versions other than `00` are accepted as long as the four known fields
/// parse; fields beyond the fourth are ignored for forward compatibility.
fn parse_traceparent(value: &str) -> Option<(TraceId, SpanId, TraceFlags)> {
    let mut parts = value.trim().split('-');

    let version = parts.next()?;
    if version.len() != 2 || u8::from_str_radix(version, 16).is_err() || version == "ff" {
        return None;
    }

    let trace_id = TraceId::from_hex(parts.next()?).ok()?;
    let span_id = SpanId::from_hex(parts.next()?).ok()?;
    let flags_field = parts.next()?;
    if flags_field.len() != 2 {
        return None;
    }
    let flags = u8::from_str_radix(flags_field, 16).ok()?;

    // Version 00 defines exactly four fields.
    if version == VERSION && parts.next().is_some() {
        return None;
    }

    if !trace_id.is_valid() || !span_id.is_valid() {
        return None;
    }

    Some((trace_id, span_id, TraceFlags::new(flags)))
}

fn format_traceparent(context: &SpanContext) -> String {
    format!(
        "{}-{}-{}-{:02x}",
        VERSION,
        context.trace_id.to_hex(),
        context.span_id.to_hex(),
        context.trace_flags.as_u8()
    )
}
