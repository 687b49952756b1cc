//! Trace identity types.
//!
//! Implements the identifier model of the W3C Trace Context specification:
//! a 128-bit trace id, a 64-bit span id, and a one-byte flags field. An
//! all-zero identifier is invalid per the spec and is rejected during
//! extraction.

use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// 128-bit trace identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId([u8; 16]);

impl TraceId {
    /// All-zero identifier, invalid by definition.
    pub const INVALID: TraceId = TraceId([0u8; 16]);

    /// Generate a new random trace id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill(&mut bytes);
        Self(bytes)
    }

    /// Parse from a 32-character lowercase hex string.
    pub fn from_hex(hex: &str) -> Result<Self, ContextError> {
        if hex.len() != 32 {
            return Err(ContextError::IdLength { expected: 32, actual: hex.len() });
        }
        let bytes = hex::decode(hex).map_err(|_| ContextError::IdEncoding)?;
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Non-zero check. A zero trace id must never be propagated.
    pub fn is_valid(&self) -> bool {
        self.0.iter().any(|&b| b != 0)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({})", self.to_hex())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for TraceId {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// 64-bit span identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId([u8; 8]);

impl SpanId {
    /// All-zero identifier, invalid by definition.
    pub const INVALID: SpanId = SpanId([0u8; 8]);

    /// Generate a new random span id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 8];
        rand::thread_rng().fill(&mut bytes);
        Self(bytes)
    }

    /// Parse from a 16-character lowercase hex string.
    pub fn from_hex(hex: &str) -> Result<Self, ContextError> {
        if hex.len() != 16 {
            return Err(ContextError::IdLength { expected: 16, actual: hex.len() });
        }
        let bytes = hex::decode(hex).map_err(|_| ContextError::IdEncoding)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_valid(&self) -> bool {
        self.0.iter().any(|&b| b != 0)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({})", self.to_hex())
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for SpanId {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Trace flags bitfield. Bit 0 is the sampled flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceFlags(u8);

impl TraceFlags {
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);
    pub const NONE: TraceFlags = TraceFlags(0x00);

    pub fn new(flags: u8) -> Self {
        Self(flags)
    }

    pub fn is_sampled(&self) -> bool {
        self.0 & 0x01 != 0
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl Default for TraceFlags {
    fn default() -> Self {
        Self::SAMPLED
    }
}

impl fmt::Display for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

/// Vendor-specific trace data carried alongside `traceparent`.
///
/// Preserved verbatim from extraction; the service never interprets entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceState {
    entries: Vec<(String, String)>,
}

impl TraceState {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render in `key1=value1,key2=value2` header form.
    pub fn to_header(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse the `tracestate` header. Entries without a `=` are skipped.
    pub fn from_header(header: &str) -> Self {
        let entries = header
            .split(',')
            .filter_map(|part| {
                let (key, value) = part.split_once('=')?;
                let key = key.trim();
                if key.is_empty() {
                    None
                } else {
                    Some((key.to_string(), value.trim().to_string()))
                }
            })
            .collect();
        Self { entries }
    }
}

/// Immutable identity of one span within a trace.
///
/// Produced either by extraction from inbound headers (`is_remote` set) or
/// locally when a span is opened. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct SpanContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub trace_flags: TraceFlags,
    pub trace_state: TraceState,
    /// True when this context was propagated from another service.
    pub is_remote: bool,
}

impl SpanContext {
    pub fn new(trace_id: TraceId, span_id: SpanId, trace_flags: TraceFlags, is_remote: bool) -> Self {
        Self {
            trace_id,
            span_id,
            trace_flags,
            trace_state: TraceState::new(),
            is_remote,
        }
    }

    pub fn with_trace_state(mut self, trace_state: TraceState) -> Self {
        self.trace_state = trace_state;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.trace_id.is_valid() && self.span_id.is_valid()
    }

    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }
}

/// Errors from parsing trace identifiers.
///
/// Never surfaces past the propagation layer: malformed inbound headers
/// degrade to "no parent context" there.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ContextError {
    #[error("identifier must be {expected} hex characters, got {actual}")]
    IdLength { expected: usize, actual: usize },

    #[error("identifier contains non-hex characters")]
    IdEncoding,
}
