//! Shared request state.
//!
//! The counter is the only mutable state shared across concurrent requests.
//! It is owned by the HTTP server and injected into handlers through axum
//! state, never reached through globals.

pub mod counter;

pub use counter::RequestCounter;
