//! Process lifecycle coordination.
//!
//! The service is long-running; termination happens via process signals or,
//! in tests, by triggering the shutdown broadcast explicitly.

pub mod shutdown;

pub use shutdown::Shutdown;
