//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS, request logging)
//!     → handler: extract trace context → open span
//!         → increment counter
//!         → response.rs (JSON payload)
//!     → close span (handed to the exporter)
//! ```

pub mod response;
pub mod server;

pub use response::DataResponse;
pub use server::HttpServer;
