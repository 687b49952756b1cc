//! Traced backend service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod state;
pub mod telemetry;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use telemetry::Tracer;
