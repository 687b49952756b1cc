//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use traced_backend::config::ServiceConfig;
use traced_backend::http::HttpServer;
use traced_backend::lifecycle::Shutdown;
use traced_backend::telemetry::{InMemoryExporter, SpanData, Tracer};

/// A running service instance with an in-memory collector.
pub struct TestServer {
    pub addr: SocketAddr,
    pub exporter: Arc<InMemoryExporter>,
    // Dropping this ends the server task gracefully.
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until at least `expected` spans reached the exporter.
    ///
    /// Export is asynchronous, so spans can trail the HTTP response by a
    /// scheduler tick or two.
    pub async fn finished_spans(&self, expected: usize) -> Vec<SpanData> {
        for _ in 0..100 {
            let spans = self.exporter.finished_spans();
            if spans.len() >= expected {
                return spans;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} spans, collector saw {}",
            expected,
            self.exporter.finished_spans().len()
        );
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the service on an ephemeral loopback port with an in-memory
/// exporter standing in for the OTLP collector.
pub async fn start_test_server() -> TestServer {
    let exporter = Arc::new(InMemoryExporter::default());
    let config = ServiceConfig::default();

    let tracer = Tracer::new(&config.telemetry.service_name, exporter.clone());
    let server = HttpServer::with_tracer(config, tracer);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestServer {
        addr,
        exporter,
        shutdown,
    }
}
