//! End-to-end tests for the `/api/data` endpoint and its tracing behavior.

use std::collections::HashSet;

use traced_backend::http::DataResponse;
use traced_backend::telemetry::SpanKind;

mod common;

const TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

#[tokio::test]
async fn first_request_without_headers_starts_root_trace() {
    let server = common::start_test_server().await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/api/data")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let body: DataResponse = response.json().await.unwrap();
    assert_eq!(body.message, "Hello from the backend!");
    assert_eq!(body.count, 1);

    let spans = server.finished_spans(1).await;
    assert_eq!(spans.len(), 1);

    let span = &spans[0];
    assert!(span.is_root());
    assert!(span.context.trace_id.is_valid());
    assert_eq!(span.name, "handle-api-data");
    assert_eq!(span.kind, SpanKind::Server);
    assert!(span.end_time.unwrap() >= span.start_time);
}

#[tokio::test]
async fn traceparent_header_links_span_to_upstream_trace() {
    let server = common::start_test_server().await;
    let client = reqwest::Client::new();

    // First request establishes count 1; the traced request is the second.
    client.get(server.url("/api/data")).send().await.unwrap();

    let response = client
        .get(server.url("/api/data"))
        .header("traceparent", TRACEPARENT)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: DataResponse = response.json().await.unwrap();
    assert_eq!(body.count, 2);

    let spans = server.finished_spans(2).await;
    let traced = spans
        .iter()
        .find(|s| !s.is_root())
        .expect("second span should join the upstream trace");

    assert_eq!(traced.context.trace_id.to_hex(), "4bf92f3577b34da6a3ce929d0e0e4736");
    assert_eq!(
        traced.parent_span_id().map(|id| id.to_hex()),
        Some("00f067aa0ba902b7".to_string())
    );
    // The service's own span id is fresh, not the caller's.
    assert_ne!(traced.context.span_id.to_hex(), "00f067aa0ba902b7");

    assert_eq!(
        traced.attributes.get("http.method").cloned(),
        Some("GET".into())
    );
    assert_eq!(
        traced.attributes.get("http.route").cloned(),
        Some("/api/data".into())
    );
}

#[tokio::test]
async fn corrupted_traceparent_degrades_to_new_root() {
    let server = common::start_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/api/data"))
        .header("traceparent", "00-4bf92f3577b34da6-trunc")
        .send()
        .await
        .unwrap();

    // Never rejected: treated exactly like a request with no headers.
    assert_eq!(response.status(), 200);
    let body: DataResponse = response.json().await.unwrap();
    assert_eq!(body.count, 1);

    let spans = server.finished_spans(1).await;
    assert!(spans[0].is_root());
    assert_ne!(spans[0].context.trace_id.to_hex(), "4bf92f3577b34da6a3ce929d0e0e4736");
}

#[tokio::test]
async fn roots_from_separate_requests_get_distinct_trace_ids() {
    let server = common::start_test_server().await;
    let client = reqwest::Client::new();

    for _ in 0..5 {
        client.get(server.url("/api/data")).send().await.unwrap();
    }

    let spans = server.finished_spans(5).await;
    let trace_ids: HashSet<String> = spans.iter().map(|s| s.context.trace_id.to_hex()).collect();
    assert_eq!(trace_ids.len(), 5);
}

#[tokio::test]
async fn concurrent_requests_count_without_loss_and_trace_completely() {
    let server = common::start_test_server().await;
    let client = reqwest::Client::new();

    let mut tasks = Vec::new();
    for _ in 0..100 {
        let client = client.clone();
        let url = server.url("/api/data");
        tasks.push(tokio::spawn(async move {
            let response = client.get(&url).send().await.unwrap();
            assert_eq!(response.status(), 200);
            response.json::<DataResponse>().await.unwrap().count
        }));
    }

    let mut counts = HashSet::new();
    for task in tasks {
        counts.insert(task.await.unwrap());
    }

    // No duplicates and no gaps across all concurrent responses.
    assert_eq!(counts, (1..=100).collect::<HashSet<u64>>());

    // Exactly one span per request, each sealed with ordered timestamps.
    let spans = server.finished_spans(100).await;
    assert_eq!(spans.len(), 100);
    assert!(spans.iter().all(|s| s.end_time.unwrap() >= s.start_time));

    let span_ids: HashSet<String> = spans.iter().map(|s| s.context.span_id.to_hex()).collect();
    assert_eq!(span_ids.len(), 100);
}

#[tokio::test]
async fn responses_carry_permissive_cors_headers() {
    let server = common::start_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/api/data"))
        .header("origin", "http://frontend.example")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn unknown_route_is_not_served() {
    let server = common::start_test_server().await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/api/other")).send().await.unwrap();
    assert_eq!(response.status(), 404);

    // No span is opened for unrouted requests.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(server.exporter.finished_spans().is_empty());
}
