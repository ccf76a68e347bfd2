//! Completion poller tests: scripted status sequences against a mock job URL.

mod common;
use common::*;

use std::sync::Arc;
use std::time::Duration;

use excelrelay_core::{ExcelError, RawPayload};
use excelrelay_http::{ClientConfig, ExcelClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_pending(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

fn job_url(server: &MockServer) -> String {
    format!("{}/jobs/42", server.uri())
}

#[tokio::test]
async fn test_pending_then_done() {
    let server = MockServer::start().await;
    mount_pending(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x50, 0x4B, 0x03, 0x04]))
        .mount(&server)
        .await;

    let (client, delay) = client_for(&server, 10);
    let payload = client.poller().run(&job_url(&server), false).await.unwrap();

    assert_eq!(payload, RawPayload::Bytes(vec![0x50, 0x4B, 0x03, 0x04]));
    assert_eq!(hits(&server, "/jobs/42").await, 3);
    assert_eq!(delay.calls(), 2);
}

#[tokio::test]
async fn test_json_result_is_parsed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rows": [] })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 3);
    let payload = client.poller().run(&job_url(&server), true).await.unwrap();
    assert_eq!(payload, RawPayload::Json(json!({ "rows": [] })));
}

#[tokio::test]
async fn test_ceiling_reached() {
    let server = MockServer::start().await;
    mount_pending(&server, 100).await;

    let (client, delay) = client_for(&server, 5);
    let err = client.poller().run(&job_url(&server), false).await.unwrap_err();

    match &err {
        ExcelError::PollTimeout { attempts, .. } => assert_eq!(*attempts, 5),
        other => panic!("Expected PollTimeout, got {other:?}"),
    }
    assert!(err.to_string().contains("may still be processing"));
    assert_eq!(hits(&server, "/jobs/42").await, 5);
    assert_eq!(delay.calls(), 4);
}

#[tokio::test]
async fn test_zero_attempts_never_polls() {
    let server = MockServer::start().await;
    mount_pending(&server, 100).await;

    let (client, delay) = client_for(&server, 0);
    let err = client.poller().run(&job_url(&server), false).await.unwrap_err();

    assert!(matches!(err, ExcelError::PollTimeout { attempts: 0, .. }));
    assert_eq!(hits(&server, "/jobs/42").await, 0);
    assert_eq!(delay.calls(), 0);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    mount_pending(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 50);
    let err = client.poller().run(&job_url(&server), false).await.unwrap_err();

    assert!(matches!(err, ExcelError::JobNotFound { .. }));
    assert!(err.to_string().contains("not found or expired"));
    assert_eq!(hits(&server, "/jobs/42").await, 2);
}

#[tokio::test]
async fn test_unexpected_status_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "worker crashed" })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 50);
    let err = client.poller().run(&job_url(&server), false).await.unwrap_err();

    match err {
        ExcelError::Poll { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "worker crashed");
        }
        other => panic!("Expected Poll error, got {other:?}"),
    }
    assert_eq!(hits(&server, "/jobs/42").await, 1);
}

#[tokio::test]
async fn test_unexpected_status_without_detail() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({})))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 50);
    let err = client.poller().run(&job_url(&server), false).await.unwrap_err();
    assert_eq!(err.to_string(), "Polling failed with status 503");
}

#[tokio::test]
async fn test_network_errors_are_retried_until_ceiling() {
    // Nothing listens on port 1, so every attempt is a connect failure.
    let server = MockServer::start().await;
    let (client, delay) = client_for(&server, 3);

    let err = client
        .poller()
        .run("http://127.0.0.1:1/jobs/42", false)
        .await
        .unwrap_err();

    match &err {
        ExcelError::PollTimeout { attempts, detail } => {
            assert_eq!(*attempts, 3);
            assert!(detail.starts_with("Last network error"));
        }
        other => panic!("Expected PollTimeout, got {other:?}"),
    }
    assert_eq!(delay.calls(), 2);
}

#[tokio::test]
async fn test_network_error_then_done() {
    let server = MockServer::start().await;

    // The first answer arrives after the client has given up on it.
    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .respond_with(ResponseTemplate::new(202).set_delay(Duration::from_secs(5)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rowsExtracted": 2 })))
        .mount(&server)
        .await;

    let delay = Arc::new(CountingDelay::default());
    let config = ClientConfig::default()
        .with_base_url(server.uri())
        .with_initial_timeout(Duration::from_millis(200))
        .with_max_poll_attempts(2);
    let client = ExcelClient::new(config).unwrap().with_delay(delay.clone());

    let payload = client.poller().run(&job_url(&server), true).await.unwrap();

    assert_eq!(payload, RawPayload::Json(json!({ "rowsExtracted": 2 })));
    assert_eq!(hits(&server, "/jobs/42").await, 2);
    assert_eq!(delay.calls(), 1);
}
