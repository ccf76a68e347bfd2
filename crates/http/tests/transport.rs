//! Submit classification tests against a mock API.

mod common;
use common::*;

use excelrelay_core::{ExcelError, RawPayload};
use excelrelay_http::{ClientConfig, ExcelClient, HttpMethod, SubmitOptions, Submission};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECURE: &str = "/office/ApiV2Excel/ExcelSecure";

#[tokio::test]
async fn test_immediate_binary_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/ConvertToPdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 5);
    let result = client
        .submit("/api/v2/ConvertToPdf", &json!({ "docContent": "QUJD" }))
        .await
        .unwrap();

    assert_eq!(
        result,
        Submission::Immediate(RawPayload::Bytes(b"%PDF-1.7".to_vec()))
    );
}

#[tokio::test]
async fn test_immediate_json_endpoint_is_parsed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SECURE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "document": { "docData": "QUJD" } })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 5);
    match client.submit(SECURE, &json!({ "docContent": "QUJD" })).await.unwrap() {
        Submission::Immediate(RawPayload::Json(body)) => {
            assert_eq!(body["document"]["docData"], "QUJD");
        }
        other => panic!("Expected JSON payload, got {other:?}"),
    }
}

#[tokio::test]
async fn test_body_and_headers_are_sent() {
    let server = MockServer::start().await;
    let envelope = json!({ "docContent": "QUJD", "IsAsync": true });

    Mock::given(method("POST"))
        .and(path(SECURE))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "Basic secret"))
        .and(body_json(&envelope))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let delay = std::sync::Arc::new(CountingDelay::default());
    let config = excelrelay_http::ClientConfig::default()
        .with_base_url(server.uri())
        .with_api_key("Basic secret");
    let client = excelrelay_http::ExcelClient::new(config).unwrap().with_delay(delay);

    client.submit(SECURE, &envelope).await.unwrap();
}

#[tokio::test]
async fn test_empty_body_is_not_sent() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/jobs/reset"))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 5);
    let options = SubmitOptions {
        method: HttpMethod::Put,
        query: vec![("force".into(), "true".into())],
        timeout: None,
    };
    client
        .submit_with("/jobs/reset", &json!({}), &options)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_accepted_returns_location() {
    let server = MockServer::start().await;
    let location = format!("{}/jobs/42", server.uri());

    Mock::given(method("POST"))
        .and(path(SECURE))
        .respond_with(ResponseTemplate::new(202).insert_header("Location", location.as_str()))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 5);
    let result = client.submit(SECURE, &json!({ "docContent": "QUJD" })).await.unwrap();
    assert_eq!(result, Submission::Accepted(location));
}

#[tokio::test]
async fn test_accepted_relative_location_is_resolved() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SECURE))
        .respond_with(ResponseTemplate::new(202).insert_header("Location", "/jobs/7"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 5);
    let result = client.submit(SECURE, &json!({ "docContent": "QUJD" })).await.unwrap();
    assert_eq!(result, Submission::Accepted(format!("{}/jobs/7", server.uri())));
}

#[tokio::test]
async fn test_accepted_without_location_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SECURE))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 5);
    let err = client
        .submit(SECURE, &json!({ "docContent": "QUJD" }))
        .await
        .unwrap_err();

    assert!(matches!(err, ExcelError::Transport { .. }));
    assert_eq!(err.to_string(), "No polling URL found in response");
}

#[tokio::test]
async fn test_error_status_uses_message_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SECURE))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Document is password protected" })),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 5);
    let err = client
        .submit(SECURE, &json!({ "docContent": "QUJD" }))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Document is password protected");
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_error_status_with_plain_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SECURE))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 5);
    let err = client
        .submit(SECURE, &json!({ "docContent": "QUJD" }))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "API Error: 401: Unauthorized");
}

#[tokio::test]
async fn test_error_status_with_unreadable_body() {
    // Announces a longer body than it sends, then hangs up.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request_complete(&request) {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 64\r\n\r\n{\"mess")
            .await
            .unwrap();
        stream.shutdown().await.unwrap();
    });

    let config = ClientConfig::default().with_base_url(format!("http://{addr}"));
    let client = ExcelClient::new(config).unwrap();
    let err = client
        .submit(SECURE, &json!({ "docContent": "QUJD" }))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "API Error: 500");
    assert_eq!(err.status(), Some(500));
}

/// Whether `request` holds the full head and the body its content-length announces.
fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(head_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let length = text[..head_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    request.len() >= head_end + 4 + length
}

#[tokio::test]
async fn test_call_polls_accepted_job() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SECURE))
        .respond_with(
            ResponseTemplate::new(202).insert_header("Location", format!("{}/jobs/42", server.uri()).as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "document": "QUJD" })))
        .mount(&server)
        .await;

    let (client, delay) = client_for(&server, 5);
    let payload = client.call(SECURE, &json!({ "docContent": "QUJD" })).await.unwrap();

    assert_eq!(payload, RawPayload::Json(json!({ "document": "QUJD" })));
    assert_eq!(hits(&server, "/jobs/42").await, 1);
    assert_eq!(delay.calls(), 0);
}
