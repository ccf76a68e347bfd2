//! Shared helpers for operation integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use calamine::{open_workbook_from_rs, Reader, Xlsx};
use excelrelay_actions::Runner;
use excelrelay_core::codec;
use excelrelay_http::{ClientConfig, ExcelClient, PollDelay};
use rust_xlsxwriter::Workbook;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub struct NoDelay;

#[async_trait]
impl PollDelay for NoDelay {
    async fn wait(&self, _attempt: u32) {}
}

/// Runner pointed at `server` that polls without sleeping.
pub fn runner_for(server: &MockServer) -> Runner {
    let config = ClientConfig::default()
        .with_base_url(server.uri())
        .with_api_key("Basic dGVzdDp0ZXN0")
        .with_max_poll_attempts(5);
    let client = ExcelClient::new(config).unwrap().with_delay(Arc::new(NoDelay));
    Runner::new(client).unwrap()
}

/// A small real workbook with one named sheet.
pub fn sample_workbook(sheet: &str) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).unwrap();
    worksheet.write_string(0, 0, "Region").unwrap();
    worksheet.write_string(0, 1, "Revenue").unwrap();
    worksheet.write_string(1, 0, "North").unwrap();
    worksheet.write_number(1, 1, 1250.5).unwrap();
    workbook.save_to_buffer().unwrap()
}

/// Sheet names of an xlsx held in memory.
pub fn sheet_names(bytes: &[u8]) -> Vec<String> {
    let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec())).unwrap();
    workbook.sheet_names()
}

/// The JSON result body the API sends for a finished spreadsheet job.
pub fn document_body(bytes: &[u8]) -> Value {
    json!({ "document": { "docData": codec::encode(bytes) } })
}

/// Mount a queued job at `endpoint`: the submit answers 202 with a relative
/// `Location`, the first poll is still pending, the second returns `result`.
pub async fn mount_async_job(server: &MockServer, endpoint: &str, result: Value) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(202).insert_header("Location", "/jobs/42"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(result))
        .mount(server)
        .await;
}

/// Mount an endpoint that completes synchronously with `result`.
pub async fn mount_immediate(server: &MockServer, endpoint: &str, result: Value) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(result))
        .mount(server)
        .await;
}

/// Requests the server saw for `endpoint`.
pub async fn requests_to(server: &MockServer, endpoint: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == endpoint)
        .collect()
}

/// JSON body of the first request to `endpoint`.
pub async fn submitted_body(server: &MockServer, endpoint: &str) -> Value {
    let requests = requests_to(server, endpoint).await;
    serde_json::from_slice(&requests[0].body).unwrap()
}
