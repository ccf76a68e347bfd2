//! Shared helpers for transport integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use excelrelay_http::{ClientConfig, ExcelClient, PollDelay};
use wiremock::MockServer;

/// Delay that records how often it was awaited instead of sleeping.
#[derive(Default)]
pub struct CountingDelay {
    calls: AtomicU32,
}

impl CountingDelay {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PollDelay for CountingDelay {
    async fn wait(&self, _attempt: u32) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Client pointed at `server` with a counting delay and `max_attempts` polls.
pub fn client_for(server: &MockServer, max_attempts: u32) -> (ExcelClient, Arc<CountingDelay>) {
    let delay = Arc::new(CountingDelay::default());
    let config = ClientConfig::default()
        .with_base_url(server.uri())
        .with_max_poll_attempts(max_attempts);
    let client = ExcelClient::new(config)
        .unwrap()
        .with_delay(delay.clone());
    (client, delay)
}

/// Number of requests the server saw for `path`.
pub async fn hits(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == path)
        .count()
}
