//! Transport client for the document-processing API.

use std::sync::Arc;
use std::time::Duration;

use excelrelay_core::{ExcelError, ExcelResult, RawPayload, RequestEnvelope};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::delay::{FixedDelay, PollDelay};
use crate::poller::Poller;
use crate::response::{classify_body, error_body, error_message};

/// Outcome of a successful submit.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The API finished synchronously.
    Immediate(RawPayload),
    /// The API queued the job; the value is the absolute poll URL.
    Accepted(String),
}

/// HTTP methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Delete,
    Patch,
}

/// Per-call overrides merged over the client configuration.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    pub method: HttpMethod,
    pub query: Vec<(String, String)>,
    /// Overrides the configured initial timeout.
    pub timeout: Option<Duration>,
}

/// Client for submit/poll calls against the document API.
#[derive(Clone)]
pub struct ExcelClient {
    http: Client,
    config: ClientConfig,
    delay: Arc<dyn PollDelay>,
}

impl ExcelClient {
    /// Build a client from `config`.
    ///
    /// The configured default headers are installed on the underlying client
    /// so they also reach poll requests.
    pub fn new(config: ClientConfig) -> ExcelResult<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ExcelError::Config(format!("invalid header name '{name}': {e}")))?;
            let mut value = HeaderValue::from_str(value)
                .map_err(|e| ExcelError::Config(format!("invalid value for header '{name}': {e}")))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let http = Client::builder()
            .timeout(config.initial_timeout)
            .default_headers(headers)
            // Disable system proxy lookup to avoid macOS system-configuration issues
            .no_proxy()
            .build()
            .map_err(|e| ExcelError::Config(format!("failed to build HTTP client: {e}")))?;

        let delay = Arc::new(FixedDelay(config.poll_interval));
        Ok(Self {
            http,
            config,
            delay,
        })
    }

    /// Replace the inter-attempt delay used by the poller.
    #[must_use]
    pub fn with_delay(mut self, delay: Arc<dyn PollDelay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn poller(&self) -> Poller {
        Poller::new(
            self.http.clone(),
            Arc::clone(&self.delay),
            self.config.max_poll_attempts,
            self.config.initial_timeout,
        )
    }

    /// POST `body` to `path` with default options.
    pub async fn submit(&self, path: &str, body: &Value) -> ExcelResult<Submission> {
        self.submit_with(path, body, &SubmitOptions::default()).await
    }

    /// Send `body` to `path` and classify the response.
    pub async fn submit_with(
        &self,
        path: &str,
        body: &Value,
        options: &SubmitOptions,
    ) -> ExcelResult<Submission> {
        let url = self.config.endpoint_url(path);

        let mut request = match options.method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
            HttpMethod::Put => self.http.put(&url),
            HttpMethod::Delete => self.http.delete(&url),
            HttpMethod::Patch => self.http.patch(&url),
        };

        request = request.header(CONTENT_TYPE, "application/json");
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if !is_empty_object(body) {
            request = request.json(body);
        }
        request = request.timeout(options.timeout.unwrap_or(self.config.initial_timeout));

        debug!(url = %url, method = ?options.method, "submitting request");
        let response = request
            .send()
            .await
            .map_err(|e| ExcelError::transport(format!("Request to {url} failed: {e}")))?;

        self.classify(path, response).await
    }

    async fn classify(&self, path: &str, response: Response) -> ExcelResult<Submission> {
        let status = response.status();
        match status {
            StatusCode::OK => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| ExcelError::transport(format!("Failed to read response body: {e}")))?;
                debug!(path, bytes = body.len(), "request completed synchronously");
                Ok(Submission::Immediate(classify_body(
                    body.to_vec(),
                    self.config.is_json_endpoint(path),
                )))
            }
            StatusCode::ACCEPTED => {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| {
                        ExcelError::transport_status(202, "No polling URL found in response")
                    })?;
                let location = self.resolve_location(location)?;
                info!(path, location = %location, "job accepted");
                Ok(Submission::Accepted(location))
            }
            _ => {
                let code = status.as_u16();
                let body = error_body(response).await;
                Err(ExcelError::transport_status(
                    code,
                    error_message(&format!("API Error: {code}"), &body),
                ))
            }
        }
    }

    /// Absolute form of a `Location` value; relative values resolve against the base URL.
    fn resolve_location(&self, location: &str) -> ExcelResult<String> {
        if let Ok(url) = url::Url::parse(location) {
            return Ok(url.to_string());
        }
        let base = url::Url::parse(&self.config.base_url)
            .map_err(|e| ExcelError::Config(format!("invalid base URL: {e}")))?;
        base.join(location)
            .map(|url| url.to_string())
            .map_err(|e| ExcelError::transport(format!("Invalid polling URL '{location}': {e}")))
    }

    /// Submit and, when the job is queued, poll it to completion.
    pub async fn call(&self, path: &str, body: &Value) -> ExcelResult<RawPayload> {
        match self.submit(path, body).await? {
            Submission::Immediate(payload) => Ok(payload),
            Submission::Accepted(location) => {
                self.poller()
                    .run(&location, self.config.is_json_endpoint(path))
                    .await
            }
        }
    }

    /// [`ExcelClient::call`] with a request envelope.
    pub async fn call_envelope(
        &self,
        path: &str,
        envelope: &RequestEnvelope,
    ) -> ExcelResult<RawPayload> {
        self.call(path, &envelope.to_json()).await
    }
}

fn is_empty_object(body: &Value) -> bool {
    matches!(body, Value::Object(map) if map.is_empty())
}
