//! Completion poller for accepted jobs.

use std::sync::Arc;
use std::time::Duration;

use excelrelay_core::error::STILL_PROCESSING;
use excelrelay_core::{ExcelError, ExcelResult, RawPayload};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::delay::PollDelay;
use crate::response::{classify_body, error_body, error_message};

/// Polls a job's `Location` URL until it finishes, disappears or the attempt
/// ceiling is reached.
///
/// An attempt is one pending (202) response or one transient network failure.
/// The delay runs between attempts only, never after the last one.
#[derive(Clone)]
pub struct Poller {
    http: Client,
    delay: Arc<dyn PollDelay>,
    max_attempts: u32,
    timeout: Duration,
}

enum PollStep {
    Done(Vec<u8>),
    Pending,
    NotFound,
    Failed { status: u16, body: String },
}

impl Poller {
    pub fn new(http: Client, delay: Arc<dyn PollDelay>, max_attempts: u32, timeout: Duration) -> Self {
        Self {
            http,
            delay,
            max_attempts,
            timeout,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Poll `location` to completion.
    ///
    /// `is_json` selects how the final 200 body is classified, exactly as for
    /// an immediate response.
    pub async fn run(&self, location: &str, is_json: bool) -> ExcelResult<RawPayload> {
        let mut attempt: u32 = 0;
        let mut detail = STILL_PROCESSING.to_string();

        loop {
            if attempt >= self.max_attempts {
                warn!(location, attempts = attempt, "poll ceiling reached");
                return Err(ExcelError::PollTimeout {
                    attempts: attempt,
                    detail,
                });
            }

            match self.poll_once(location).await {
                Ok(PollStep::Done(body)) => {
                    info!(location, attempts = attempt + 1, "job completed");
                    return Ok(classify_body(body, is_json));
                }
                Ok(PollStep::Pending) => {
                    attempt += 1;
                    detail = STILL_PROCESSING.to_string();
                    debug!(location, attempt, max = self.max_attempts, "job still processing");
                }
                Ok(PollStep::NotFound) => {
                    return Err(ExcelError::JobNotFound {
                        location: location.to_string(),
                    });
                }
                Ok(PollStep::Failed { status, body }) => {
                    return Err(ExcelError::Poll {
                        status,
                        message: error_message(&format!("Polling failed with status {status}"), &body),
                    });
                }
                Err(e) if is_transient(&e) => {
                    attempt += 1;
                    warn!(location, attempt, error = %e, "network error while polling, retrying");
                    detail = format!("Last network error: {e}");
                }
                Err(e) => {
                    return Err(ExcelError::transport(format!("Polling request failed: {e}")));
                }
            }

            if attempt < self.max_attempts {
                self.delay.wait(attempt).await;
            }
        }
    }

    async fn poll_once(&self, location: &str) -> Result<PollStep, reqwest::Error> {
        let response = self.http.get(location).timeout(self.timeout).send().await?;
        let status = response.status();
        let step = match status {
            StatusCode::OK => PollStep::Done(response.bytes().await?.to_vec()),
            StatusCode::ACCEPTED => PollStep::Pending,
            StatusCode::NOT_FOUND => PollStep::NotFound,
            _ => PollStep::Failed {
                status: status.as_u16(),
                body: error_body(response).await,
            },
        };
        Ok(step)
    }
}

/// Failures worth another attempt: connect and DNS errors, timeouts, and
/// I/O failures while sending or reading.
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request() || error.is_body()
}
