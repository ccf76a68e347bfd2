//! # excelrelay-http
//!
//! Async transport for the document-processing API.
//!
//! A call is submitted once; the API either answers synchronously (200),
//! queues the job and hands back a `Location` to poll (202), or fails.
//! Queued jobs are polled with a fixed delay up to a bounded number of
//! attempts. Supports HTTP/2 via ALPN negotiation with fallback to HTTP/1.1.

pub mod client;
pub mod config;
pub mod delay;
pub mod poller;
pub mod response;

pub use client::{ExcelClient, HttpMethod, SubmitOptions, Submission};
pub use config::ClientConfig;
pub use delay::{FixedDelay, PollDelay};
pub use poller::Poller;
pub use response::{classify_body, error_message};
