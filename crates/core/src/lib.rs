//! # excelrelay-core
//!
//! Core types and utilities for excelrelay.
//!
//! This crate provides:
//! - The error taxonomy shared by every excelrelay crate
//! - The request envelope sent to the document-processing API
//! - Raw and decoded payload types
//! - The response decoder and post-decode validation
//! - The parameter map operations read their options from

/// Base64 helpers for document content.
pub mod codec;
/// Response normalization and validation.
pub mod decode;
/// Request envelope construction.
pub mod envelope;
/// Error types and result aliases.
pub mod error;
/// Operation parameter map.
pub mod params;
/// Raw and decoded payload types.
pub mod payload;

pub use decode::{
    Expectation, ResponseDecoder, Signature, Strategy, DEFAULT_CONTENT_KEYS, MIN_DOCUMENT_LEN,
    SHORT_CONTENT_THRESHOLD,
};
pub use envelope::{DocumentRef, RequestEnvelope};
pub use error::{ExcelError, ExcelResult};
pub use params::{opt_string_or_number, string_or_number, Params};
pub use payload::{DecodedDocument, FileFormat, RawPayload};
