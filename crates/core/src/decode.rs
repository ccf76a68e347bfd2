//! Response normalization and validation.
//!
//! The document API does not use one envelope shape across operations. A
//! finished job may come back as raw bytes, as a base64 string, or as a JSON
//! object whose base64 payload sits under `document`, under one of several
//! content keys inside `document`, or under one of those keys at the top
//! level. Each shape is handled by one [`Strategy`]; the strategies are tried
//! in [`Strategy::ORDER`] and the first one that recognises the shape decides
//! the outcome.
//!
//! The content-key order is empirical. Operations whose envelope is known to
//! differ can supply their own list with [`ResponseDecoder::with_content_keys`].

use serde_json::{Map, Value};
use tracing::debug;

use crate::codec;
use crate::error::{ExcelError, ExcelResult};
use crate::payload::{json_type, RawPayload};

/// Strings shorter than this are treated as inline error messages.
pub const SHORT_CONTENT_THRESHOLD: usize = 100;

/// Smallest document the validator accepts.
pub const MIN_DOCUMENT_LEN: usize = 1000;

/// Keys searched for base64 content, in priority order.
pub const DEFAULT_CONTENT_KEYS: &[&str] = &["docData", "content", "docContent", "data", "file"];

/// One way of extracting document bytes from a response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Body is already a byte buffer.
    Buffer,
    /// Body is a string too short to be a document: an error message.
    ShortString,
    /// Body is a long string: base64 document content.
    LongString,
    /// Object whose `document` field is a base64 string.
    DocumentString,
    /// Object whose `document` field is an object holding a content key.
    DocumentObject,
    /// Object without `document`; content key searched at the top level.
    TopLevelKeys,
}

impl Strategy {
    /// Order in which strategies are tried.
    pub const ORDER: [Strategy; 6] = [
        Strategy::Buffer,
        Strategy::ShortString,
        Strategy::LongString,
        Strategy::DocumentString,
        Strategy::DocumentObject,
        Strategy::TopLevelKeys,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::ShortString => "short-string",
            Self::LongString => "long-string",
            Self::DocumentString => "document-string",
            Self::DocumentObject => "document-object",
            Self::TopLevelKeys => "top-level-keys",
        }
    }

    /// Apply this strategy to `raw`.
    ///
    /// Returns `None` when the payload does not have the shape this strategy
    /// handles, so the next strategy can be tried.
    pub fn apply<K: AsRef<str>>(self, raw: &RawPayload, keys: &[K]) -> Option<ExcelResult<Vec<u8>>> {
        match self {
            Self::Buffer => match raw {
                RawPayload::Bytes(bytes) => Some(Ok(bytes.clone())),
                _ => None,
            },
            Self::ShortString => {
                let text = raw.as_str()?;
                if text.chars().count() >= SHORT_CONTENT_THRESHOLD {
                    return None;
                }
                Some(Err(ExcelError::decode(format!(
                    "API returned error message: {text}"
                ))))
            }
            Self::LongString => {
                let text = raw.as_str()?;
                if text.chars().count() < SHORT_CONTENT_THRESHOLD {
                    return None;
                }
                Some(codec::decode(text).map_err(|e| {
                    ExcelError::decode(format!(
                        "API returned unexpected string response ({e}): {}",
                        codec::preview(text, SHORT_CONTENT_THRESHOLD)
                    ))
                }))
            }
            Self::DocumentString => {
                let text = document_field(raw.as_object()?)?.as_str()?;
                Some(decode_field("document", text))
            }
            Self::DocumentObject => match document_field(raw.as_object()?)? {
                Value::String(_) => None,
                Value::Object(doc) => Some(match find_content(doc, keys) {
                    Some((key, text)) => decode_field(key, text),
                    None => Err(ExcelError::decode(format!(
                        "Document object has unexpected structure. Available keys: {}",
                        join_keys(doc)
                    ))),
                }),
                other => Some(Err(ExcelError::decode(format!(
                    "Document field is neither string nor object: {}",
                    json_type(other)
                )))),
            },
            Self::TopLevelKeys => {
                let map = raw.as_object()?;
                if document_field(map).is_some() {
                    return None;
                }
                Some(match find_content(map, keys) {
                    Some((key, text)) => decode_field(key, text),
                    None => Err(ExcelError::decode(format!(
                        "API returned unexpected JSON structure. Available keys: {}",
                        join_keys(map)
                    ))),
                })
            }
        }
    }
}

/// The `document` field, treating null, false, zero and empty strings as absent.
fn document_field(map: &Map<String, Value>) -> Option<&Value> {
    match map.get("document")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other),
    }
}

/// First key in `keys` whose value is a non-empty string.
fn find_content<'a, K: AsRef<str>>(
    map: &'a Map<String, Value>,
    keys: &'a [K],
) -> Option<(&'a str, &'a str)> {
    keys.iter().find_map(|key| {
        let key = key.as_ref();
        map.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(|s| (key, s))
    })
}

fn join_keys(map: &Map<String, Value>) -> String {
    map.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn decode_field(key: &str, text: &str) -> ExcelResult<Vec<u8>> {
    codec::decode(text).map_err(|e| {
        ExcelError::decode(format!(
            "Field '{key}' is not valid base64 ({e}): {}",
            codec::preview(text, SHORT_CONTENT_THRESHOLD)
        ))
    })
}

/// Normalizes success payloads into document bytes.
#[derive(Debug, Clone)]
pub struct ResponseDecoder {
    content_keys: Vec<String>,
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::with_content_keys(DEFAULT_CONTENT_KEYS.iter().copied())
    }
}

impl ResponseDecoder {
    /// Decoder using [`DEFAULT_CONTENT_KEYS`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder searching `keys`, in order, for base64 content.
    pub fn with_content_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            content_keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a content key after the existing ones.
    #[must_use]
    pub fn with_extra_key(mut self, key: impl Into<String>) -> Self {
        self.content_keys.push(key.into());
        self
    }

    pub fn content_keys(&self) -> &[String] {
        &self.content_keys
    }

    /// Reduce `raw` to bytes without validating them.
    pub fn normalize(&self, raw: &RawPayload) -> ExcelResult<Vec<u8>> {
        for strategy in Strategy::ORDER {
            if let Some(result) = strategy.apply(raw, self.content_keys.as_slice()) {
                debug!(strategy = strategy.name(), ok = result.is_ok(), "normalized response");
                return result;
            }
        }
        Err(ExcelError::decode(format!(
            "Unexpected response format: {}",
            raw.shape()
        )))
    }

    /// Reduce `raw` to text for operations whose result is textual.
    ///
    /// A bare string is never read as an error message here: it is
    /// base64-decoded when it can be and returned unchanged otherwise.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn normalize_text(&self, raw: &RawPayload) -> ExcelResult<String> {
        let bytes = match raw {
            RawPayload::Bytes(bytes) => bytes.clone(),
            _ => match raw.as_str() {
                Some(text) => match codec::decode(text) {
                    Ok(bytes) => bytes,
                    Err(_) => return Ok(text.to_string()),
                },
                None => [
                    Strategy::DocumentString,
                    Strategy::DocumentObject,
                    Strategy::TopLevelKeys,
                ]
                .into_iter()
                .find_map(|s| s.apply(raw, self.content_keys.as_slice()))
                .unwrap_or_else(|| {
                    Err(ExcelError::decode(format!(
                        "Unexpected response format: {}",
                        raw.shape()
                    )))
                })?,
            },
        };
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Reduce `raw` to bytes and check them against `expectation`.
    pub fn decode_document(
        &self,
        raw: &RawPayload,
        expectation: &Expectation,
    ) -> ExcelResult<(Vec<u8>, Option<Signature>)> {
        let bytes = self.normalize(raw)?;
        let signature = expectation.check(&bytes)?;
        Ok((bytes, signature))
    }
}

/// Leading bytes identifying a spreadsheet container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// ZIP local file header, used by OOXML (`.xlsx`, `.xlsb`).
    Zip,
    /// OLE compound file, used by legacy `.xls`.
    Ole,
}

impl Signature {
    pub const fn magic(self) -> [u8; 4] {
        match self {
            Self::Zip => [0x50, 0x4B, 0x03, 0x04],
            Self::Ole => [0xD0, 0xCF, 0x11, 0xE0],
        }
    }

    pub fn matches(self, bytes: &[u8]) -> bool {
        bytes.starts_with(&self.magic())
    }

    /// Signature of `bytes`, if it has a known one.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        [Self::Zip, Self::Ole].into_iter().find(|s| s.matches(bytes))
    }

    fn label(self) -> &'static str {
        match self {
            Self::Zip => "XLSX",
            Self::Ole => "XLS",
        }
    }
}

/// Structural requirements for decoded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectation {
    pub min_len: usize,
    /// Accepted leading signatures; empty means no magic-byte check.
    pub signatures: &'static [Signature],
}

impl Expectation {
    /// Modern spreadsheet output.
    pub const fn xlsx() -> Self {
        Self {
            min_len: MIN_DOCUMENT_LEN,
            signatures: &[Signature::Zip],
        }
    }

    /// Spreadsheet output that may legitimately be the legacy format.
    pub const fn xlsx_or_xls() -> Self {
        Self {
            min_len: MIN_DOCUMENT_LEN,
            signatures: &[Signature::Zip, Signature::Ole],
        }
    }

    /// Non-spreadsheet binary output with only a size floor.
    pub const fn any(min_len: usize) -> Self {
        Self {
            min_len,
            signatures: &[],
        }
    }

    /// No validation at all.
    pub const fn none() -> Self {
        Self::any(0)
    }

    /// Validate `bytes`, returning the matched signature.
    pub fn check(&self, bytes: &[u8]) -> ExcelResult<Option<Signature>> {
        if bytes.len() < self.min_len {
            return Err(ExcelError::decode(format!(
                "Invalid response from API. The file appears to be too small or corrupted ({} bytes, expected at least {}).",
                bytes.len(),
                self.min_len
            )));
        }
        if self.signatures.is_empty() {
            return Ok(Signature::detect(bytes));
        }
        match self.signatures.iter().find(|s| s.matches(bytes)) {
            Some(signature) => Ok(Some(*signature)),
            None => {
                let expected = self
                    .signatures
                    .iter()
                    .map(|s| s.label())
                    .collect::<Vec<_>>()
                    .join(" or ");
                Err(ExcelError::decode(format!(
                    "Invalid Excel file format. Expected {expected} file but got unexpected data. Magic bytes: {}",
                    magic_hex(bytes)
                )))
            }
        }
    }
}

fn magic_hex(bytes: &[u8]) -> String {
    bytes.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn xlsx_bytes(len: usize) -> Vec<u8> {
        let mut bytes = Signature::Zip.magic().to_vec();
        bytes.resize(len, 0x2A);
        bytes
    }

    fn long_base64(bytes: &[u8]) -> String {
        let encoded = codec::encode(bytes);
        assert!(encoded.len() >= SHORT_CONTENT_THRESHOLD);
        encoded
    }

    // ========================================================================
    // Strategy tests
    // ========================================================================

    #[test]
    fn test_buffer_returned_unchanged() {
        let bytes = xlsx_bytes(1200);
        let raw = RawPayload::Bytes(bytes.clone());
        assert_eq!(ResponseDecoder::new().normalize(&raw).unwrap(), bytes);
    }

    #[test]
    fn test_short_string_is_error_message() {
        // Valid base64, but short enough to be treated as an error message.
        let raw = RawPayload::Text("UEsDBA==".to_string());
        let err = ResponseDecoder::new().normalize(&raw).unwrap_err();
        assert!(matches!(err, ExcelError::Decode(_)));
        assert_eq!(err.to_string(), "API returned error message: UEsDBA==");
    }

    #[test]
    fn test_short_json_string_is_error_message() {
        let raw = RawPayload::Json(json!("Quota exceeded"));
        assert_eq!(
            Strategy::ShortString.apply(&raw, DEFAULT_CONTENT_KEYS).map(|r| r.is_err()),
            Some(true)
        );
    }

    #[test]
    fn test_long_string_is_base64() {
        let bytes = xlsx_bytes(300);
        let raw = RawPayload::Text(long_base64(&bytes));
        assert_eq!(ResponseDecoder::new().normalize(&raw).unwrap(), bytes);
    }

    #[test]
    fn test_long_invalid_string_reports_preview() {
        let raw = RawPayload::Text("%".repeat(150));
        let msg = ResponseDecoder::new().normalize(&raw).unwrap_err().to_string();
        assert!(msg.starts_with("API returned unexpected string response"));
        assert!(msg.ends_with("..."));
    }

    #[test]
    fn test_document_string() {
        let bytes = xlsx_bytes(64);
        let raw = RawPayload::Json(json!({ "document": codec::encode(&bytes) }));
        assert!(Strategy::DocumentObject.apply(&raw, DEFAULT_CONTENT_KEYS).is_none());
        assert_eq!(ResponseDecoder::new().normalize(&raw).unwrap(), bytes);
    }

    #[test]
    fn test_document_object_doc_data() {
        let bytes = xlsx_bytes(64);
        let raw = RawPayload::Json(json!({
            "document": { "name": "out.xlsx", "docData": codec::encode(&bytes) }
        }));
        assert_eq!(ResponseDecoder::new().normalize(&raw).unwrap(), bytes);
    }

    #[test]
    fn test_document_object_key_priority() {
        let raw = RawPayload::Json(json!({
            "document": {
                "data": codec::encode(b"from-data"),
                "content": codec::encode(b"from-content"),
                "docData": ""
            }
        }));
        // Empty docData is skipped; content outranks data.
        assert_eq!(ResponseDecoder::new().normalize(&raw).unwrap(), b"from-content");
    }

    #[test]
    fn test_document_object_without_content_lists_keys() {
        let raw = RawPayload::Json(json!({ "document": { "name": "x", "pages": 3 } }));
        let msg = ResponseDecoder::new().normalize(&raw).unwrap_err().to_string();
        assert!(msg.contains("Available keys"));
        assert!(msg.contains("name"));
        assert!(msg.contains("pages"));
    }

    #[test]
    fn test_document_of_wrong_type() {
        let raw = RawPayload::Json(json!({ "document": [1, 2] }));
        let msg = ResponseDecoder::new().normalize(&raw).unwrap_err().to_string();
        assert_eq!(msg, "Document field is neither string nor object: array");
    }

    #[test]
    fn test_empty_document_falls_through_to_top_level() {
        let raw = RawPayload::Json(json!({ "document": "", "file": codec::encode(b"top") }));
        assert!(Strategy::DocumentString.apply(&raw, DEFAULT_CONTENT_KEYS).is_none());
        assert_eq!(ResponseDecoder::new().normalize(&raw).unwrap(), b"top");
    }

    #[test]
    fn test_top_level_missing_keys_enumerates_keys() {
        let raw = RawPayload::Json(json!({ "status": "done", "jobId": "42" }));
        let msg = ResponseDecoder::new().normalize(&raw).unwrap_err().to_string();
        assert!(msg.contains("jobId"));
        assert!(msg.contains("status"));
    }

    #[test]
    fn test_custom_content_keys() {
        let raw = RawPayload::Json(json!({ "fileContent": codec::encode(b"csv") }));
        assert!(ResponseDecoder::new().normalize(&raw).is_err());
        let decoder = ResponseDecoder::new().with_extra_key("fileContent");
        assert_eq!(decoder.normalize(&raw).unwrap(), b"csv");
    }

    #[test]
    fn test_unsupported_shape() {
        let raw = RawPayload::Json(json!([1, 2, 3]));
        let msg = ResponseDecoder::new().normalize(&raw).unwrap_err().to_string();
        assert_eq!(msg, "Unexpected response format: array");
    }

    #[test]
    fn test_exactly_one_strategy_applies() {
        let shapes = [
            RawPayload::Bytes(vec![1, 2]),
            RawPayload::Text("short".into()),
            RawPayload::Text("A".repeat(200)),
            RawPayload::Json(json!({ "document": "QUJD" })),
            RawPayload::Json(json!({ "document": { "x": 1 } })),
            RawPayload::Json(json!({ "data": "QUJD" })),
        ];
        for raw in &shapes {
            let applicable = Strategy::ORDER
                .iter()
                .filter(|s| s.apply(raw, DEFAULT_CONTENT_KEYS).is_some())
                .count();
            assert_eq!(applicable, 1, "shape {raw:?}");
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = RawPayload::Json(json!({ "document": { "docData": codec::encode(&xlsx_bytes(1500)) } }));
        let decoder = ResponseDecoder::new();
        assert_eq!(decoder.normalize(&raw).unwrap(), decoder.normalize(&raw).unwrap());
    }

    #[test]
    fn test_normalize_text_accepts_short_content() {
        let decoder = ResponseDecoder::new();
        let raw = RawPayload::Json(json!({ "document": codec::encode(b"a;b\n1;2") }));
        assert_eq!(decoder.normalize_text(&raw).unwrap(), "a;b\n1;2");

        let raw = RawPayload::Text(codec::encode(br#"{"k":1}"#));
        assert_eq!(decoder.normalize_text(&raw).unwrap(), r#"{"k":1}"#);
    }

    #[test]
    fn test_normalize_text_keeps_undecodable_strings() {
        let raw = RawPayload::Text("not base64 at all!".into());
        assert_eq!(
            ResponseDecoder::new().normalize_text(&raw).unwrap(),
            "not base64 at all!"
        );
    }

    #[test]
    fn test_normalize_text_reports_missing_keys() {
        let raw = RawPayload::Json(json!({ "Success": true }));
        let msg = ResponseDecoder::new().normalize_text(&raw).unwrap_err().to_string();
        assert!(msg.contains("Success"));
    }

    // ========================================================================
    // Validation tests
    // ========================================================================

    #[test]
    fn test_xlsx_expectation_accepts_zip() {
        let signature = Expectation::xlsx().check(&xlsx_bytes(1000)).unwrap();
        assert_eq!(signature, Some(Signature::Zip));
    }

    #[test]
    fn test_size_floor() {
        let err = Expectation::xlsx().check(&xlsx_bytes(999)).unwrap_err();
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn test_magic_bytes_rejected_regardless_of_size() {
        let mut bytes = vec![0x25, 0x50, 0x44, 0x46];
        bytes.resize(50_000, 0);
        let msg = Expectation::xlsx().check(&bytes).unwrap_err().to_string();
        assert!(msg.contains("Magic bytes: 25504446"));
    }

    #[test]
    fn test_legacy_signature_only_where_allowed() {
        let mut ole = Signature::Ole.magic().to_vec();
        ole.resize(2048, 0);
        assert!(Expectation::xlsx().check(&ole).is_err());
        assert_eq!(
            Expectation::xlsx_or_xls().check(&ole).unwrap(),
            Some(Signature::Ole)
        );
    }

    #[test]
    fn test_any_expectation_skips_magic() {
        let bytes = b"%PDF-1.7 ".repeat(20);
        assert_eq!(Expectation::any(100).check(&bytes).unwrap(), None);
        assert!(Expectation::any(1000).check(&bytes).is_err());
    }

    #[test]
    fn test_decode_document_validates() {
        let raw = RawPayload::Json(json!({ "document": { "docData": codec::encode(b"tiny") } }));
        let err = ResponseDecoder::new()
            .decode_document(&raw, &Expectation::xlsx())
            .unwrap_err();
        assert!(matches!(err, ExcelError::Decode(_)));
    }
}
