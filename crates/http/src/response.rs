//! Success-body classification and error-message derivation.

use excelrelay_core::RawPayload;
use serde_json::Value;
use tracing::debug;

/// Classify a 200 body by the kind of endpoint that produced it.
///
/// File endpoints always yield bytes. JSON endpoints yield parsed JSON, or the
/// body text when it does not parse, so the decoder's string handling applies.
pub fn classify_body(body: Vec<u8>, is_json: bool) -> RawPayload {
    if !is_json {
        return RawPayload::Bytes(body);
    }
    match serde_json::from_slice::<Value>(&body) {
        Ok(value) => RawPayload::Json(value),
        Err(_) => match String::from_utf8(body) {
            Ok(text) => RawPayload::Text(text),
            Err(e) => RawPayload::Bytes(e.into_bytes()),
        },
    }
}

/// Body text of a failed response; empty when the body cannot be read.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(status, error = %e, "failed to read error body");
            String::new()
        }
    }
}

/// Human-readable message for a failed response.
///
/// The body's `message`, `error` or `detail` field wins when present. A JSON
/// body without any of them yields `prefix` alone; a non-JSON body is appended
/// to `prefix` verbatim.
pub fn error_message(prefix: &str, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return prefix.to_string();
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => ["message", "error", "detail"]
            .iter()
            .find_map(|key| {
                value
                    .get(key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
            })
            .map_or_else(|| prefix.to_string(), str::to_string),
        Err(_) => format!("{prefix}: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_message_field() {
        let body = r#"{"error": "E42", "message": "Document is password protected"}"#;
        assert_eq!(error_message("API Error: 500", body), "Document is password protected");
    }

    #[test]
    fn test_error_message_falls_back_through_fields() {
        assert_eq!(error_message("p", r#"{"error": "bad input"}"#), "bad input");
        assert_eq!(error_message("p", r#"{"detail": "quota"}"#), "quota");
        assert_eq!(error_message("p", r#"{"message": "", "detail": "d"}"#), "d");
    }

    #[test]
    fn test_error_message_json_without_fields_uses_prefix() {
        assert_eq!(error_message("API Error: 400", r#"{"code": 7}"#), "API Error: 400");
    }

    #[test]
    fn test_error_message_plain_text_body() {
        assert_eq!(
            error_message("API Error: 502", "Bad Gateway"),
            "API Error: 502: Bad Gateway"
        );
        assert_eq!(error_message("API Error: 502", "  "), "API Error: 502");
    }

    #[test]
    fn test_classify_file_endpoint_keeps_bytes() {
        let payload = classify_body(br#"{"a":1}"#.to_vec(), false);
        assert_eq!(payload, RawPayload::Bytes(br#"{"a":1}"#.to_vec()));
    }

    #[test]
    fn test_classify_json_endpoint() {
        assert_eq!(
            classify_body(br#"{"a":1}"#.to_vec(), true),
            RawPayload::Json(json!({ "a": 1 }))
        );
        assert_eq!(
            classify_body(b"not json".to_vec(), true),
            RawPayload::Text("not json".to_string())
        );
    }
}
