//! Raw and decoded payload types.

use serde_json::Value;
use std::fmt;

/// A success body as the transport delivered it, before normalization.
///
/// Which variant the transport produces is decided by the endpoint path,
/// not by sniffing the body.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Binary body from a file-returning endpoint.
    Bytes(Vec<u8>),
    /// Body of a JSON endpoint that did not parse as JSON.
    Text(String),
    /// Parsed body of a JSON endpoint.
    Json(Value),
}

impl RawPayload {
    /// Shape name used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "string",
            Self::Json(value) => json_type(value),
        }
    }

    /// The string carried by the payload, whether raw text or a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The JSON object carried by the payload, if it is one.
    pub fn as_object(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            Self::Json(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Convert to structured data for extraction-style endpoints.
    ///
    /// Text and bytes are parsed as JSON when possible and otherwise kept as
    /// a JSON string.
    pub fn into_json(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            Self::Bytes(bytes) => serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned())),
        }
    }
}

/// JSON type name of a value.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Output file formats an operation can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Xlsx,
    Xls,
    Xlsb,
    Csv,
    Pdf,
    Json,
    Text,
}

impl FileFormat {
    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => ".xlsx",
            Self::Xls => ".xls",
            Self::Xlsb => ".xlsb",
            Self::Csv => ".csv",
            Self::Pdf => ".pdf",
            Self::Json => ".json",
            Self::Text => ".txt",
        }
    }

    /// MIME type for attachments of this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Xls => "application/vnd.ms-excel",
            Self::Xlsb => "application/vnd.ms-excel.sheet.binary.macroEnabled.12",
            Self::Csv => "text/csv",
            Self::Pdf => "application/pdf",
            Self::Json => "application/json",
            Self::Text => "text/plain",
        }
    }

    /// Parse an output-format option such as `XLSX` or `pdf`.
    pub fn from_option(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "XLSX" => Some(Self::Xlsx),
            "XLS" => Some(Self::Xls),
            "XLSB" => Some(Self::Xlsb),
            "CSV" => Some(Self::Csv),
            "PDF" => Some(Self::Pdf),
            "JSON" => Some(Self::Json),
            "TXT" | "TEXT" => Some(Self::Text),
            _ => None,
        }
    }

    /// Whether the format is a spreadsheet container subject to magic-byte checks.
    pub fn is_spreadsheet(self) -> bool {
        matches!(self, Self::Xlsx | Self::Xls | Self::Xlsb)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension()[1..].to_ascii_uppercase())
    }
}

/// A validated output document, owned by the caller once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDocument {
    pub data: Vec<u8>,
    pub file_name: String,
    pub extension: String,
    pub mime_type: String,
}

impl DecodedDocument {
    /// Wrap bytes with the naming and MIME type of `format`.
    pub fn new(data: Vec<u8>, file_name: impl Into<String>, format: FileFormat) -> Self {
        Self {
            data,
            file_name: file_name.into(),
            extension: format.extension().to_string(),
            mime_type: format.mime_type().to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_names() {
        assert_eq!(RawPayload::Bytes(vec![1]).shape(), "bytes");
        assert_eq!(RawPayload::Text("x".into()).shape(), "string");
        assert_eq!(RawPayload::Json(json!({"a": 1})).shape(), "object");
        assert_eq!(RawPayload::Json(json!([1])).shape(), "array");
    }

    #[test]
    fn test_into_json_parses_text() {
        let value = RawPayload::Text(r#"{"rows": [1, 2]}"#.into()).into_json();
        assert_eq!(value["rows"], json!([1, 2]));

        let value = RawPayload::Text("plain".into()).into_json();
        assert_eq!(value, json!("plain"));
    }

    #[test]
    fn test_file_format_from_option() {
        assert_eq!(FileFormat::from_option("xlsx"), Some(FileFormat::Xlsx));
        assert_eq!(FileFormat::from_option(" PDF "), Some(FileFormat::Pdf));
        assert_eq!(FileFormat::from_option("docx"), None);
        assert_eq!(FileFormat::Xlsb.to_string(), "XLSB");
    }

    #[test]
    fn test_decoded_document_metadata() {
        let doc = DecodedDocument::new(vec![0; 4], "out.xls", FileFormat::Xls);
        assert_eq!(doc.extension, ".xls");
        assert_eq!(doc.mime_type, "application/vnd.ms-excel");
        assert_eq!(doc.len(), 4);
    }
}
