//! Work items flowing in and out of operations.

use excelrelay_core::{DecodedDocument, Params};
use indexmap::IndexMap;
use serde_json::Value;

/// A binary attachment supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub data: Vec<u8>,
    pub file_name: Option<String>,
}

impl Attachment {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            file_name: None,
        }
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// One unit of input: the host's JSON for the item, the operation
/// parameters, and any named binary attachments.
#[derive(Debug, Clone, Default)]
pub struct WorkItem {
    pub json: Value,
    pub params: Params,
    pub binary: IndexMap<String, Attachment>,
}

impl WorkItem {
    pub fn new(params: Params) -> Self {
        Self {
            json: Value::Object(serde_json::Map::new()),
            params,
            binary: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_attachment(mut self, key: impl Into<String>, attachment: Attachment) -> Self {
        self.binary.insert(key.into(), attachment);
        self
    }

    #[must_use]
    pub fn with_json(mut self, json: Value) -> Self {
        self.json = json;
        self
    }
}

/// Result of one operation on one item.
#[derive(Debug, Clone, Default)]
pub struct ItemOutput {
    pub json: Value,
    pub binary: IndexMap<String, DecodedDocument>,
    /// Set instead of a result when the batch continues past a failure.
    pub error: Option<String>,
}

impl ItemOutput {
    pub fn from_json(json: Value) -> Self {
        Self {
            json,
            binary: IndexMap::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn with_document(mut self, key: impl Into<String>, document: DecodedDocument) -> Self {
        self.binary.insert(key.into(), document);
        self
    }

    /// Output recording a failed item, echoing its input JSON.
    pub fn failed(input: &WorkItem, message: impl Into<String>) -> Self {
        Self {
            json: input.json.clone(),
            binary: IndexMap::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// JSON view of the output with attachment metadata instead of bytes.
    pub fn to_summary(&self) -> Value {
        let mut summary = serde_json::Map::new();
        summary.insert("json".into(), self.json.clone());
        if !self.binary.is_empty() {
            let binary = self
                .binary
                .iter()
                .map(|(key, doc)| {
                    (
                        key.clone(),
                        serde_json::json!({
                            "fileName": doc.file_name,
                            "fileExtension": doc.extension.trim_start_matches('.'),
                            "mimeType": doc.mime_type,
                            "fileSize": doc.len(),
                        }),
                    )
                })
                .collect();
            summary.insert("binary".into(), Value::Object(binary));
        }
        if let Some(error) = &self.error {
            summary.insert("error".into(), Value::String(error.clone()));
        }
        Value::Object(summary)
    }
}
