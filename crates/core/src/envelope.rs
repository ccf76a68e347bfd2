//! Request envelope construction.
//!
//! Every operation sends one JSON body of the form
//! `{ document: { name }, docContent, <actionName>: { .. }, IsAsync }`.
//! Merge-style operations omit `document` and `docContent` and carry their
//! inputs inside the action object instead.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ExcelError, ExcelResult};

/// Advisory metadata about the input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub name: String,
}

impl DocumentRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// JSON body submitted to the processing API.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    document: Option<DocumentRef>,
    doc_content: Option<String>,
    extras: Map<String, Value>,
    action_name: String,
    action: Value,
    is_async: bool,
}

impl RequestEnvelope {
    /// Envelope for a single input document.
    ///
    /// `doc_content` is the base64 of the whole input file and must not be
    /// empty.
    pub fn for_document(
        name: impl Into<String>,
        doc_content: impl Into<String>,
        action_name: impl Into<String>,
        action: impl Serialize,
    ) -> ExcelResult<Self> {
        let doc_content = doc_content.into();
        if doc_content.trim().is_empty() {
            return Err(ExcelError::invalid("Excel content is required"));
        }
        Ok(Self {
            document: Some(DocumentRef::new(name)),
            doc_content: Some(doc_content),
            extras: Map::new(),
            action_name: action_name.into(),
            action: serde_json::to_value(action)?,
            is_async: true,
        })
    }

    /// Envelope without a primary document, for operations that embed
    /// their inputs in the action object.
    pub fn without_document(
        action_name: impl Into<String>,
        action: impl Serialize,
    ) -> ExcelResult<Self> {
        Ok(Self {
            document: None,
            doc_content: None,
            extras: Map::new(),
            action_name: action_name.into(),
            action: serde_json::to_value(action)?,
            is_async: true,
        })
    }

    /// Add a top-level field next to the action object.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    pub fn action(&self) -> &Value {
        &self.action
    }

    pub fn document(&self) -> Option<&DocumentRef> {
        self.document.as_ref()
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Render the wire body.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(document) = &self.document {
            body.insert("document".into(), serde_json::json!({ "name": document.name }));
        }
        if let Some(content) = &self.doc_content {
            body.insert("docContent".into(), Value::String(content.clone()));
        }
        for (key, value) in &self.extras {
            body.insert(key.clone(), value.clone());
        }
        body.insert(self.action_name.clone(), self.action.clone());
        body.insert("IsAsync".into(), Value::Bool(self.is_async));
        Value::Object(body)
    }
}

impl Serialize for RequestEnvelope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
