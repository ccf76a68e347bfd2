//! Operation implementations.
//!
//! Each operation reads its typed options from the item parameters,
//! validates them, builds the request envelope, and turns the API result
//! into an [`ItemOutput`].

mod csv;
mod find_replace;
mod header_footer;
mod merge;
mod rows;
mod security;
mod watermark;
mod worksheet;

use excelrelay_core::{
    DecodedDocument, ExcelError, ExcelResult, Expectation, FileFormat, RawPayload, RequestEnvelope,
    ResponseDecoder, Signature,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::item::{ItemOutput, WorkItem};
use crate::operation::Operation;
use crate::output::OutputOptions;
use crate::runner::Runner;
use crate::source::{self, SourceDocument, SourceOptions};

pub(crate) async fn dispatch(runner: &Runner, op: Operation, item: &WorkItem) -> ExcelResult<ItemOutput> {
    match op {
        Operation::AddTextHeaderFooter => header_footer::add_text(runner, item).await,
        Operation::AddImageHeaderFooter => header_footer::add_image(runner, item).await,
        Operation::RemoveHeaderFooter => header_footer::remove(runner, item).await,
        Operation::AddTextWatermark => watermark::add_text(runner, item).await,
        Operation::RemoveWatermark => watermark::remove(runner, item).await,
        Operation::FindReplaceText => find_replace::run(runner, item).await,
        Operation::UpdateRows => rows::update(runner, item).await,
        Operation::AddRows => rows::add(runner, item).await,
        Operation::ExtractRows => rows::extract(runner, item).await,
        Operation::DeleteRows => rows::delete(runner, item).await,
        Operation::DeleteWorksheet => worksheet::delete(runner, item).await,
        Operation::ExtractWorksheet => worksheet::extract(runner, item).await,
        Operation::Secure => security::secure(runner, item).await,
        Operation::Unlock => security::unlock(runner, item).await,
        Operation::MergeFiles => merge::files(runner, item).await,
        Operation::MergeRows => merge::rows(runner, item).await,
        Operation::ParseCsv => csv::parse(runner, item).await,
    }
}

/// Acquire the item's primary document.
pub(crate) async fn acquire(runner: &Runner, op: Operation, item: &WorkItem) -> ExcelResult<SourceDocument> {
    let options: SourceOptions = item.params.parse()?;
    source::acquire(
        runner.downloader(),
        item,
        &options,
        op.default_doc_name(),
        op.input_label(),
    )
    .await
}

/// Envelope carrying `source` and the operation's action object.
pub(crate) fn envelope(op: Operation, source: &SourceDocument, action: Value) -> ExcelResult<RequestEnvelope> {
    RequestEnvelope::for_document(&source.file_name, &source.content, op.action_key(), action)
}

/// Submit `envelope` to the operation endpoint and wait for the result.
pub(crate) async fn send(runner: &Runner, op: Operation, envelope: &RequestEnvelope) -> ExcelResult<RawPayload> {
    info!(operation = %op, endpoint = %op.endpoint(), "submitting operation");
    runner.client().call_envelope(&op.endpoint(), envelope).await
}

/// Acquire, submit and wait: the common path of single-document operations.
pub(crate) async fn submit_document(
    runner: &Runner,
    op: Operation,
    item: &WorkItem,
    action: Value,
) -> ExcelResult<(SourceDocument, RawPayload)> {
    let source = acquire(runner, op, item).await?;
    let raw = send(runner, op, &envelope(op, &source, action)?).await?;
    Ok((source, raw))
}

/// Decode a spreadsheet result and package it with its summary.
///
/// `details` holds the operation-specific summary fields; `message` receives
/// the format actually produced.
pub(crate) fn spreadsheet_output(
    op: Operation,
    item: &WorkItem,
    source: &SourceDocument,
    raw: &RawPayload,
    expectation: &Expectation,
    details: Value,
    message: impl FnOnce(FileFormat) -> String,
) -> ExcelResult<ItemOutput> {
    let outputs: OutputOptions = item.params.parse()?;
    let (bytes, signature) = ResponseDecoder::new().decode_document(raw, expectation)?;
    let format = match signature {
        Some(Signature::Ole) => FileFormat::Xls,
        _ => FileFormat::Xlsx,
    };

    let file_name = outputs.file_name(
        &op.default_output_name(),
        &source.file_name,
        op.default_stem(),
        format.extension(),
    );
    let document = DecodedDocument::new(bytes, file_name, format);
    let json = summary(&document, Some(&source.file_name), details, message(format));
    info!(operation = %op, file = %document.file_name, bytes = document.len(), "operation completed");

    Ok(ItemOutput::from_json(json).with_document(outputs.key(), document))
}

/// Standard summary: file facts, then `details`, then the message.
pub(crate) fn summary(
    document: &DecodedDocument,
    original_file_name: Option<&str>,
    details: Value,
    message: String,
) -> Value {
    let mut json = Map::new();
    json.insert("fileName".into(), Value::String(document.file_name.clone()));
    json.insert("fileSize".into(), Value::from(document.len()));
    json.insert("success".into(), Value::Bool(true));
    if let Some(original) = original_file_name {
        json.insert("originalFileName".into(), Value::String(original.to_string()));
    }
    if let Value::Object(details) = details {
        json.extend(details);
    }
    json.insert("message".into(), Value::String(message));
    Value::Object(json)
}

/// Worksheet targeting shared by several operations: all sheets, a list of
/// names, or a list of zero-based indexes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum SheetSelection {
    #[default]
    All,
    Name,
    Index,
}

impl SheetSelection {
    /// Resolve to the `(names, indexes)` strings sent to the API, requiring the
    /// list that matches the selection.
    pub(crate) fn resolve(self, names: &str, indexes: &str, verb: &str) -> ExcelResult<(String, String)> {
        match self {
            Self::All => Ok((String::new(), String::new())),
            Self::Name if names.trim().is_empty() => Err(ExcelError::invalid(format!(
                "Worksheet names are required when {verb} specific worksheets by name"
            ))),
            Self::Name => Ok((names.trim().to_string(), String::new())),
            Self::Index if indexes.trim().is_empty() => Err(ExcelError::invalid(format!(
                "Worksheet indexes are required when {verb} specific worksheets by index"
            ))),
            Self::Index => Ok((String::new(), indexes.trim().to_string())),
        }
    }

    /// Human-readable description for summaries.
    pub(crate) fn describe(self, names: &str, indexes: &str) -> String {
        match self {
            Self::All => "(all)".to_string(),
            Self::Name => format!("({})", names.trim()),
            Self::Index => format!("(indexes: {})", indexes.trim()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_field_order_and_details() {
        let doc = DecodedDocument::new(vec![1, 2, 3], "out.xlsx", FileFormat::Xlsx);
        let json = summary(&doc, Some("in.xlsx"), json!({ "rowsAdded": 2 }), "done".into());
        assert_eq!(json["fileName"], "out.xlsx");
        assert_eq!(json["fileSize"], 3);
        assert_eq!(json["success"], true);
        assert_eq!(json["originalFileName"], "in.xlsx");
        assert_eq!(json["rowsAdded"], 2);
        assert_eq!(json["message"], "done");
    }

    #[test]
    fn test_sheet_selection() {
        assert_eq!(
            SheetSelection::All.resolve("", "", "protecting").unwrap(),
            (String::new(), String::new())
        );
        assert_eq!(
            SheetSelection::Name.resolve(" A,B ", "", "protecting").unwrap().0,
            "A,B"
        );
        let err = SheetSelection::Index.resolve("A", " ", "unlocking").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Worksheet indexes are required when unlocking specific worksheets by index"
        );
        assert_eq!(SheetSelection::Index.describe("", "0,2"), "(indexes: 0,2)");
    }
}
