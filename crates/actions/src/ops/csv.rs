//! CSV parsing.
//!
//! The API parses the CSV and returns the structured result as text; the
//! same content is attached twice, as `.txt` and as `.json`.

use excelrelay_core::{
    string_or_number, DecodedDocument, ExcelError, ExcelResult, FileFormat, RawPayload,
    ResponseDecoder,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::submit_document;
use crate::item::{ItemOutput, WorkItem};
use crate::operation::Operation;
use crate::output::{enforce_extension, OutputOptions};
use crate::runner::Runner;

const CUSTOM: &str = "custom";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ParseCsvOptions {
    /// A literal delimiter, or `custom` to use `custom_delimiter`.
    #[serde(deserialize_with = "string_or_number")]
    delimiter: String,
    #[serde(deserialize_with = "string_or_number")]
    custom_delimiter: String,
    skip_first_line: bool,
    /// Comma-separated; empty takes headers from the CSV.
    #[serde(deserialize_with = "string_or_number")]
    column_headers: String,
    #[serde(deserialize_with = "string_or_number")]
    culture_name: String,
}

impl Default for ParseCsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".into(),
            custom_delimiter: String::new(),
            skip_first_line: false,
            column_headers: String::new(),
            culture_name: "en-US".into(),
        }
    }
}

impl ParseCsvOptions {
    fn effective_delimiter(&self) -> ExcelResult<&str> {
        if self.delimiter == CUSTOM {
            if self.custom_delimiter.is_empty() {
                return Err(ExcelError::invalid(
                    "Custom delimiter is required when \"Custom\" is selected",
                ));
            }
            return Ok(&self.custom_delimiter);
        }
        Ok(&self.delimiter)
    }
}

/// Reject a response that reports `Success: false`.
fn check_reported_failure(raw: &RawPayload) -> ExcelResult<()> {
    let Some(response) = raw.as_object() else {
        return Ok(());
    };
    if response.get("Success") != Some(&Value::Bool(false)) {
        return Ok(());
    }
    let message = response
        .get("ErrorMessage")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("Unknown error occurred");
    let details = response
        .get("Errors")
        .and_then(Value::as_array)
        .map(|errors| errors.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .filter(|errors| !errors.is_empty())
        .map(|errors| format!(" Details: {}", errors.join(", ")))
        .unwrap_or_default();
    Err(ExcelError::decode(format!("CSV parsing failed: {message}{details}")))
}

pub(crate) async fn parse(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::ParseCsv;
    let options: ParseCsvOptions = item.params.parse()?;
    let outputs: OutputOptions = item.params.parse()?;
    let delimiter = options.effective_delimiter()?;

    let action = json!({
        "Delimiter": delimiter,
        "ColumnHeaders": options.column_headers,
        "SkipFirstLine": options.skip_first_line,
        "CultureName": options.culture_name,
    });
    let (source, raw) = submit_document(runner, op, item, action).await?;

    check_reported_failure(&raw)?;
    let text = ResponseDecoder::new()
        .with_extra_key("fileContent")
        .normalize_text(&raw)?;

    let base_name = outputs.file_name(
        &op.default_output_name(),
        &source.file_name,
        op.default_stem(),
        FileFormat::Text.extension(),
    );
    let txt = DecodedDocument::new(
        text.clone().into_bytes(),
        enforce_extension(&base_name, FileFormat::Text.extension()),
        FileFormat::Text,
    );
    let json_doc = DecodedDocument::new(
        text.into_bytes(),
        enforce_extension(&base_name, FileFormat::Json.extension()),
        FileFormat::Json,
    );
    info!(operation = %op, bytes = txt.len(), "csv parsed");

    let column_headers = if options.column_headers.is_empty() {
        "from CSV"
    } else {
        options.column_headers.as_str()
    };
    let summary = json!({
        "txtFileName": txt.file_name,
        "jsonFileName": json_doc.file_name,
        "txtFileSize": txt.len(),
        "jsonFileSize": json_doc.len(),
        "success": true,
        "originalFileName": source.file_name,
        "delimiter": delimiter,
        "skipFirstLine": options.skip_first_line,
        "columnHeaders": column_headers,
        "cultureName": options.culture_name,
        "message": "Successfully converted CSV and created TXT and JSON outputs",
    });

    Ok(ItemOutput::from_json(summary)
        .with_document(outputs.suffixed_key("txt"), txt)
        .with_document(outputs.suffixed_key("json"), json_doc))
}
