//! Worksheet operations: delete and extract.

use excelrelay_core::{
    string_or_number, DecodedDocument, ExcelError, ExcelResult, Expectation, FileFormat,
    ResponseDecoder,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{spreadsheet_output, submit_document, SheetSelection};
use crate::item::{ItemOutput, WorkItem};
use crate::operation::Operation;
use crate::output::{enforce_extension, OutputOptions};
use crate::runner::Runner;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DeleteWorksheetOptions {
    delete_by: SheetSelection,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_names: String,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_indexes: String,
}

impl Default for DeleteWorksheetOptions {
    fn default() -> Self {
        Self {
            delete_by: SheetSelection::Name,
            worksheet_names: String::new(),
            worksheet_indexes: String::new(),
        }
    }
}

pub(crate) async fn delete(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::DeleteWorksheet;
    let options: DeleteWorksheetOptions = item.params.parse()?;
    if options.delete_by == SheetSelection::All {
        return Err(ExcelError::invalid(
            "A workbook must keep at least one worksheet; select worksheets by name or index",
        ));
    }
    let (names, indexes) =
        options
            .delete_by
            .resolve(&options.worksheet_names, &options.worksheet_indexes, "deleting")?;

    let action = json!({
        "WorksheetNames": names,
        "WorksheetIndexes": indexes,
    });
    let details = json!({
        "deleteBy": options.delete_by,
        "worksheetNames": names,
        "worksheetIndexes": indexes,
    });
    let target = options
        .delete_by
        .describe(&options.worksheet_names, &options.worksheet_indexes);

    let (source, raw) = submit_document(runner, op, item, action).await?;
    spreadsheet_output(op, item, &source, &raw, &Expectation::xlsx(), details, |_| {
        format!("Successfully deleted worksheet(s) {target}")
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ExtractWorksheetOptions {
    extract_by: SheetSelection,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_names: String,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_indexes: String,
}

impl Default for ExtractWorksheetOptions {
    fn default() -> Self {
        Self {
            extract_by: SheetSelection::Name,
            worksheet_names: String::new(),
            worksheet_indexes: String::new(),
        }
    }
}

impl ExtractWorksheetOptions {
    /// `worksheetNames` / `worksheetIndexes` for whichever mode is active.
    fn selection_fields(&self) -> Value {
        match self.extract_by {
            SheetSelection::Name => json!({ "worksheetNames": self.worksheet_names }),
            SheetSelection::Index => json!({ "worksheetIndexes": self.worksheet_indexes }),
            SheetSelection::All => json!({}),
        }
    }

    fn extraction_info(&self) -> String {
        match self.extract_by {
            SheetSelection::Name => format!("worksheet(s) '{}' by name", self.worksheet_names),
            SheetSelection::Index => {
                format!("worksheet(s) at index(es) '{}'", self.worksheet_indexes)
            }
            SheetSelection::All => "all worksheets".to_string(),
        }
    }
}

fn merged(mut base: Value, extra: Value) -> Value {
    if let (Value::Object(base), Value::Object(extra)) = (&mut base, extra) {
        base.extend(extra);
    }
    base
}

pub(crate) async fn extract(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::ExtractWorksheet;
    let options: ExtractWorksheetOptions = item.params.parse()?;
    let outputs: OutputOptions = item.params.parse()?;
    let (names, indexes) =
        options
            .extract_by
            .resolve(&options.worksheet_names, &options.worksheet_indexes, "extracting")?;

    let action = json!({
        "WorksheetNames": names,
        "WorksheetIndexes": indexes,
    });
    let (source, raw) = submit_document(runner, op, item, action).await?;

    let text = ResponseDecoder::new()
        .with_extra_key("fileContent")
        .normalize_text(&raw)?;

    let base_name = outputs.file_name(
        &op.default_output_name(),
        &source.file_name,
        op.default_stem(),
        FileFormat::Xlsx.extension(),
    );
    let json_name = enforce_extension(&base_name, FileFormat::Json.extension());
    let txt_name = enforce_extension(&base_name, FileFormat::Text.extension());

    let parsed = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| {
        merged(
            json!({
                "fileName": txt_name,
                "fileSize": text.len(),
                "fileType": "Text",
                "originalFileName": source.file_name,
                "extractBy": options.extract_by,
            }),
            merged(
                options.selection_fields(),
                json!({
                    "message": "Successfully processed Excel data",
                    "rawContent": text,
                    "note": "Content processed as text data",
                }),
            ),
        )
    });

    let json_bytes = serde_json::to_vec_pretty(&parsed)?;
    let json_doc = DecodedDocument::new(json_bytes, json_name, FileFormat::Json);
    let txt_doc = DecodedDocument::new(text.into_bytes(), txt_name, FileFormat::Text);
    info!(operation = %op, json_bytes = json_doc.len(), txt_bytes = txt_doc.len(), "worksheet extracted");

    let summary = merged(
        json!({
            "jsonFileName": json_doc.file_name,
            "txtFileName": txt_doc.file_name,
            "jsonFileSize": json_doc.len(),
            "txtFileSize": txt_doc.len(),
            "success": true,
            "originalFileName": source.file_name,
            "extractBy": options.extract_by,
        }),
        merged(
            options.selection_fields(),
            json!({
                "parsedData": parsed,
                "message": format!(
                    "Successfully extracted {} and created JSON and TXT outputs",
                    options.extraction_info()
                ),
            }),
        ),
    );

    Ok(ItemOutput::from_json(summary)
        .with_document(outputs.suffixed_key("json"), json_doc)
        .with_document(outputs.suffixed_key("txt"), txt_doc))
}
