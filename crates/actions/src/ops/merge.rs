//! Merging workbooks and merging rows within a workbook.
//!
//! Both operations let the caller pick the output format, so the output is
//! validated against that format rather than always as a modern workbook.

use excelrelay_core::{
    string_or_number, DecodedDocument, ExcelError, ExcelResult, Expectation, FileFormat, RawPayload,
    RequestEnvelope, ResponseDecoder, Signature,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{envelope, send, summary};
use crate::item::{ItemOutput, WorkItem};
use crate::operation::Operation;
use crate::output::{derive_name, replace_known_extension, split_list, OutputOptions};
use crate::runner::Runner;
use crate::source::{self, InputKind};

/// Size floor for merge outputs; CSV and PDF results can be small.
const MIN_MERGED_LEN: usize = 100;

const MERGE_FILES_FORMATS: &[FileFormat] =
    &[FileFormat::Xlsx, FileFormat::Xls, FileFormat::Pdf, FileFormat::Csv];
const MERGE_ROWS_FORMATS: &[FileFormat] =
    &[FileFormat::Xlsx, FileFormat::Xlsb, FileFormat::Xls, FileFormat::Csv];

fn parse_format(value: &str, allowed: &[FileFormat]) -> ExcelResult<FileFormat> {
    FileFormat::from_option(value)
        .filter(|format| allowed.contains(format))
        .ok_or_else(|| ExcelError::invalid(format!("Unsupported output format: {value}")))
}

/// Validation for a merge output of `format`.
fn expectation(format: FileFormat) -> Expectation {
    if !format.is_spreadsheet() {
        return Expectation::any(MIN_MERGED_LEN);
    }
    let signatures: &'static [Signature] = match format {
        FileFormat::Xls => &[Signature::Ole],
        _ => &[Signature::Zip],
    };
    Expectation {
        min_len: MIN_MERGED_LEN,
        signatures,
    }
}

fn extensions(formats: &[FileFormat]) -> Vec<&'static str> {
    formats.iter().map(|f| f.extension()).collect()
}

/// Decode and package a merge result named `file_name` (without extension handling).
fn merged_document(raw: &RawPayload, format: FileFormat, file_name: String) -> ExcelResult<DecodedDocument> {
    let (bytes, _) = ResponseDecoder::new().decode_document(raw, &expectation(format))?;
    Ok(DecodedDocument::new(bytes, file_name, format))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MergeFilesOptions {
    files_to_merge: FileList,
    #[serde(deserialize_with = "string_or_number")]
    output_format: String,
    #[serde(deserialize_with = "string_or_number")]
    output_file_name: String,
}

impl Default for MergeFilesOptions {
    fn default() -> Self {
        Self {
            files_to_merge: FileList::default(),
            output_format: "XLSX".into(),
            output_file_name: "merged-workbook".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FileList {
    file_values: Vec<MergeFile>,
}

/// One workbook in a merge and how to obtain it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MergeFile {
    input_method: InputKind,
    #[serde(deserialize_with = "string_or_number")]
    filename: String,
    /// Zero or absent means "position in the list".
    sort_position: Option<i64>,
    /// Comma-separated; empty merges every worksheet.
    #[serde(deserialize_with = "string_or_number")]
    worksheets_to_merge: String,
    #[serde(deserialize_with = "string_or_number")]
    binary_property_name: String,
    #[serde(deserialize_with = "string_or_number")]
    base64_content: String,
    #[serde(deserialize_with = "string_or_number")]
    file_url: String,
}

impl Default for MergeFile {
    fn default() -> Self {
        Self {
            input_method: InputKind::BinaryData,
            filename: String::new(),
            sort_position: None,
            worksheets_to_merge: String::new(),
            binary_property_name: "data".into(),
            base64_content: String::new(),
            file_url: String::new(),
        }
    }
}

/// A merge input after acquisition, in wire order once sorted.
#[derive(Debug, Clone, PartialEq)]
struct MergeDocument {
    filename: String,
    content: String,
    sort_position: i64,
    worksheets: Vec<String>,
}

impl MergeDocument {
    fn to_request(&self) -> Value {
        let mut document = json!({
            "Filename": self.filename,
            "FileContent": self.content,
            "SortPosition": self.sort_position,
        });
        if !self.worksheets.is_empty() {
            document["WorksheetsToMerge"] = json!(self.worksheets);
        }
        document
    }

    fn summary(&self) -> Value {
        let worksheets = if self.worksheets.is_empty() {
            json!("all")
        } else {
            json!(self.worksheets)
        };
        json!({
            "filename": self.filename,
            "sortPosition": self.sort_position,
            "worksheets": worksheets,
        })
    }
}

/// Prefix an input error with the 1-based file number.
fn for_file(number: usize, error: ExcelError) -> ExcelError {
    match error {
        ExcelError::Input(message) => ExcelError::Input(format!("File {number}: {message}")),
        ExcelError::InvalidParameter(message) => {
            ExcelError::InvalidParameter(format!("File {number}: {message}"))
        }
        other => other,
    }
}

async fn acquire_files(runner: &Runner, item: &WorkItem, files: &[MergeFile]) -> ExcelResult<Vec<MergeDocument>> {
    let mut documents = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        let fetched = source::fetch(
            runner.downloader(),
            item,
            file.input_method,
            &file.binary_property_name,
            &file.base64_content,
            &file.file_url,
            "File",
        )
        .await
        .map_err(|e| for_file(i + 1, e))?;

        let filename = Some(file.filename.trim())
            .filter(|n| !n.is_empty())
            .map_or_else(|| format!("file{}.xlsx", i + 1), str::to_string);
        let position = i64::try_from(i).unwrap_or(i64::MAX);
        documents.push(MergeDocument {
            filename,
            content: fetched.content,
            sort_position: file.sort_position.filter(|p| *p != 0).unwrap_or(position),
            worksheets: split_list(&file.worksheets_to_merge),
        });
    }
    documents.sort_by_key(|d| d.sort_position);
    Ok(documents)
}

pub(crate) async fn files(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::MergeFiles;
    let options: MergeFilesOptions = item.params.parse()?;
    let outputs: OutputOptions = item.params.parse()?;

    match options.files_to_merge.file_values.len() {
        0 => return Err(ExcelError::invalid("At least one file is required to merge")),
        1 => return Err(ExcelError::invalid("At least two files are required to merge")),
        _ => {}
    }
    let format = parse_format(&options.output_format, MERGE_FILES_FORMATS)?;
    let documents = acquire_files(runner, item, &options.files_to_merge.file_values).await?;
    debug!(files = documents.len(), format = %format, "merge inputs acquired");

    let action = json!({
        "OutputFileName": options.output_file_name,
        "OutputFormat": options.output_format,
        "Documents": documents.iter().map(MergeDocument::to_request).collect::<Vec<_>>(),
    });
    let request = RequestEnvelope::without_document(op.action_key(), action)?;
    let raw = send(runner, op, &request).await?;

    let base = Some(options.output_file_name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or(op.default_stem());
    let file_name = replace_known_extension(base, &extensions(MERGE_FILES_FORMATS), format.extension());
    let document = merged_document(&raw, format, file_name)?;
    info!(operation = %op, file = %document.file_name, bytes = document.len(), "operation completed");

    let details = json!({
        "outputFormat": options.output_format,
        "filesCount": documents.len(),
        "filesMerged": documents.iter().map(MergeDocument::summary).collect::<Vec<_>>(),
    });
    let message = format!(
        "Successfully merged {} Excel file(s) into {} format",
        documents.len(),
        options.output_format
    );
    let json = summary(&document, None, details, message);
    Ok(ItemOutput::from_json(json).with_document(outputs.key(), document))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MergeRowsOptions {
    /// Comma-separated; empty means all worksheets.
    #[serde(deserialize_with = "string_or_number")]
    worksheet_numbers: String,
    #[serde(deserialize_with = "string_or_number")]
    merge_key_columns: String,
    #[serde(deserialize_with = "string_or_number")]
    output_format: String,
}

impl Default for MergeRowsOptions {
    fn default() -> Self {
        Self {
            worksheet_numbers: String::new(),
            merge_key_columns: String::new(),
            output_format: "XLSX".into(),
        }
    }
}

impl MergeRowsOptions {
    fn message(&self) -> String {
        let mut message = "Successfully merged rows in Excel file".to_string();
        if !self.worksheet_numbers.is_empty() {
            message.push_str(&format!(" from worksheets {}", self.worksheet_numbers));
        }
        if !self.merge_key_columns.is_empty() {
            message.push_str(&format!(" using key columns {}", self.merge_key_columns));
        }
        message
    }
}

pub(crate) async fn rows(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::MergeRows;
    let options: MergeRowsOptions = item.params.parse()?;
    let outputs: OutputOptions = item.params.parse()?;
    let format = parse_format(&options.output_format, MERGE_ROWS_FORMATS)?;

    let source = super::acquire(runner, op, item).await?;
    let action = json!({
        "WorksheetNumbers": options.worksheet_numbers,
        "MergeKeyColumns": options.merge_key_columns,
        "OutputFormat": options.output_format,
    });
    let raw = send(runner, op, &envelope(op, &source, action)?).await?;

    let requested = outputs
        .output_file_name
        .clone()
        .unwrap_or_else(|| op.default_output_name());
    let file_name = if requested.trim().is_empty() {
        derive_name(&source.file_name, op.default_stem(), format.extension())
    } else {
        replace_known_extension(requested.trim(), &extensions(MERGE_ROWS_FORMATS), format.extension())
    };
    let document = merged_document(&raw, format, file_name)?;
    info!(operation = %op, file = %document.file_name, bytes = document.len(), "operation completed");

    let details = json!({
        "worksheetNumbers": if options.worksheet_numbers.is_empty() { "all worksheets" } else { options.worksheet_numbers.as_str() },
        "mergeKeyColumns": if options.merge_key_columns.is_empty() { "none specified" } else { options.merge_key_columns.as_str() },
        "outputFormat": options.output_format,
    });
    let json = summary(&document, Some(&source.file_name), details, options.message());
    Ok(ItemOutput::from_json(json).with_document(outputs.key(), document))
}
