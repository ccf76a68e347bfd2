//! Row operations: update, add, extract and delete.

use excelrelay_core::{string_or_number, ExcelError, ExcelResult, Expectation};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::info;

use super::{spreadsheet_output, submit_document};
use crate::item::{ItemOutput, WorkItem};
use crate::operation::Operation;
use crate::runner::Runner;

const FIRST_WORKSHEET: &str = "First Worksheet";

/// Conversion settings shared by update and add.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Conversion {
    convert_numeric_and_date: bool,
    #[serde(deserialize_with = "string_or_number")]
    date_format: String,
    #[serde(deserialize_with = "string_or_number")]
    numeric_format: String,
    ignore_null_values: bool,
    ignore_attribute_titles: bool,
    #[serde(deserialize_with = "string_or_number")]
    culture_name: String,
}

impl Default for Conversion {
    fn default() -> Self {
        Self {
            convert_numeric_and_date: true,
            date_format: "yyyy-MM-dd".into(),
            numeric_format: "N2".into(),
            ignore_null_values: false,
            ignore_attribute_titles: false,
            culture_name: "en-US".into(),
        }
    }
}

/// Row data as JSON text; an already-parsed array or object is serialized
/// back.
fn json_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

/// Check the row data and worksheet name, returning the row count reported
/// in the summary: the array length, or 1 for a single object.
fn validate_rows(json_data: &str, worksheet_name: &str) -> ExcelResult<usize> {
    if json_data.trim().is_empty() {
        return Err(ExcelError::invalid("JSON data is required"));
    }
    let parsed: Value = serde_json::from_str(json_data)
        .map_err(|e| ExcelError::invalid(format!("Invalid JSON data: {e}")))?;
    if worksheet_name.trim().is_empty() {
        return Err(ExcelError::invalid("Worksheet name is required"));
    }
    Ok(match parsed {
        Value::Array(rows) => rows.len(),
        _ => 1,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UpdateRowsOptions {
    #[serde(deserialize_with = "string_or_number")]
    worksheet_name: String,
    #[serde(deserialize_with = "json_text")]
    json_data: String,
    start_row: i64,
    start_column: i64,
    #[serde(flatten)]
    conversion: Conversion,
}

impl Default for UpdateRowsOptions {
    fn default() -> Self {
        Self {
            worksheet_name: String::new(),
            json_data: String::new(),
            start_row: 1,
            start_column: 1,
            conversion: Conversion::default(),
        }
    }
}

impl UpdateRowsOptions {
    fn action(&self) -> Value {
        let c = &self.conversion;
        json!({
            "WorksheetName": self.worksheet_name,
            "JsonData": self.json_data,
            "StartRow": self.start_row,
            "StartColumn": self.start_column,
            "ConvertNumericAndDate": c.convert_numeric_and_date,
            "DateFormat": c.date_format,
            "NumericFormat": c.numeric_format,
            "IgnoreNullValues": c.ignore_null_values,
            "IgnoreAttributeTitles": c.ignore_attribute_titles,
            "CultureName": c.culture_name,
        })
    }
}

pub(crate) async fn update(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::UpdateRows;
    let options: UpdateRowsOptions = item.params.parse()?;
    let count = validate_rows(&options.json_data, &options.worksheet_name)?;

    let c = &options.conversion;
    let details = json!({
        "worksheetName": options.worksheet_name,
        "startRow": options.start_row,
        "startColumn": options.start_column,
        "rowsUpdated": count,
        "convertNumericAndDate": c.convert_numeric_and_date,
        "dateFormat": c.date_format,
        "numericFormat": c.numeric_format,
        "ignoreNullValues": c.ignore_null_values,
        "ignoreAttributeTitles": c.ignore_attribute_titles,
        "cultureName": c.culture_name,
    });

    let (source, raw) = submit_document(runner, op, item, options.action()).await?;
    spreadsheet_output(op, item, &source, &raw, &Expectation::xlsx(), details, |_| {
        format!(
            "Successfully updated {count} row(s) in worksheet '{}'",
            options.worksheet_name
        )
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AddRowsOptions {
    #[serde(deserialize_with = "string_or_number")]
    worksheet_name: String,
    #[serde(deserialize_with = "json_text")]
    json_input: String,
    insert_from_row: i64,
    insert_from_column: i64,
    /// Sent only when non-empty.
    #[serde(deserialize_with = "string_or_number")]
    table_name: String,
    excel_row_number: i64,
    #[serde(flatten)]
    conversion: Conversion,
}

impl Default for AddRowsOptions {
    fn default() -> Self {
        Self {
            worksheet_name: String::new(),
            json_input: String::new(),
            insert_from_row: 1,
            insert_from_column: 1,
            table_name: String::new(),
            excel_row_number: 1,
            conversion: Conversion::default(),
        }
    }
}

impl AddRowsOptions {
    fn table_name(&self) -> Option<&str> {
        Some(self.table_name.trim()).filter(|t| !t.is_empty())
    }

    fn action(&self) -> Value {
        let c = &self.conversion;
        let mut action = json!({
            "WorksheetName": self.worksheet_name,
            "JsonInput": self.json_input,
            "InsertFromRow": self.insert_from_row,
            "InsertFromColumn": self.insert_from_column,
            "ConvertNumericAndDate": c.convert_numeric_and_date,
            "DateFormat": c.date_format,
            "NumericFormat": c.numeric_format,
            "IgnoreAttributeTitles": c.ignore_attribute_titles,
            "IgnoreNullValues": c.ignore_null_values,
            "CultureName": c.culture_name,
            "ExcelRowNumber": self.excel_row_number,
        });
        if let Some(table) = self.table_name() {
            action["TableName"] = json!(table);
        }
        action
    }
}

pub(crate) async fn add(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::AddRows;
    let options: AddRowsOptions = item.params.parse()?;
    let count = validate_rows(&options.json_input, &options.worksheet_name)?;

    let c = &options.conversion;
    let details = json!({
        "worksheetName": options.worksheet_name,
        "insertFromRow": options.insert_from_row,
        "insertFromColumn": options.insert_from_column,
        "rowsAdded": count,
        "tableName": options.table_name(),
        "excelRowNumber": options.excel_row_number,
        "convertNumericAndDate": c.convert_numeric_and_date,
        "dateFormat": c.date_format,
        "numericFormat": c.numeric_format,
        "ignoreAttributeTitles": c.ignore_attribute_titles,
        "ignoreNullValues": c.ignore_null_values,
        "cultureName": c.culture_name,
    });

    let (source, raw) = submit_document(runner, op, item, options.action()).await?;
    spreadsheet_output(op, item, &source, &raw, &Expectation::xlsx(), details, |_| {
        format!(
            "Successfully added {count} row(s) to worksheet '{}'",
            options.worksheet_name
        )
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ExtractRowsOptions {
    /// Empty means the first worksheet.
    #[serde(deserialize_with = "string_or_number")]
    worksheet_name: String,
    has_header_row: bool,
    first_row: i64,
    /// `-1` means through the last used row.
    last_row: i64,
    first_column: i64,
    last_column: i64,
    exclude_empty_rows: bool,
    exclude_hidden_rows: bool,
    exclude_hidden_columns: bool,
    export_values_as_text: bool,
    export_empty_cells: bool,
    export_as_object: bool,
    #[serde(deserialize_with = "string_or_number")]
    hyperlink_format: String,
    #[serde(deserialize_with = "string_or_number")]
    culture: String,
}

impl Default for ExtractRowsOptions {
    fn default() -> Self {
        Self {
            worksheet_name: String::new(),
            has_header_row: true,
            first_row: 0,
            last_row: -1,
            first_column: 0,
            last_column: -1,
            exclude_empty_rows: true,
            exclude_hidden_rows: true,
            exclude_hidden_columns: true,
            export_values_as_text: false,
            export_empty_cells: false,
            export_as_object: false,
            hyperlink_format: "Text".into(),
            culture: "en-US".into(),
        }
    }
}

impl ExtractRowsOptions {
    fn action(&self) -> Value {
        json!({
            "WorksheetName": self.worksheet_name,
            "HasHeaderRow": self.has_header_row,
            "FirstRow": self.first_row,
            "LastRow": self.last_row,
            "FirstColumn": self.first_column,
            "LastColumn": self.last_column,
            "ExcludeEmptyRows": self.exclude_empty_rows,
            "ExcludeHiddenRows": self.exclude_hidden_rows,
            "ExcludeHiddenColumns": self.exclude_hidden_columns,
            "ExportValuesAsText": self.export_values_as_text,
            "ExportEmptyCells": self.export_empty_cells,
            "ExportAsObject": self.export_as_object,
            "HyperlinkFormat": self.hyperlink_format,
            "Culture": self.culture,
        })
    }

    fn sheet_label(&self) -> &str {
        if self.worksheet_name.is_empty() {
            FIRST_WORKSHEET
        } else {
            &self.worksheet_name
        }
    }
}

/// Truthiness of a response field: present and not null, false, zero or "".
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The row data in an extraction response: the first present field among
/// `data`, `rows`, `extractedData` and `result`, else the whole response.
fn extracted_rows(response: Value) -> Value {
    if let Value::Object(map) = &response {
        for key in ["data", "rows", "extractedData", "result"] {
            if let Some(value) = map.get(key).filter(|v| is_present(v)) {
                return value.clone();
            }
        }
    }
    response
}

fn count_rows(data: &Value) -> usize {
    match data {
        Value::Array(rows) => rows.len(),
        Value::Object(map) => ["rows", "data"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .map_or(1, Vec::len),
        _ => 0,
    }
}

pub(crate) async fn extract(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::ExtractRows;
    let options: ExtractRowsOptions = item.params.parse()?;
    let (source, raw) = submit_document(runner, op, item, options.action()).await?;

    let data = extracted_rows(raw.into_json());
    let count = count_rows(&data);
    info!(operation = %op, rows = count, "rows extracted");

    let sheet = options.sheet_label();
    Ok(ItemOutput::from_json(json!({
        "success": true,
        "originalFileName": source.file_name,
        "worksheetName": sheet,
        "hasHeaderRow": options.has_header_row,
        "firstRow": options.first_row,
        "lastRow": options.last_row,
        "firstColumn": options.first_column,
        "lastColumn": options.last_column,
        "excludeEmptyRows": options.exclude_empty_rows,
        "excludeHiddenRows": options.exclude_hidden_rows,
        "excludeHiddenColumns": options.exclude_hidden_columns,
        "exportValuesAsText": options.export_values_as_text,
        "exportEmptyCells": options.export_empty_cells,
        "exportAsObject": options.export_as_object,
        "hyperlinkFormat": options.hyperlink_format,
        "culture": options.culture,
        "rowsExtracted": count,
        "extractedData": data,
        "message": format!("Successfully extracted {count} row(s) from worksheet '{sheet}'"),
    })))
}

/// An inclusive, one-based row range.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DeleteRowsOptions {
    #[serde(deserialize_with = "string_or_number")]
    worksheet_name: String,
    start_row: i64,
    /// Defaults to `start_row`.
    end_row: Option<i64>,
}

impl Default for DeleteRowsOptions {
    fn default() -> Self {
        Self {
            worksheet_name: String::new(),
            start_row: 1,
            end_row: None,
        }
    }
}

impl DeleteRowsOptions {
    fn range(&self) -> ExcelResult<(i64, i64)> {
        if self.worksheet_name.trim().is_empty() {
            return Err(ExcelError::invalid("Worksheet name is required"));
        }
        if self.start_row < 1 {
            return Err(ExcelError::invalid("Start row must be 1 or greater"));
        }
        let end = self.end_row.unwrap_or(self.start_row);
        if end < self.start_row {
            return Err(ExcelError::invalid(
                "End row must be greater than or equal to start row",
            ));
        }
        Ok((self.start_row, end))
    }
}

pub(crate) async fn delete(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::DeleteRows;
    let options: DeleteRowsOptions = item.params.parse()?;
    let (start, end) = options.range()?;
    let count = end - start + 1;

    let action = json!({
        "WorksheetName": options.worksheet_name,
        "StartRow": start,
        "EndRow": end,
    });
    let details = json!({
        "worksheetName": options.worksheet_name,
        "startRow": start,
        "endRow": end,
        "rowsDeleted": count,
    });

    let (source, raw) = submit_document(runner, op, item, action).await?;
    spreadsheet_output(op, item, &source, &raw, &Expectation::xlsx(), details, |_| {
        format!(
            "Successfully deleted {count} row(s) from worksheet '{}'",
            options.worksheet_name
        )
    })
}
