//! Protecting and unlocking workbooks.

use excelrelay_core::{string_or_number, ExcelError, ExcelResult, Expectation};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{spreadsheet_output, submit_document, SheetSelection};
use crate::item::{ItemOutput, WorkItem};
use crate::operation::Operation;
use crate::runner::Runner;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SecureOptions {
    /// Password required to open the file; empty for none.
    #[serde(deserialize_with = "string_or_number")]
    password: String,
    protect_workbook: bool,
    #[serde(deserialize_with = "string_or_number")]
    protect_workbook_password: String,
    protect_worksheets: bool,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_protection_type: String,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_protection_password: String,
    worksheet_selection: SheetSelection,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_names: String,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_indexes: String,
}

impl Default for SecureOptions {
    fn default() -> Self {
        Self {
            password: String::new(),
            protect_workbook: true,
            protect_workbook_password: String::new(),
            protect_worksheets: true,
            worksheet_protection_type: "All".into(),
            worksheet_protection_password: String::new(),
            worksheet_selection: SheetSelection::All,
            worksheet_names: String::new(),
            worksheet_indexes: String::new(),
        }
    }
}

impl SecureOptions {
    fn action(&self) -> ExcelResult<Value> {
        if self.password.is_empty() && !self.protect_workbook && !self.protect_worksheets {
            return Err(ExcelError::invalid(
                "At least one protection option must be enabled (file password, workbook protection, or worksheet protection)",
            ));
        }
        let (names, indexes) = if self.protect_worksheets {
            self.worksheet_selection
                .resolve(&self.worksheet_names, &self.worksheet_indexes, "protecting")?
        } else {
            (String::new(), String::new())
        };
        Ok(json!({
            "Password": self.password,
            "ProtectWorkbook": self.protect_workbook,
            "ProtectWorkbookPassword": self.protect_workbook_password,
            "ProtectWorksheets": self.protect_worksheets,
            "WorksheetProtectionType": self.worksheet_protection_type,
            "WorksheetProtectionPassword": self.worksheet_protection_password,
            "WorksheetNames": names,
            "WorksheetIndexes": indexes,
        }))
    }

    fn protection_summary(&self) -> Vec<String> {
        let mut summary = Vec::new();
        if !self.password.is_empty() {
            summary.push("File encryption enabled".to_string());
        }
        if self.protect_workbook {
            summary.push("Workbook structure protected".to_string());
        }
        if self.protect_worksheets {
            summary.push(format!(
                "Worksheets protected {}",
                self.worksheet_selection
                    .describe(&self.worksheet_names, &self.worksheet_indexes)
            ));
        }
        summary
    }
}

pub(crate) async fn secure(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::Secure;
    let options: SecureOptions = item.params.parse()?;
    let action = options.action()?;
    let (source, raw) = submit_document(runner, op, item, action).await?;

    let summary = options.protection_summary();
    let mut details = json!({
        "filePasswordProtected": !options.password.is_empty(),
        "workbookProtected": options.protect_workbook,
        "worksheetsProtected": options.protect_worksheets,
        "protectionSummary": summary,
    });
    if options.protect_worksheets {
        details["worksheetProtectionType"] = json!(options.worksheet_protection_type);
        details["worksheetSelection"] = json!(options.worksheet_selection);
    }

    let mut output = spreadsheet_output(
        op,
        item,
        &source,
        &raw,
        &Expectation::xlsx_or_xls(),
        details,
        |format| {
            format!(
                "Successfully secured Excel file ({}): {}",
                format.extension(),
                summary.join(", ")
            )
        },
    )?;
    let format = output
        .binary
        .values()
        .next()
        .map(|doc| doc.extension.trim_start_matches('.').to_string());
    if let (Value::Object(json), Some(format)) = (&mut output.json, format) {
        json.insert("fileFormat".into(), Value::String(format));
    }
    Ok(output)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UnlockOptions {
    #[serde(deserialize_with = "string_or_number")]
    secure_on_open_password: String,
    #[serde(deserialize_with = "string_or_number")]
    workbook_protection_password: String,
    unlock_worksheets: bool,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_protection_password: String,
    worksheet_selection: SheetSelection,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_names: String,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_indexes: String,
    #[serde(deserialize_with = "string_or_number")]
    culture_name: String,
}

impl Default for UnlockOptions {
    fn default() -> Self {
        Self {
            secure_on_open_password: String::new(),
            workbook_protection_password: String::new(),
            unlock_worksheets: false,
            worksheet_protection_password: String::new(),
            worksheet_selection: SheetSelection::All,
            worksheet_names: String::new(),
            worksheet_indexes: String::new(),
            culture_name: "en-US".into(),
        }
    }
}

impl UnlockOptions {
    fn unlocks_worksheets(&self) -> bool {
        self.unlock_worksheets && !self.worksheet_protection_password.is_empty()
    }

    fn action(&self) -> ExcelResult<Value> {
        if self.secure_on_open_password.is_empty()
            && self.workbook_protection_password.is_empty()
            && !self.unlocks_worksheets()
        {
            return Err(ExcelError::invalid(
                "At least one password must be provided to unlock the Excel file",
            ));
        }
        let (names, indexes) = if self.unlock_worksheets {
            self.worksheet_selection
                .resolve(&self.worksheet_names, &self.worksheet_indexes, "unlocking")?
        } else {
            (String::new(), String::new())
        };
        let worksheet_password = if self.unlock_worksheets {
            self.worksheet_protection_password.as_str()
        } else {
            ""
        };
        Ok(json!({
            "SecureOnOpenPassword": self.secure_on_open_password,
            "WorkbookProtectionPassword": self.workbook_protection_password,
            "WorksheetProtectionPassword": worksheet_password,
            "WorksheetNames": names,
            "WorksheetIndexes": indexes,
            "CultureName": self.culture_name,
        }))
    }

    fn unlock_summary(&self) -> Vec<String> {
        let mut summary = Vec::new();
        if !self.secure_on_open_password.is_empty() {
            summary.push("File encryption removed".to_string());
        }
        if !self.workbook_protection_password.is_empty() {
            summary.push("Workbook structure unlocked".to_string());
        }
        if self.unlocks_worksheets() {
            summary.push(format!(
                "Worksheets unlocked {}",
                self.worksheet_selection
                    .describe(&self.worksheet_names, &self.worksheet_indexes)
            ));
        }
        summary
    }
}

pub(crate) async fn unlock(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::Unlock;
    let options: UnlockOptions = item.params.parse()?;
    let action = options.action()?;
    let (source, raw) = submit_document(runner, op, item, action).await?;

    let summary = options.unlock_summary();
    let mut details = json!({
        "fileDecrypted": !options.secure_on_open_password.is_empty(),
        "workbookUnlocked": !options.workbook_protection_password.is_empty(),
        "worksheetsUnlocked": options.unlocks_worksheets(),
        "cultureName": options.culture_name,
        "unlockSummary": summary,
    });
    if options.unlock_worksheets {
        details["worksheetSelection"] = json!(options.worksheet_selection);
    }

    spreadsheet_output(op, item, &source, &raw, &Expectation::xlsx(), details, |_| {
        format!("Successfully unlocked Excel file: {}", summary.join(", "))
    })
}
