//! The catalogue of supported spreadsheet operations.

use std::fmt;
use std::str::FromStr;

use excelrelay_core::{ExcelError, ExcelResult};

const ENDPOINT_PREFIX: &str = "/office/ApiV2Excel/";

/// A spreadsheet operation the API can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddTextHeaderFooter,
    AddImageHeaderFooter,
    RemoveHeaderFooter,
    AddTextWatermark,
    RemoveWatermark,
    FindReplaceText,
    UpdateRows,
    AddRows,
    ExtractRows,
    DeleteRows,
    DeleteWorksheet,
    ExtractWorksheet,
    Secure,
    Unlock,
    MergeFiles,
    MergeRows,
    ParseCsv,
}

impl Operation {
    pub const ALL: [Operation; 17] = [
        Operation::AddTextHeaderFooter,
        Operation::AddImageHeaderFooter,
        Operation::RemoveHeaderFooter,
        Operation::AddTextWatermark,
        Operation::RemoveWatermark,
        Operation::FindReplaceText,
        Operation::UpdateRows,
        Operation::AddRows,
        Operation::ExtractRows,
        Operation::DeleteRows,
        Operation::DeleteWorksheet,
        Operation::ExtractWorksheet,
        Operation::Secure,
        Operation::Unlock,
        Operation::MergeFiles,
        Operation::MergeRows,
        Operation::ParseCsv,
    ];

    /// Display name, as presented to users of the host.
    pub fn name(self) -> &'static str {
        match self {
            Self::AddTextHeaderFooter => "Add Text Header Footer To Excel",
            Self::AddImageHeaderFooter => "Add Image Header Footer To Excel",
            Self::RemoveHeaderFooter => "Remove Header Footer To Excel",
            Self::AddTextWatermark => "Add Text Watermark To Excel",
            Self::RemoveWatermark => "Remove Watermark From Excel",
            Self::FindReplaceText => "Find Replace Text In Excel",
            Self::UpdateRows => "Update Rows To Excel",
            Self::AddRows => "Add Rows To Excel",
            Self::ExtractRows => "Excel Extract Rows",
            Self::DeleteRows => "Delete Rows From Excel",
            Self::DeleteWorksheet => "Delete Worksheet From Excel",
            Self::ExtractWorksheet => "Extract Worksheet From Excel",
            Self::Secure => "Secure Excel File",
            Self::Unlock => "Unlock Excel File",
            Self::MergeFiles => "Merge Excel Files",
            Self::MergeRows => "Merge Rows In Excel",
            Self::ParseCsv => "Parse CSV To JSON",
        }
    }

    /// Kebab-case identifier used on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            Self::AddTextHeaderFooter => "add-text-header-footer",
            Self::AddImageHeaderFooter => "add-image-header-footer",
            Self::RemoveHeaderFooter => "remove-header-footer",
            Self::AddTextWatermark => "add-text-watermark",
            Self::RemoveWatermark => "remove-watermark",
            Self::FindReplaceText => "find-replace-text",
            Self::UpdateRows => "update-rows",
            Self::AddRows => "add-rows",
            Self::ExtractRows => "extract-rows",
            Self::DeleteRows => "delete-rows",
            Self::DeleteWorksheet => "delete-worksheet",
            Self::ExtractWorksheet => "extract-worksheet",
            Self::Secure => "secure",
            Self::Unlock => "unlock",
            Self::MergeFiles => "merge-files",
            Self::MergeRows => "merge-rows",
            Self::ParseCsv => "parse-csv",
        }
    }

    fn endpoint_name(self) -> &'static str {
        match self {
            Self::AddTextHeaderFooter => "ExcelAddTextHeaderFooter",
            Self::AddImageHeaderFooter => "ExcelAddImageHeaderFooter",
            Self::RemoveHeaderFooter => "ExcelRemoveHeaderFooter",
            Self::AddTextWatermark => "ExcelAddTextWatermark",
            Self::RemoveWatermark => "ExcelDeleteWatermark",
            Self::FindReplaceText => "ExcelFindAndReplaceTextInExcel",
            Self::UpdateRows => "ExcelUpdateRows",
            Self::AddRows => "ExcelAddRows",
            Self::ExtractRows => "ExcelExtractRows",
            Self::DeleteRows => "ExcelDeleteRows",
            Self::DeleteWorksheet => "ExcelDeleteWorksheet",
            Self::ExtractWorksheet => "ExcelExtractWorksheet",
            Self::Secure => "ExcelSecure",
            Self::Unlock => "ExcelUnlock",
            Self::MergeFiles => "ExcelMergeFiles",
            Self::MergeRows => "ExcelMergeRows",
            Self::ParseCsv => "ExcelParseCsv",
        }
    }

    /// Endpoint path relative to the API base URL.
    pub fn endpoint(self) -> String {
        format!("{ENDPOINT_PREFIX}{}", self.endpoint_name())
    }

    /// Key of the operation-specific object in the request envelope.
    pub fn action_key(self) -> &'static str {
        match self {
            Self::AddTextHeaderFooter => "addTextHeaderFooterToExcelAction",
            Self::AddImageHeaderFooter => "addImageHeaderFooterToExcelAction",
            Self::RemoveHeaderFooter => "removeHeaderFooterToExcelAction",
            Self::AddTextWatermark => "addTextWatermarkToExcelAction",
            Self::RemoveWatermark => "deleteWatermarkToExcelAction",
            Self::FindReplaceText => "ReplaceTextToExcelAction",
            Self::UpdateRows => "UpdateRowsToExcelAction",
            Self::AddRows => "addRowsToExcelAction",
            Self::ExtractRows => "extractRowsToExcelAction",
            Self::DeleteRows => "deleteRowsFromExcelAction",
            Self::DeleteWorksheet => "deleteWorksheetFromExcelAction",
            Self::ExtractWorksheet => "ExtractWorksheetToExcelAction",
            Self::Secure => "SecureExcelAction",
            Self::Unlock => "UnlockExcelAction",
            Self::MergeFiles => "MergeFilesToExcelAction",
            Self::MergeRows => "MergeRowsToExcelAction",
            Self::ParseCsv => "CsvParseToExcelAction",
        }
    }

    /// Prefix of the error reported when the operation fails.
    pub fn failure_prefix(self) -> &'static str {
        match self {
            Self::AddTextHeaderFooter => "Add text header/footer to Excel",
            Self::AddImageHeaderFooter => "Add image header/footer to Excel",
            Self::RemoveHeaderFooter => "Remove header/footer from Excel",
            Self::AddTextWatermark => "Add text watermark to Excel",
            Self::RemoveWatermark => "Remove watermark from Excel",
            Self::FindReplaceText => "Find and replace text in Excel",
            Self::UpdateRows => "Update rows in Excel",
            Self::AddRows => "Add rows to Excel",
            Self::ExtractRows => "Extract rows from Excel",
            Self::DeleteRows => "Delete rows from Excel",
            Self::DeleteWorksheet => "Delete worksheet from Excel",
            Self::ExtractWorksheet => "Extract worksheet from Excel",
            Self::Secure => "Secure Excel file",
            Self::Unlock => "Unlock Excel file",
            Self::MergeFiles => "Merge Excel files",
            Self::MergeRows => "Merge rows in Excel",
            Self::ParseCsv => "Parse CSV to Excel",
        }
    }

    /// Base name used for the output when neither an output name nor an
    /// input file name is available.
    pub fn default_stem(self) -> &'static str {
        match self {
            Self::AddTextHeaderFooter => "excel_with_header_footer",
            Self::AddImageHeaderFooter => "excel_with_image_header_footer",
            Self::RemoveHeaderFooter => "excel_without_header_footer",
            Self::AddTextWatermark => "excel_with_watermark",
            Self::RemoveWatermark => "excel_without_watermark",
            Self::FindReplaceText => "excel_replaced",
            Self::UpdateRows => "excel_updated",
            Self::AddRows => "excel_with_rows",
            Self::ExtractRows => "excel_extracted_rows",
            Self::DeleteRows => "excel_without_rows",
            Self::DeleteWorksheet => "excel_without_worksheet",
            Self::ExtractWorksheet => "excel_extracted",
            Self::Secure => "excel_secured",
            Self::Unlock => "excel_unlocked",
            Self::MergeFiles => "merged-workbook",
            Self::MergeRows => "excel_merged_rows",
            Self::ParseCsv => "parsed_data",
        }
    }

    /// Output file name used when the caller does not set one.
    pub fn default_output_name(self) -> String {
        match self {
            Self::MergeFiles => self.default_stem().to_string(),
            Self::ParseCsv => format!("{}.json", self.default_stem()),
            _ => format!("{}.xlsx", self.default_stem()),
        }
    }

    /// Kind of input document, as named in error messages.
    pub fn input_label(self) -> &'static str {
        match self {
            Self::ParseCsv => "CSV",
            _ => "Excel",
        }
    }

    /// Input document name used when the caller does not set one.
    pub fn default_doc_name(self) -> &'static str {
        match self {
            Self::ParseCsv => "data.csv",
            _ => "myExcelFile.xlsx",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ExcelError;

    /// Accepts the display name, the slug, or the variant name, ignoring case.
    fn from_str(s: &str) -> ExcelResult<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| {
                op.name().eq_ignore_ascii_case(wanted)
                    || op.slug().eq_ignore_ascii_case(wanted)
                    || format!("{op:?}").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ExcelError::invalid(format!("Unsupported operation: {wanted}")))
    }
}
