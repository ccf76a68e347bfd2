//! Watermark operations.
//!
//! Worksheets are chosen with a numeric selector: `1` for all worksheets,
//! `2` for the listed names, `3` for the listed zero-based indexes. Both
//! lists are sent; the one not selected is empty.

use excelrelay_core::{string_or_number, ExcelError, ExcelResult, Expectation};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{spreadsheet_output, submit_document};
use crate::item::{ItemOutput, WorkItem};
use crate::operation::Operation;
use crate::output::{split_indexes, split_list};
use crate::runner::Runner;

const ALL_WORKSHEETS: u8 = 1;
const BY_NAME: u8 = 2;
const BY_INDEX: u8 = 3;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WorksheetTargets {
    worksheet_selection: u8,
    #[serde(deserialize_with = "string_or_number")]
    selected_worksheet_names: String,
    #[serde(deserialize_with = "string_or_number")]
    selected_worksheet_indexes: String,
}

impl Default for WorksheetTargets {
    fn default() -> Self {
        Self {
            worksheet_selection: ALL_WORKSHEETS,
            selected_worksheet_names: String::new(),
            selected_worksheet_indexes: String::new(),
        }
    }
}

impl WorksheetTargets {
    /// The `(names, indexes)` lists sent to the API.
    fn resolve(&self) -> ExcelResult<(Vec<String>, Vec<i64>)> {
        match self.worksheet_selection {
            ALL_WORKSHEETS => Ok((Vec::new(), Vec::new())),
            BY_NAME => Ok((split_list(&self.selected_worksheet_names), Vec::new())),
            BY_INDEX => Ok((Vec::new(), split_indexes(&self.selected_worksheet_indexes))),
            other => Err(ExcelError::invalid(format!(
                "Unsupported worksheet selection: {other}"
            ))),
        }
    }

    fn details(&self) -> Value {
        json!({
            "worksheetSelection": self.worksheet_selection,
            "selectedWorksheetNames": split_list(&self.selected_worksheet_names),
            "selectedWorksheetIndexes": split_indexes(&self.selected_worksheet_indexes),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AddWatermarkOptions {
    #[serde(deserialize_with = "string_or_number")]
    watermark_text: String,
    #[serde(deserialize_with = "string_or_number")]
    font_name: String,
    font_size: f64,
    #[serde(deserialize_with = "string_or_number")]
    font_color: String,
    /// Degrees, counter-clockwise.
    rotation: f64,
    opacity: f64,
    #[serde(flatten)]
    targets: WorksheetTargets,
}

impl Default for AddWatermarkOptions {
    fn default() -> Self {
        Self {
            watermark_text: String::new(),
            font_name: "Arial".into(),
            font_size: 48.0,
            font_color: "#C0C0C0".into(),
            rotation: -45.0,
            opacity: 0.5,
            targets: WorksheetTargets::default(),
        }
    }
}

impl AddWatermarkOptions {
    fn validate(&self) -> ExcelResult<()> {
        if self.watermark_text.trim().is_empty() {
            return Err(ExcelError::invalid("Watermark text is required"));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ExcelError::invalid("Opacity must be between 0 and 1"));
        }
        Ok(())
    }

    fn action(&self) -> ExcelResult<Value> {
        let (names, indexes) = self.targets.resolve()?;
        Ok(json!({
            "WatermarkText": self.watermark_text,
            "FontName": self.font_name,
            "FontSize": self.font_size,
            "FontColor": self.font_color,
            "Rotation": self.rotation,
            "Opacity": self.opacity,
            "worksheetNames": names,
            "worksheetIndexes": indexes,
        }))
    }

    fn details(&self) -> Value {
        let mut details = json!({
            "watermarkText": self.watermark_text,
            "fontName": self.font_name,
            "fontSize": self.font_size,
            "fontColor": self.font_color,
            "rotation": self.rotation,
            "opacity": self.opacity,
        });
        merge_into(&mut details, self.targets.details());
        details
    }
}

pub(crate) async fn add_text(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::AddTextWatermark;
    let options: AddWatermarkOptions = item.params.parse()?;
    options.validate()?;
    let (source, raw) = submit_document(runner, op, item, options.action()?).await?;
    spreadsheet_output(op, item, &source, &raw, &Expectation::xlsx(), options.details(), |_| {
        "Watermark added to Excel file successfully".to_string()
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RemoveWatermarkOptions {
    #[serde(deserialize_with = "string_or_number")]
    watermark_id: String,
    #[serde(deserialize_with = "string_or_number")]
    culture_name: String,
    #[serde(flatten)]
    targets: WorksheetTargets,
}

impl RemoveWatermarkOptions {
    fn action(&self) -> ExcelResult<Value> {
        let (names, indexes) = self.targets.resolve()?;
        Ok(json!({
            "watermarkId": self.watermark_id,
            "cultureName": self.culture_name,
            "worksheetNames": names,
            "worksheetIndexes": indexes,
        }))
    }

    fn details(&self) -> Value {
        let mut details = json!({
            "watermarkId": self.watermark_id,
            "cultureName": self.culture_name,
        });
        merge_into(&mut details, self.targets.details());
        details
    }
}

pub(crate) async fn remove(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::RemoveWatermark;
    let options: RemoveWatermarkOptions = item.params.parse()?;
    let (source, raw) = submit_document(runner, op, item, options.action()?).await?;
    spreadsheet_output(op, item, &source, &raw, &Expectation::xlsx(), options.details(), |_| {
        "Watermark removed from Excel file successfully".to_string()
    })
}

fn merge_into(target: &mut Value, extra: Value) {
    if let (Value::Object(target), Value::Object(extra)) = (target, extra) {
        target.extend(extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::{base64_item, offline_runner};
    use excelrelay_core::Params;

    #[test]
    fn test_targets_by_selection() {
        let params = Params::new()
            .with("selectedWorksheetNames", "Sheet1, Data")
            .with("selectedWorksheetIndexes", "0, 2, x");

        let all: RemoveWatermarkOptions = params.clone().parse().unwrap();
        let action = all.action().unwrap();
        assert_eq!(action["worksheetNames"], json!([]));
        assert_eq!(action["worksheetIndexes"], json!([]));

        let by_name: RemoveWatermarkOptions = params.clone().with("worksheetSelection", 2).parse().unwrap();
        assert_eq!(by_name.action().unwrap()["worksheetNames"], json!(["Sheet1", "Data"]));

        let by_index: RemoveWatermarkOptions = params.with("worksheetSelection", 3).parse().unwrap();
        let action = by_index.action().unwrap();
        assert_eq!(action["worksheetIndexes"], json!([0, 2]));
        assert_eq!(action["worksheetNames"], json!([]));
    }

    #[test]
    fn test_unknown_selection_rejected() {
        let options: RemoveWatermarkOptions = Params::new().with("worksheetSelection", 7).parse().unwrap();
        assert!(options.action().is_err());
    }

    #[test]
    fn test_remove_details() {
        let options: RemoveWatermarkOptions = Params::new()
            .with("watermarkId", "wm-1")
            .with("worksheetSelection", 2)
            .with("selectedWorksheetNames", "A")
            .parse()
            .unwrap();
        let details = options.details();
        assert_eq!(details["watermarkId"], "wm-1");
        assert_eq!(details["worksheetSelection"], 2);
        assert_eq!(details["selectedWorksheetNames"], json!(["A"]));
    }

    #[tokio::test]
    async fn test_watermark_text_required() {
        let err = add_text(&offline_runner(), &base64_item(Params::new())).await.unwrap_err();
        assert_eq!(err.to_string(), "Watermark text is required");
    }

    #[test]
    fn test_add_watermark_action() {
        let options: AddWatermarkOptions = Params::new()
            .with("watermarkText", "DRAFT")
            .with("opacity", 0.25)
            .parse()
            .unwrap();
        options.validate().unwrap();
        let action = options.action().unwrap();
        assert_eq!(action["WatermarkText"], "DRAFT");
        assert_eq!(action["Opacity"], 0.25);
        assert_eq!(action["Rotation"], -45.0);

        let too_opaque: AddWatermarkOptions = Params::new()
            .with("watermarkText", "DRAFT")
            .with("opacity", 2)
            .parse()
            .unwrap();
        assert!(too_opaque.validate().is_err());
    }
}
