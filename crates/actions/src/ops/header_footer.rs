//! Header and footer operations.

use excelrelay_core::{string_or_number, ExcelResult, Expectation};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{acquire, envelope, send, spreadsheet_output, submit_document};
use crate::item::{ItemOutput, WorkItem};
use crate::operation::Operation;
use crate::output::split_list;
use crate::runner::Runner;
use crate::source::{self, InputKind};

const BLACK: &str = "#000000";

/// Text, colour and size of one header or footer section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TextHeaderFooterOptions {
    #[serde(deserialize_with = "string_or_number")]
    header_left: String,
    #[serde(deserialize_with = "string_or_number")]
    header_center: String,
    #[serde(deserialize_with = "string_or_number")]
    header_right: String,
    #[serde(deserialize_with = "string_or_number")]
    footer_left: String,
    #[serde(deserialize_with = "string_or_number")]
    footer_center: String,
    #[serde(deserialize_with = "string_or_number")]
    footer_right: String,
    #[serde(deserialize_with = "string_or_number")]
    header_left_color: String,
    #[serde(deserialize_with = "string_or_number")]
    header_center_color: String,
    #[serde(deserialize_with = "string_or_number")]
    header_right_color: String,
    #[serde(deserialize_with = "string_or_number")]
    footer_left_color: String,
    #[serde(deserialize_with = "string_or_number")]
    footer_center_color: String,
    #[serde(deserialize_with = "string_or_number")]
    footer_right_color: String,
    header_left_font_size: f64,
    header_center_font_size: f64,
    header_right_font_size: f64,
    footer_left_font_size: f64,
    footer_center_font_size: f64,
    footer_right_font_size: f64,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_name: String,
    #[serde(deserialize_with = "string_or_number")]
    header_text: String,
    #[serde(deserialize_with = "string_or_number")]
    footer_text: String,
    #[serde(deserialize_with = "string_or_number")]
    header_alignment: String,
    #[serde(deserialize_with = "string_or_number")]
    footer_alignment: String,
    font_size: f64,
    #[serde(deserialize_with = "string_or_number")]
    font_color: String,
    apply_to_all_worksheets: bool,
}

impl Default for TextHeaderFooterOptions {
    fn default() -> Self {
        Self {
            header_left: String::new(),
            header_center: String::new(),
            header_right: String::new(),
            footer_left: String::new(),
            footer_center: String::new(),
            footer_right: String::new(),
            header_left_color: BLACK.into(),
            header_center_color: BLACK.into(),
            header_right_color: BLACK.into(),
            footer_left_color: BLACK.into(),
            footer_center_color: BLACK.into(),
            footer_right_color: BLACK.into(),
            header_left_font_size: 11.0,
            header_center_font_size: 11.0,
            header_right_font_size: 11.0,
            footer_left_font_size: 11.0,
            footer_center_font_size: 11.0,
            footer_right_font_size: 11.0,
            worksheet_name: "Sheet1".into(),
            header_text: String::new(),
            footer_text: String::new(),
            header_alignment: "center".into(),
            footer_alignment: "center".into(),
            font_size: 10.0,
            font_color: BLACK.into(),
            apply_to_all_worksheets: false,
        }
    }
}

impl TextHeaderFooterOptions {
    fn action(&self) -> Value {
        json!({
            "HeaderLeft": self.header_left,
            "HeaderCenter": self.header_center,
            "HeaderRight": self.header_right,
            "FooterLeft": self.footer_left,
            "FooterCenter": self.footer_center,
            "FooterRight": self.footer_right,
            "HeaderLeftColor": self.header_left_color,
            "HeaderLeftFontSize": self.header_left_font_size,
            "HeaderCenterColor": self.header_center_color,
            "HeaderCenterFontSize": self.header_center_font_size,
            "HeaderRightColor": self.header_right_color,
            "HeaderRightFontSize": self.header_right_font_size,
            "FooterLeftColor": self.footer_left_color,
            "FooterLeftFontSize": self.footer_left_font_size,
            "FooterCenterColor": self.footer_center_color,
            "FooterCenterFontSize": self.footer_center_font_size,
            "FooterRightColor": self.footer_right_color,
            "FooterRightFontSize": self.footer_right_font_size,
            "worksheetName": self.worksheet_name,
            "headerText": self.header_text,
            "footerText": self.footer_text,
            "headerAlignment": self.header_alignment,
            "footerAlignment": self.footer_alignment,
            "fontSize": self.font_size,
            "fontColor": self.font_color,
            "applyToAllWorksheets": self.apply_to_all_worksheets,
        })
    }

    fn details(&self) -> Value {
        json!({
            "headerLeft": self.header_left,
            "headerCenter": self.header_center,
            "headerRight": self.header_right,
            "footerLeft": self.footer_left,
            "footerCenter": self.footer_center,
            "footerRight": self.footer_right,
            "worksheetName": self.worksheet_name,
            "headerText": self.header_text,
            "footerText": self.footer_text,
            "headerAlignment": self.header_alignment,
            "footerAlignment": self.footer_alignment,
            "fontSize": self.font_size,
            "fontColor": self.font_color,
            "applyToAllWorksheets": self.apply_to_all_worksheets,
        })
    }
}

pub(crate) async fn add_text(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::AddTextHeaderFooter;
    let options: TextHeaderFooterOptions = item.params.parse()?;
    let (source, raw) = submit_document(runner, op, item, options.action()).await?;
    spreadsheet_output(op, item, &source, &raw, &Expectation::xlsx(), options.details(), |_| {
        "Header and footer added to Excel file successfully".to_string()
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ImageHeaderFooterOptions {
    image_input_type: InputKind,
    #[serde(deserialize_with = "string_or_number")]
    image_binary_property_name: String,
    #[serde(deserialize_with = "string_or_number")]
    image_base64_content: String,
    #[serde(deserialize_with = "string_or_number")]
    image_url: String,
    is_header: bool,
    /// `Left`, `Center` or `Right`.
    #[serde(deserialize_with = "string_or_number")]
    position: String,
    /// Comma-separated.
    #[serde(deserialize_with = "string_or_number")]
    worksheet_names: String,
    top_margin: f64,
    bottom_margin: f64,
    left_margin: f64,
    right_margin: f64,
}

impl Default for ImageHeaderFooterOptions {
    fn default() -> Self {
        Self {
            image_input_type: InputKind::BinaryData,
            image_binary_property_name: "image".into(),
            image_base64_content: String::new(),
            image_url: String::new(),
            is_header: true,
            position: "Center".into(),
            worksheet_names: "Sheet1".into(),
            top_margin: 1.9,
            bottom_margin: 1.9,
            left_margin: 1.9,
            right_margin: 1.9,
        }
    }
}

impl ImageHeaderFooterOptions {
    fn action(&self) -> Value {
        json!({
            "IsHeader": self.is_header,
            "Position": self.position,
            "WorksheetNames": split_list(&self.worksheet_names),
            "TopMargin": self.top_margin,
            "bottomMargin": self.bottom_margin,
            "LeftMargin": self.left_margin,
            "RightMargin": self.right_margin,
        })
    }

    fn details(&self) -> Value {
        json!({
            "isHeader": self.is_header,
            "position": self.position,
            "worksheetNames": split_list(&self.worksheet_names),
            "topMargin": self.top_margin,
            "bottomMargin": self.bottom_margin,
            "leftMargin": self.left_margin,
            "rightMargin": self.right_margin,
        })
    }
}

pub(crate) async fn add_image(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::AddImageHeaderFooter;
    let options: ImageHeaderFooterOptions = item.params.parse()?;

    let document = acquire(runner, op, item).await?;
    let image = source::fetch(
        runner.downloader(),
        item,
        options.image_input_type,
        &options.image_binary_property_name,
        &options.image_base64_content,
        &options.image_url,
        "Image",
    )
    .await?;

    let request = envelope(op, &document, options.action())?.with_field("imageContent", image.content);
    let raw = send(runner, op, &request).await?;
    spreadsheet_output(op, item, &document, &raw, &Expectation::xlsx(), options.details(), |_| {
        "Image header/footer added to Excel file successfully".to_string()
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RemoveHeaderFooterOptions {
    remove_header_left: bool,
    remove_header_center: bool,
    remove_header_right: bool,
    remove_footer_left: bool,
    remove_footer_center: bool,
    remove_footer_right: bool,
    #[serde(deserialize_with = "string_or_number")]
    worksheet_name: String,
    apply_to_all_worksheets: bool,
}

impl Default for RemoveHeaderFooterOptions {
    fn default() -> Self {
        Self {
            remove_header_left: false,
            remove_header_center: false,
            remove_header_right: false,
            remove_footer_left: false,
            remove_footer_center: false,
            remove_footer_right: false,
            worksheet_name: "Sheet1".into(),
            apply_to_all_worksheets: false,
        }
    }
}

impl RemoveHeaderFooterOptions {
    fn action(&self) -> Value {
        json!({
            "worksheetName": self.worksheet_name,
            "RemoveHeaderLeft": self.remove_header_left,
            "RemoveHeaderCenter": self.remove_header_center,
            "RemoveHeaderRight": self.remove_header_right,
            "RemoveFooterLeft": self.remove_footer_left,
            "RemoveFooterCenter": self.remove_footer_center,
            "RemoveFooterRight": self.remove_footer_right,
            "applyToAllWorksheets": self.apply_to_all_worksheets,
        })
    }

    fn details(&self) -> Value {
        json!({
            "removeHeaderLeft": self.remove_header_left,
            "removeHeaderCenter": self.remove_header_center,
            "removeHeaderRight": self.remove_header_right,
            "removeFooterLeft": self.remove_footer_left,
            "removeFooterCenter": self.remove_footer_center,
            "removeFooterRight": self.remove_footer_right,
            "worksheetName": self.worksheet_name,
            "applyToAllWorksheets": self.apply_to_all_worksheets,
        })
    }
}

pub(crate) async fn remove(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::RemoveHeaderFooter;
    let options: RemoveHeaderFooterOptions = item.params.parse()?;
    let (source, raw) = submit_document(runner, op, item, options.action()).await?;
    spreadsheet_output(op, item, &source, &raw, &Expectation::xlsx(), options.details(), |_| {
        "Header and footer removed from Excel file successfully".to_string()
    })
}
