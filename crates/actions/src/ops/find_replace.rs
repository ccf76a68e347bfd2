//! Find and replace text across a workbook.

use excelrelay_core::{opt_string_or_number, string_or_number, ExcelError, ExcelResult, Expectation};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{spreadsheet_output, submit_document};
use crate::item::{ItemOutput, WorkItem};
use crate::operation::Operation;
use crate::runner::Runner;

const INHERIT: &str = "Inherit";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FindReplaceOptions {
    phrases: PhraseList,
    #[serde(deserialize_with = "string_or_number")]
    culture_name: String,
}

impl Default for FindReplaceOptions {
    fn default() -> Self {
        Self {
            phrases: PhraseList::default(),
            culture_name: "en-US".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PhraseList {
    phrase_values: Vec<Phrase>,
}

/// One search/replace pair with its matching and formatting options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Phrase {
    #[serde(deserialize_with = "string_or_number")]
    search_text: String,
    /// Absent is an error; empty replaces with nothing.
    #[serde(deserialize_with = "opt_string_or_number")]
    replacement_text: Option<String>,
    is_expression: bool,
    match_entire_cell: bool,
    case_sensitive: bool,
    apply_formatting: bool,
    #[serde(deserialize_with = "string_or_number")]
    font_name: String,
    #[serde(deserialize_with = "string_or_number")]
    font_color: String,
    font_size: f64,
    #[serde(deserialize_with = "string_or_number")]
    bold: String,
    #[serde(deserialize_with = "string_or_number")]
    italic: String,
    #[serde(deserialize_with = "string_or_number")]
    strikethrough_type: String,
    #[serde(deserialize_with = "string_or_number")]
    underline_type: String,
    #[serde(deserialize_with = "string_or_number")]
    script_type: String,
    #[serde(deserialize_with = "string_or_number")]
    font_scheme_type: String,
    #[serde(deserialize_with = "string_or_number")]
    theme_colour: String,
}

impl Phrase {
    fn to_request(&self) -> ExcelResult<Value> {
        if self.search_text.is_empty() {
            return Err(ExcelError::invalid(
                "Search text is required for all replace operations",
            ));
        }
        let Some(replacement) = &self.replacement_text else {
            return Err(ExcelError::invalid(
                "Replacement text is required for all replace operations",
            ));
        };

        let mut phrase = json!({
            "SearchText": self.search_text,
            "ReplacementText": replacement,
            "IsExpression": self.is_expression,
            "MatchEntireCell": self.match_entire_cell,
            "CaseSensitive": self.case_sensitive,
        });
        if self.apply_formatting {
            phrase["Formatting"] = self.formatting();
        }
        Ok(phrase)
    }

    fn formatting(&self) -> Value {
        let mut formatting = Map::new();
        if !self.font_name.is_empty() {
            formatting.insert("FontName".into(), json!(self.font_name));
        }
        if !self.font_color.is_empty() {
            formatting.insert("FontColor".into(), json!(self.font_color));
        }
        if self.font_size > 0.0 {
            formatting.insert("FontSize".into(), json!(self.font_size));
        }
        for (key, value) in [
            ("Bold", &self.bold),
            ("Italic", &self.italic),
            ("StrikethroughType", &self.strikethrough_type),
            ("UnderlineType", &self.underline_type),
            ("ScriptType", &self.script_type),
            ("FontSchemeType", &self.font_scheme_type),
            ("ThemeColour", &self.theme_colour),
        ] {
            let value = if value.is_empty() { INHERIT } else { value.as_str() };
            formatting.insert(key.into(), json!(value));
        }
        Value::Object(formatting)
    }

    fn summary(&self) -> Value {
        json!({
            "searchText": self.search_text,
            "replacementText": self.replacement_text,
            "isExpression": self.is_expression,
            "matchEntireCell": self.match_entire_cell,
            "caseSensitive": self.case_sensitive,
            "formattingApplied": self.apply_formatting,
        })
    }
}

impl FindReplaceOptions {
    fn action(&self) -> ExcelResult<Value> {
        let values = &self.phrases.phrase_values;
        if values.is_empty() {
            return Err(ExcelError::invalid("At least one replace operation is required"));
        }
        let phrases = values
            .iter()
            .map(Phrase::to_request)
            .collect::<ExcelResult<Vec<_>>>()?;
        Ok(json!({
            "Phrases": phrases,
            "CultureName": self.culture_name,
        }))
    }
}

pub(crate) async fn run(runner: &Runner, item: &WorkItem) -> ExcelResult<ItemOutput> {
    let op = Operation::FindReplaceText;
    let options: FindReplaceOptions = item.params.parse()?;
    let action = options.action()?;

    let count = options.phrases.phrase_values.len();
    let details = json!({
        "operationsCount": count,
        "operations": options.phrases.phrase_values.iter().map(Phrase::summary).collect::<Vec<_>>(),
        "cultureName": options.culture_name,
    });

    let (source, raw) = submit_document(runner, op, item, action).await?;
    spreadsheet_output(op, item, &source, &raw, &Expectation::xlsx(), details, |_| {
        format!("Text replacement completed successfully with {count} operation(s)")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_support::{base64_item, offline_runner};
    use excelrelay_core::Params;

    fn options(phrases: Value) -> FindReplaceOptions {
        Params::new()
            .with("phrases", json!({ "phraseValues": phrases }))
            .parse()
            .unwrap()
    }

    #[test]
    fn test_phrase_without_formatting() {
        let action = options(json!([
            { "searchText": "2023", "replacementText": "2024", "caseSensitive": true }
        ]))
        .action()
        .unwrap();
        let phrase = &action["Phrases"][0];
        assert_eq!(phrase["SearchText"], "2023");
        assert_eq!(phrase["ReplacementText"], "2024");
        assert_eq!(phrase["CaseSensitive"], true);
        assert!(phrase.get("Formatting").is_none());
        assert_eq!(action["CultureName"], "en-US");
    }

    #[test]
    fn test_formatting_defaults_to_inherit() {
        let action = options(json!([{
            "searchText": "a",
            "replacementText": "",
            "applyFormatting": true,
            "fontColor": "#FF0000",
            "bold": "True",
        }]))
        .action()
        .unwrap();
        let formatting = &action["Phrases"][0]["Formatting"];
        assert_eq!(formatting["FontColor"], "#FF0000");
        assert_eq!(formatting["Bold"], "True");
        assert_eq!(formatting["Italic"], INHERIT);
        assert_eq!(formatting["ThemeColour"], INHERIT);
        assert!(formatting.get("FontName").is_none());
        assert!(formatting.get("FontSize").is_none());
    }

    #[test]
    fn test_validation_messages() {
        let err = options(json!([])).action().unwrap_err();
        assert_eq!(err.to_string(), "At least one replace operation is required");

        let err = options(json!([{ "replacementText": "x" }])).action().unwrap_err();
        assert_eq!(err.to_string(), "Search text is required for all replace operations");

        let err = options(json!([{ "searchText": "x" }])).action().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Replacement text is required for all replace operations"
        );
    }

    #[tokio::test]
    async fn test_run_validates_before_request() {
        let err = run(&offline_runner(), &base64_item(Params::new())).await.unwrap_err();
        assert_eq!(err.to_string(), "At least one replace operation is required");
    }
}
