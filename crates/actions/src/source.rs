//! Input document acquisition.
//!
//! A document reaches an operation in one of three ways: as a named binary
//! attachment on the work item, as inline base64, or as a URL to download.
//! Whatever the route, the result is the base64 content for the envelope and
//! the best known original file name.

use std::time::Duration;

use excelrelay_core::{codec, opt_string_or_number, string_or_number, ExcelError, ExcelResult};
use regex::Regex;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::item::WorkItem;

fn filename_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"filename\*?\s*=\s*(?:"([^"]*)"|'([^']*)'|([^;\n]*))"#).expect("valid regex")
    })
}

/// How an input document is supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputKind {
    #[default]
    BinaryData,
    Base64,
    Url,
}

/// Input options shared by every single-document operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceOptions {
    pub input_data_type: InputKind,
    #[serde(deserialize_with = "string_or_number")]
    pub binary_property_name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub base64_content: String,
    #[serde(deserialize_with = "string_or_number")]
    pub url: String,
    /// Name reported to the API; replaced by a better one when the input
    /// route provides it.
    #[serde(deserialize_with = "opt_string_or_number")]
    pub doc_name: Option<String>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            input_data_type: InputKind::BinaryData,
            binary_property_name: "data".to_string(),
            base64_content: String::new(),
            url: String::new(),
            doc_name: None,
        }
    }
}

/// An acquired input, ready to go into an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Base64 of the whole file.
    pub content: String,
    pub file_name: String,
}

/// Raw content plus whatever file name the route revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub content: String,
    pub file_name: Option<String>,
}

/// Downloads inputs given by URL.
///
/// Uses its own HTTP client so credentials meant for the processing API are
/// never sent to third-party hosts.
#[derive(Debug, Clone)]
pub struct Downloader {
    http: Client,
}

impl Downloader {
    pub fn new(timeout: Duration) -> ExcelResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| ExcelError::Config(format!("failed to build download client: {e}")))?;
        Ok(Self { http })
    }

    /// GET `url`, returning the body and a file name from the response.
    pub async fn download(&self, url: &str) -> ExcelResult<(Vec<u8>, Option<String>)> {
        debug!(url, "downloading input");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ExcelError::input(format!("Failed to download file from URL: {e}")))?;

        let disposition_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);

        let body = response
            .bytes()
            .await
            .map_err(|e| ExcelError::input(format!("Failed to download file from URL: {e}")))?;

        Ok((body.to_vec(), disposition_name.or_else(|| filename_from_url(url))))
    }
}

/// Fetch content by `kind` from the item, the inline string, or a URL.
///
/// `label` names the input in error messages, e.g. `Image` or `File 2`.
pub async fn fetch(
    downloader: &Downloader,
    item: &WorkItem,
    kind: InputKind,
    binary_key: &str,
    base64: &str,
    url: &str,
    label: &str,
) -> ExcelResult<Fetched> {
    let fetched = match kind {
        InputKind::BinaryData => {
            let attachment = item.binary.get(binary_key).ok_or_else(|| {
                ExcelError::input(format!("No binary data found in property '{binary_key}'"))
            })?;
            Fetched {
                content: codec::encode(&attachment.data),
                file_name: attachment.file_name.clone(),
            }
        }
        InputKind::Base64 => Fetched {
            content: codec::strip_data_url(base64.trim()).to_string(),
            file_name: None,
        },
        InputKind::Url => {
            if url.trim().is_empty() {
                return Err(ExcelError::input(format!(
                    "{label} URL is required when using URL input type"
                )));
            }
            let (data, file_name) = downloader.download(url.trim()).await?;
            Fetched {
                content: codec::encode(&data),
                file_name,
            }
        }
    };

    if fetched.content.trim().is_empty() {
        return Err(ExcelError::input(format!("{label} content is required")));
    }
    Ok(fetched)
}

/// Acquire the primary document of an operation.
///
/// `label` names the kind of document in error messages, e.g. `Excel`.
pub async fn acquire(
    downloader: &Downloader,
    item: &WorkItem,
    options: &SourceOptions,
    default_doc_name: &str,
    label: &str,
) -> ExcelResult<SourceDocument> {
    let fetched = fetch(
        downloader,
        item,
        options.input_data_type,
        &options.binary_property_name,
        &options.base64_content,
        &options.url,
        label,
    )
    .await?;

    let doc_name = options
        .doc_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(default_doc_name);

    Ok(SourceDocument {
        content: fetched.content,
        file_name: fetched
            .file_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| doc_name.to_string()),
    })
}

/// File name from a `Content-Disposition` header value.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let caps = filename_regex().captures(header)?;
    let raw = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?
        .as_str()
        .trim();
    // RFC 5987 form: filename*=UTF-8''name%20here
    let name = match raw.split_once("''") {
        Some((_, encoded)) => urlencoding::decode(encoded)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| encoded.to_string()),
        None => raw.replace(['"', '\''], ""),
    };
    Some(name).filter(|n| !n.is_empty())
}

/// Last path segment of `url`, percent-decoded.
pub fn filename_from_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query.rsplit('/').next()?;
    if segment.is_empty() || segment.contains(':') {
        return None;
    }
    Some(
        urlencoding::decode(segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| segment.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Attachment;
    use excelrelay_core::Params;

    fn downloader() -> Downloader {
        Downloader::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_disposition_filename_forms() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="report 2024.xlsx""#).as_deref(),
            Some("report 2024.xlsx")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=plain.xlsx").as_deref(),
            Some("plain.xlsx")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename*=UTF-8''na%C3%AFve.xlsx").as_deref(),
            Some("naïve.xlsx")
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }

    #[test]
    fn test_url_filename() {
        assert_eq!(
            filename_from_url("https://files.example/a/My%20Book.xlsx?sig=1").as_deref(),
            Some("My Book.xlsx")
        );
        assert_eq!(filename_from_url("https://files.example/"), None);
    }

    #[tokio::test]
    async fn test_binary_attachment_name_overrides_doc_name() {
        let item = WorkItem::new(Params::new()).with_attachment(
            "data",
            Attachment::new(b"PK\x03\x04".to_vec()).with_file_name("sales.xlsx"),
        );
        let options = SourceOptions {
            doc_name: Some("ignored.xlsx".into()),
            ..SourceOptions::default()
        };
        let doc = acquire(&downloader(), &item, &options, "myExcelFile.xlsx", "Excel").await.unwrap();
        assert_eq!(doc.file_name, "sales.xlsx");
        assert_eq!(doc.content, codec::encode(b"PK\x03\x04"));
    }

    #[tokio::test]
    async fn test_missing_attachment() {
        let item = WorkItem::new(Params::new());
        let options = SourceOptions {
            binary_property_name: "sheet".into(),
            ..SourceOptions::default()
        };
        let err = acquire(&downloader(), &item, &options, "x.xlsx", "Excel").await.unwrap_err();
        assert_eq!(err.to_string(), "No binary data found in property 'sheet'");
    }

    #[tokio::test]
    async fn test_base64_data_url_is_stripped() {
        let item = WorkItem::new(Params::new());
        let options = SourceOptions {
            input_data_type: InputKind::Base64,
            base64_content: "data:application/vnd.ms-excel;base64,UEsDBA==".into(),
            doc_name: Some("in.xlsx".into()),
            ..SourceOptions::default()
        };
        let doc = acquire(&downloader(), &item, &options, "x.xlsx", "Excel").await.unwrap();
        assert_eq!(doc.content, "UEsDBA==");
        assert_eq!(doc.file_name, "in.xlsx");
    }

    #[tokio::test]
    async fn test_empty_inputs_rejected() {
        let item = WorkItem::new(Params::new());
        let base64 = SourceOptions {
            input_data_type: InputKind::Base64,
            ..SourceOptions::default()
        };
        let err = acquire(&downloader(), &item, &base64, "x.xlsx", "Excel").await.unwrap_err();
        assert_eq!(err.to_string(), "Excel content is required");

        let url = SourceOptions {
            input_data_type: InputKind::Url,
            ..SourceOptions::default()
        };
        let err = acquire(&downloader(), &item, &url, "x.xlsx", "Excel").await.unwrap_err();
        assert!(err.to_string().contains("URL is required"));
    }

    #[test]
    fn test_input_kind_names() {
        let kind: InputKind = serde_json::from_str(r#""binaryData""#).unwrap();
        assert_eq!(kind, InputKind::BinaryData);
        let kind: InputKind = serde_json::from_str(r#""url""#).unwrap();
        assert_eq!(kind, InputKind::Url);
    }
}
