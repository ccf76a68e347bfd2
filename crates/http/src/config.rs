//! Client configuration.

use std::time::Duration;

use excelrelay_core::{ExcelError, ExcelResult};

pub const DEFAULT_BASE_URL: &str = "https://api.pdf4me.com";
pub const DEFAULT_INITIAL_TIMEOUT: Duration = Duration::from_secs(1000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 9000;

/// Endpoint path fragments whose success bodies are JSON data rather than files.
pub const JSON_ENDPOINT_MARKERS: &[&str] = &[
    "/CreateImages",
    "/CreateImagesFromPdf",
    "/GetImageMetadata",
    "/ProcessInvoice",
    "/ProcessHealthCard",
    "/ProcessContract",
    "/ParseDocument",
    "/ClassifyDocument",
    "/GetTrackingChangesInWord",
    "/ExtractResources",
    "/ExtractPdfFormData",
    "/GetPdfMetadata",
    "/ExtractTextByExpression",
    "/ExtractAttachmentFromPdf",
    "/ExtractTableFromPdf",
    "/ApiV2Excel/",
];

/// Settings shared by the transport client and the poller.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Timeout applied to the initial submit and to each poll request.
    pub initial_timeout: Duration,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    /// Headers sent on every request, e.g. the host-provided `Authorization`.
    pub default_headers: Vec<(String, String)>,
    pub json_endpoints: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            initial_timeout: DEFAULT_INITIAL_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            default_headers: Vec::new(),
            json_endpoints: JSON_ENDPOINT_MARKERS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_initial_timeout(mut self, timeout: Duration) -> Self {
        self.initial_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Attach the host credential as the `Authorization` header, verbatim.
    #[must_use]
    pub fn with_api_key(self, key: impl Into<String>) -> Self {
        self.with_header("Authorization", key)
    }

    /// Read settings from `EXCELRELAY_*` environment variables over the defaults.
    pub fn from_env() -> ExcelResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> ExcelResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("EXCELRELAY_BASE_URL").filter(|v| !v.is_empty()) {
            config.base_url = url;
        }
        if let Some(key) = lookup("EXCELRELAY_API_KEY").filter(|v| !v.is_empty()) {
            config = config.with_api_key(key);
        }
        if let Some(secs) = lookup("EXCELRELAY_POLL_INTERVAL_SECS") {
            let secs: u64 = parse_number("EXCELRELAY_POLL_INTERVAL_SECS", &secs)?;
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = lookup("EXCELRELAY_MAX_POLL_ATTEMPTS") {
            config.max_poll_attempts = parse_number("EXCELRELAY_MAX_POLL_ATTEMPTS", &attempts)?;
        }
        Ok(config)
    }

    /// Whether responses from `path` carry JSON data.
    pub fn is_json_endpoint(&self, path: &str) -> bool {
        self.json_endpoints.iter().any(|marker| path.contains(marker.as_str()))
    }

    /// Absolute URL for an endpoint-relative path.
    pub fn endpoint_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ExcelResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ExcelError::Config(format!("{key} must be a non-negative integer, got '{value}'")))
}
