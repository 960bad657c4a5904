// Screenshot types and options
//
// Provides configuration for `take-screenshot`, page-wide or scoped to one element.

use serde::Serialize;
use std::path::PathBuf;

/// Screenshot image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotType {
    /// PNG format (lossless, supports transparency)
    Png,
    /// JPEG format (lossy compression, smaller file size)
    Jpeg,
}

/// Screenshot options
///
/// Use the builder pattern to construct options:
///
/// ```ignore
/// use sitewright::ScreenshotOptions;
///
/// let options = ScreenshotOptions::builder()
///     .path("reports/home.png")
///     .full_page(true)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScreenshotOptions {
    /// Where the server should write the image; omitted means inline data
    pub path: Option<PathBuf>,
    /// Capture full scrollable page
    pub full_page: Option<bool>,
    /// Capture only the element matching this selector
    pub selector: Option<String>,
    /// Image format (png or jpeg)
    pub screenshot_type: Option<ScreenshotType>,
    /// Screenshot timeout in milliseconds
    pub timeout: Option<f64>,
}

impl ScreenshotOptions {
    /// Create a new builder for ScreenshotOptions
    pub fn builder() -> ScreenshotOptionsBuilder {
        ScreenshotOptionsBuilder::default()
    }

    pub(crate) fn timeout_ms(&self) -> f64 {
        self.timeout.unwrap_or(crate::DEFAULT_TIMEOUT_MS)
    }

    /// Convert options to the tool's argument object
    pub(crate) fn to_json(&self) -> serde_json::Value {
        let mut json = serde_json::json!({});

        if let Some(path) = &self.path {
            json["path"] = serde_json::json!(path.to_string_lossy());
        }

        json["fullPage"] = serde_json::json!(self.full_page.unwrap_or(false));

        if let Some(selector) = &self.selector {
            json["selector"] = serde_json::json!(selector);
        }

        if let Some(screenshot_type) = self.screenshot_type {
            json["type"] = serde_json::json!(screenshot_type);
        }

        json["timeout"] = serde_json::json!(self.timeout_ms());

        json
    }
}

/// Builder for ScreenshotOptions
#[derive(Debug, Clone, Default)]
pub struct ScreenshotOptionsBuilder {
    path: Option<PathBuf>,
    full_page: Option<bool>,
    selector: Option<String>,
    screenshot_type: Option<ScreenshotType>,
    timeout: Option<f64>,
}

impl ScreenshotOptionsBuilder {
    /// Ask the server to save the image at this path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Capture full scrollable page beyond viewport
    pub fn full_page(mut self, full_page: bool) -> Self {
        self.full_page = Some(full_page);
        self
    }

    /// Capture a single element
    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Set the screenshot format (png or jpeg)
    pub fn screenshot_type(mut self, screenshot_type: ScreenshotType) -> Self {
        self.screenshot_type = Some(screenshot_type);
        self
    }

    /// Set screenshot timeout in milliseconds
    pub fn timeout(mut self, timeout: f64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the ScreenshotOptions
    pub fn build(self) -> ScreenshotOptions {
        ScreenshotOptions {
            path: self.path,
            full_page: self.full_page,
            selector: self.selector,
            screenshot_type: self.screenshot_type,
            timeout: self.timeout,
        }
    }
}

/// Result of `take-screenshot`
///
/// Servers either write the file and report its path, return the image
/// inline, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screenshot {
    pub path: Option<PathBuf>,
    pub data: Option<Vec<u8>>,
}
