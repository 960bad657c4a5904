use crate::error::{Error, Result};
use crate::protocol::ToolOutput;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Summary of the current page, as reported by `get-page-info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Any further fields the server reports (viewport, status, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageInfo {
    /// Read page info from a tool output
    ///
    /// Prefers `structuredContent` on the raw result, then falls back to the
    /// text payload parsed as JSON.
    pub(crate) fn from_output(output: &ToolOutput) -> Result<Self> {
        if let Some(structured) = output.raw.get("structuredContent") {
            return Ok(serde_json::from_value(structured.clone())?);
        }

        serde_json::from_str(&output.output).map_err(|e| {
            Error::ProtocolError(format!(
                "get-page-info returned non-JSON output ({}): {}",
                e, output.output
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(text: &str, raw: Value) -> ToolOutput {
        ToolOutput {
            output: text.to_string(),
            raw,
            images: Vec::new(),
        }
    }

    #[test]
    fn test_from_text_output() {
        let info = PageInfo::from_output(&output(
            r#"{"url":"https://example.com/","title":"Example","status":200}"#,
            json!({}),
        ))
        .unwrap();

        assert_eq!(info.url, "https://example.com/");
        assert_eq!(info.title, "Example");
        assert_eq!(info.extra["status"], 200);
    }

    #[test]
    fn test_structured_content_wins() {
        let info = PageInfo::from_output(&output(
            "Title: Example",
            json!({"structuredContent": {"url": "https://a.test/", "title": "A"}}),
        ))
        .unwrap();
        assert_eq!(info.title, "A");
    }

    #[test]
    fn test_non_json_output_is_protocol_error() {
        let err = PageInfo::from_output(&output("Title: Example", json!({}))).unwrap_err();
        assert!(matches!(err, Error::ProtocolError(_)));
    }
}
