// Tool results
//
// A `tools/call` result carries a `content` array of typed items plus an
// optional `isError` flag. `ToolOutcome::from_result` flattens that into a
// text payload, keeping the raw JSON around for callers that need more.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;

/// Image returned inline by a tool (e.g. a screenshot)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Successful tool output
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Text items of the content array joined with newlines
    pub output: String,
    /// The result object exactly as the server sent it
    pub raw: Value,
    /// Decoded image items, in order
    pub images: Vec<ToolImage>,
}

/// Normalized result of a completed tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(ToolOutput),
    Failure { message: String },
}

impl ToolOutcome {
    /// Normalize a `tools/call` result
    pub fn from_result(raw: Value) -> Self {
        let Some(content) = raw.get("content").and_then(Value::as_array) else {
            let output = match &raw {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            return ToolOutcome::Success(ToolOutput {
                output,
                raw,
                images: Vec::new(),
            });
        };

        let mut texts = Vec::new();
        let mut images = Vec::new();

        for item in content {
            match item.get("type").and_then(Value::as_str) {
                Some("text") => {
                    if let Some(text) = item.get("text").and_then(Value::as_str) {
                        texts.push(text);
                    }
                }
                Some("image") => match decode_image(item) {
                    Some(image) => images.push(image),
                    None => tracing::warn!("Skipping undecodable image item in tool result"),
                },
                other => {
                    tracing::debug!("Ignoring content item of type {:?}", other);
                }
            }
        }

        let output = texts.join("\n");

        if raw.get("isError").and_then(Value::as_bool).unwrap_or(false) {
            return ToolOutcome::Failure { message: output };
        }

        ToolOutcome::Success(ToolOutput {
            output,
            raw,
            images,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    /// Convert to a `Result`, turning `Failure` into `Error::ToolFailed`
    pub fn into_result(self, tool: &str) -> Result<ToolOutput> {
        match self {
            ToolOutcome::Success(output) => Ok(output),
            ToolOutcome::Failure { message } => Err(Error::ToolFailed {
                tool: tool.to_string(),
                message,
            }),
        }
    }
}

fn decode_image(item: &Value) -> Option<ToolImage> {
    let data = item.get("data").and_then(Value::as_str)?;
    let mime_type = item
        .get("mimeType")
        .and_then(Value::as_str)
        .unwrap_or("image/png")
        .to_string();

    BASE64
        .decode(data)
        .ok()
        .map(|data| ToolImage { mime_type, data })
}
