// Error types for sitewright

use thiserror::Error;

/// Result type alias for sitewright operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when driving an automation server
#[derive(Debug, Error)]
pub enum Error {
    /// No automation server command was configured
    ///
    /// Set `SITEWRIGHT_SERVER_COMMAND` or build the options with
    /// `ClientOptions::new(command)`.
    #[error("Automation server not configured. Set SITEWRIGHT_SERVER_COMMAND")]
    ServerNotFound,

    /// Failed to launch the automation server process
    ///
    /// Common causes: the command is not on PATH, insufficient permissions,
    /// or the server exited during startup.
    #[error("Failed to launch automation server: {0}")]
    LaunchFailed(String),

    /// Transport-level error (stdio communication)
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Protocol-level error (malformed or unexpected JSON-RPC traffic)
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No response arrived for a request within its window
    ///
    /// The pending entry is dropped, so a late response for the same id is
    /// ignored.
    #[error("Timeout: '{method}' got no response after {elapsed_ms}ms")]
    Timeout { method: String, elapsed_ms: u64 },

    /// The server answered a request with an explicit error field
    ///
    /// `message` is the server's message, unmodified.
    #[error("{message}")]
    ToolError {
        method: String,
        message: String,
        code: Option<i64>,
    },

    /// The tool ran but reported failure in its result (`isError`)
    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// The server process exited (or was shut down) while the call was
    /// outstanding, or the client is closed
    ///
    /// Call `ToolClient::restart()` to launch a fresh process.
    #[error("Automation server closed (exit code: {})", fmt_exit_code(.exit_code))]
    ProcessClosed { exit_code: Option<i32> },

    /// Channel closed unexpectedly
    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    /// Invalid argument provided to method
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Content assertion did not pass before its timeout
    #[error("Assertion timeout: {0}")]
    AssertionTimeout(String),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

fn fmt_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }

    /// True when the error means the server process is gone
    pub fn is_closed(&self) -> bool {
        match self {
            Error::ProcessClosed { .. } | Error::ChannelClosed => true,
            Error::Context(_, inner) => inner.is_closed(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_names_method_and_elapsed() {
        let err = Error::Timeout {
            method: "tools/call".to_string(),
            elapsed_ms: 5000,
        };
        let msg = err.to_string();
        assert!(msg.contains("tools/call"));
        assert!(msg.contains("5000ms"));
    }

    #[test]
    fn test_tool_error_is_verbatim() {
        let err = Error::ToolError {
            method: "tools/call".to_string(),
            message: "No element matches selector '#missing'".to_string(),
            code: Some(-32000),
        };
        assert_eq!(err.to_string(), "No element matches selector '#missing'");
    }

    #[test]
    fn test_process_closed_mentions_exit_code() {
        let err = Error::ProcessClosed { exit_code: Some(3) };
        assert!(err.to_string().contains("exit code: 3"));
        assert!(err.is_closed());

        let err = Error::ProcessClosed { exit_code: None }.context("navigate-to");
        assert!(err.to_string().contains("exit code: none"));
        assert!(err.is_closed());
    }
}
