//! sitewright: drive a subprocess browser-automation server from Rust
//!
//! The server is any executable that speaks newline-delimited JSON-RPC on
//! stdin/stdout and exposes browser tools (`navigate-to`, `get-text`, ...)
//! through `tools/call`. `ToolClient` launches it on first use, correlates
//! responses by id, and applies a timeout to every call.
//!
//! # Examples
//!
//! ## Navigate and read text
//!
//! ```ignore
//! use sitewright::{ClientOptions, ToolClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ToolClient::new(
//!         ClientOptions::new("node").args(["dist/server.js"]),
//!     );
//!
//!     client.launch_browser(None).await?;
//!     client.navigate_to("https://example.com/", None).await?;
//!
//!     let heading = client.get_text("h1").await?;
//!     assert_eq!(heading, "Example Domain");
//!
//!     let info = client.get_page_info().await?;
//!     println!("{} ({})", info.title, info.url);
//!
//!     client.close_browser().await?;
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Content checks and reports
//!
//! ```ignore
//! use sitewright::{ContentCheck, Report, ReportEntry, expect_text};
//!
//! let check = ContentCheck::new()
//!     .require("Example Domain")
//!     .forbid("Not Found");
//!
//! let mut report = Report::new("smoke");
//! match expect_text(&client, "body").to_satisfy(&check).await {
//!     Ok(_) => report.record(ReportEntry::passed("home page")),
//!     Err(e) => report.record(ReportEntry::failed("home page", e.to_string())),
//! }
//! report.write_html("target/reports/smoke.html").await?;
//! ```
//!
//! ## Calling any tool
//!
//! ```ignore
//! use serde_json::json;
//! use sitewright::ToolOutcome;
//!
//! match client.call_tool("hover-element", json!({"selector": "#menu"})).await? {
//!     ToolOutcome::Success(output) => println!("{}", output.output),
//!     ToolOutcome::Failure { message } => eprintln!("tool failed: {}", message),
//! }
//! ```

// Internal modules (exposed for integration tests)
#[doc(hidden)]
pub mod server;

pub mod api;
mod client;
mod content;
mod error;
pub mod protocol;
mod report;

/// Default timeout in milliseconds for tool calls and requests.
pub const DEFAULT_TIMEOUT_MS: f64 = 30000.0;

// Re-export error types
pub use error::{Error, Result};

// Re-export the client facade
pub use client::{PROTOCOL_VERSION, ToolClient, ToolDescriptor, tool_names};

// Re-export content checks
pub use content::{CheckResult, ContentCheck, TextExpectation, expect_text};

// Re-export reports
pub use report::{Report, ReportEntry, ReportStatus, Summary};

// Re-export configuration and launch options
pub use api::{BrowserKind, ClientOptions, LaunchOptions, ProxySettings, Viewport};

// Re-export tool options and results
pub use protocol::{
    ClickOptions, ElementState, FillOptions, MouseButton, NavigateOptions, PageInfo, Screenshot,
    ScreenshotOptions, ScreenshotType, ToolImage, ToolOutcome, ToolOutput, WaitForOptions,
    WaitUntil,
};
