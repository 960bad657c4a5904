// Run reports
//
// Collects per-check results for a suite and renders them as JSON or as a
// self-contained HTML page.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of one reported check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Passed,
    Failed,
    Skipped,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// One line of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl ReportEntry {
    pub fn new(name: impl Into<String>, status: ReportStatus) -> Self {
        Self {
            name: name.into(),
            url: None,
            status,
            message: None,
            duration_ms: 0,
            screenshot: None,
        }
    }

    pub fn passed(name: impl Into<String>) -> Self {
        Self::new(name, ReportStatus::Passed)
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, ReportStatus::Failed).message(message)
    }

    pub fn skipped(name: impl Into<String>) -> Self {
        Self::new(name, ReportStatus::Skipped)
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    pub fn screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot = Some(path.into());
        self
    }
}

/// Counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Results of a suite run
///
/// # Example
///
/// ```ignore
/// use sitewright::{Report, ReportEntry};
///
/// let mut report = Report::new("smoke");
/// report.record(ReportEntry::passed("home page").url("https://example.com/"));
/// report.record(ReportEntry::failed("pricing", "missing 'pricing'"));
///
/// report.write_html("target/reports/smoke.html").await?;
/// assert_eq!(report.summary().failed, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub suite: String,
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, entry: ReportEntry) {
        tracing::debug!(
            "Report '{}': {} {}",
            self.suite,
            entry.status.as_str(),
            entry.name
        );
        self.entries.push(entry);
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.entries.len(),
            ..Summary::default()
        };
        for entry in &self.entries {
            match entry.status {
                ReportStatus::Passed => summary.passed += 1,
                ReportStatus::Failed => summary.failed += 1,
                ReportStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    /// True when nothing failed
    pub fn is_success(&self) -> bool {
        self.summary().failed == 0
    }

    pub fn to_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Document<'a> {
            suite: &'a str,
            summary: Summary,
            entries: &'a [ReportEntry],
        }

        Ok(serde_json::to_string_pretty(&Document {
            suite: &self.suite,
            summary: self.summary(),
            entries: &self.entries,
        })?)
    }

    pub fn to_html(&self) -> String {
        let summary = self.summary();
        let suite = escape_html(&self.suite);

        let mut html = String::new();
        let _ = writeln!(html, "<!DOCTYPE html>");
        let _ = writeln!(html, "<html lang=\"en\">");
        let _ = writeln!(html, "<head>");
        let _ = writeln!(html, "<meta charset=\"utf-8\">");
        let _ = writeln!(html, "<title>{}</title>", suite);
        let _ = writeln!(html, "<style>{}</style>", STYLE);
        let _ = writeln!(html, "</head>");
        let _ = writeln!(html, "<body>");
        let _ = writeln!(html, "<h1>{}</h1>", suite);
        let _ = writeln!(
            html,
            "<p class=\"summary\">{} passed, {} failed, {} skipped ({} total)</p>",
            summary.passed, summary.failed, summary.skipped, summary.total
        );
        let _ = writeln!(html, "<table>");
        let _ = writeln!(
            html,
            "<tr><th>Check</th><th>URL</th><th>Status</th><th>Duration</th><th>Message</th><th>Screenshot</th></tr>"
        );

        for entry in &self.entries {
            let url = entry.url.as_deref().map(escape_html).unwrap_or_default();
            let message = entry.message.as_deref().map(escape_html).unwrap_or_default();
            let screenshot = entry
                .screenshot
                .as_ref()
                .map(|path| {
                    let path = escape_html(&path.to_string_lossy());
                    format!("<a href=\"{}\">{}</a>", path, path)
                })
                .unwrap_or_default();

            let _ = writeln!(
                html,
                "<tr class=\"{status}\"><td>{}</td><td>{}</td><td>{status}</td><td>{} ms</td><td>{}</td><td>{}</td></tr>",
                escape_html(&entry.name),
                url,
                entry.duration_ms,
                message,
                screenshot,
                status = entry.status.as_str(),
            );
        }

        let _ = writeln!(html, "</table>");
        let _ = writeln!(html, "</body>");
        let _ = writeln!(html, "</html>");
        html
    }

    /// Write `to_html()` to `path`, creating parent directories
    pub async fn write_html(&self, path: impl AsRef<Path>) -> Result<()> {
        write_file(path.as_ref(), self.to_html()).await
    }

    /// Write `to_json()` to `path`, creating parent directories
    pub async fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        write_file(path.as_ref(), self.to_json()?).await
    }
}

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:left}\
tr.passed td:nth-child(3){color:#1a7f37}\
tr.failed td:nth-child(3){color:#cf222e}\
tr.skipped td:nth-child(3){color:#9a6700}";

async fn write_file(path: &Path, contents: String) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    tracing::debug!("Wrote report to {}", path.display());
    Ok(())
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
