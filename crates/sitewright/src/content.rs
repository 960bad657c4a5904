// Content checks - keyword and pattern checks over page text
//
// `ContentCheck` evaluates text synchronously; `expect_text` polls an element
// through the client until a check passes, in the style of auto-retrying
// test assertions.

use crate::client::ToolClient;
use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};
use std::time::{Duration, Instant};

/// Default timeout for text expectations (5 seconds)
const DEFAULT_EXPECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default polling interval for text expectations (100ms)
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
struct PatternCheck {
    source: String,
    sensitive: Regex,
    insensitive: Regex,
}

/// Keyword, pattern, and length requirements for a piece of text
///
/// Keyword matching ignores case unless `case_sensitive(true)` is set; the
/// same flag applies to patterns.
///
/// # Example
///
/// ```ignore
/// use sitewright::ContentCheck;
///
/// let check = ContentCheck::new()
///     .require("Example Domain")
///     .forbid("404")
///     .pattern(r"illustrative\s+examples")?
///     .min_length(20);
///
/// let result = check.evaluate(&page_text);
/// assert!(result.passed, "{}", result.summary());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContentCheck {
    required: Vec<String>,
    forbidden: Vec<String>,
    patterns: Vec<PatternCheck>,
    case_sensitive: bool,
    min_length: Option<usize>,
}

impl ContentCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text must contain `keyword`
    pub fn require(mut self, keyword: impl Into<String>) -> Self {
        self.required.push(keyword.into());
        self
    }

    /// Text must not contain `keyword`
    pub fn forbid(mut self, keyword: impl Into<String>) -> Self {
        self.forbidden.push(keyword.into());
        self
    }

    /// Text must match the regular expression `pattern`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if the pattern does not compile.
    pub fn pattern(mut self, pattern: &str) -> Result<Self> {
        let build = |case_insensitive: bool| {
            RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|e| Error::InvalidArgument(format!("Invalid regex '{}': {}", pattern, e)))
        };

        self.patterns.push(PatternCheck {
            source: pattern.to_string(),
            sensitive: build(false)?,
            insensitive: build(true)?,
        });
        Ok(self)
    }

    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    /// Text must be at least `chars` characters long (after trimming)
    pub fn min_length(mut self, chars: usize) -> Self {
        self.min_length = Some(chars);
        self
    }

    /// Check `text` against every requirement
    pub fn evaluate(&self, text: &str) -> CheckResult {
        let haystack = self.fold(text);
        let contains = |keyword: &str| haystack.contains(&self.fold(keyword));

        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|k| !contains(k.as_str()))
            .cloned()
            .collect();

        let forbidden_found: Vec<String> = self
            .forbidden
            .iter()
            .filter(|k| contains(k.as_str()))
            .cloned()
            .collect();

        let unmatched_patterns: Vec<String> = self
            .patterns
            .iter()
            .filter(|p| {
                let re = if self.case_sensitive {
                    &p.sensitive
                } else {
                    &p.insensitive
                };
                !re.is_match(text)
            })
            .map(|p| p.source.clone())
            .collect();

        let length = text.trim().chars().count();
        let too_short = self.min_length.filter(|min| length < *min).map(|min| (length, min));

        let passed = missing.is_empty()
            && forbidden_found.is_empty()
            && unmatched_patterns.is_empty()
            && too_short.is_none();

        CheckResult {
            passed,
            missing,
            forbidden_found,
            unmatched_patterns,
            too_short,
        }
    }

    fn fold(&self, text: &str) -> String {
        if self.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        }
    }
}

/// Outcome of `ContentCheck::evaluate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub passed: bool,
    /// Required keywords not found
    pub missing: Vec<String>,
    /// Forbidden keywords that were found
    pub forbidden_found: Vec<String>,
    /// Patterns that did not match
    pub unmatched_patterns: Vec<String>,
    /// `(actual, minimum)` character counts when the text is too short
    pub too_short: Option<(usize, usize)>,
}

impl CheckResult {
    /// One-line description of what failed
    pub fn summary(&self) -> String {
        if self.passed {
            return "all content checks passed".to_string();
        }

        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing {}", quote_list(&self.missing)));
        }
        if !self.forbidden_found.is_empty() {
            parts.push(format!("found forbidden {}", quote_list(&self.forbidden_found)));
        }
        if !self.unmatched_patterns.is_empty() {
            parts.push(format!("unmatched {}", quote_list(&self.unmatched_patterns)));
        }
        if let Some((actual, min)) = self.too_short {
            parts.push(format!("{} chars, expected at least {}", actual, min));
        }
        parts.join("; ")
    }
}

fn quote_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("'{}'", item))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Creates an expectation over the text of the element matching `selector`
///
/// The text is re-read until the check passes or the timeout (default:
/// 5 seconds) expires.
///
/// # Example
///
/// ```ignore
/// use sitewright::{ContentCheck, expect_text};
/// use std::time::Duration;
///
/// expect_text(&client, "h1").to_contain("Example Domain").await?;
///
/// let check = ContentCheck::new().require("Welcome").forbid("Error");
/// expect_text(&client, "#status")
///     .with_timeout(Duration::from_secs(10))
///     .to_satisfy(&check)
///     .await?;
/// ```
pub fn expect_text<'a>(client: &'a ToolClient, selector: &str) -> TextExpectation<'a> {
    TextExpectation {
        client,
        selector: selector.to_string(),
        timeout: DEFAULT_EXPECT_TIMEOUT,
        poll_interval: DEFAULT_POLL_INTERVAL,
    }
}

/// Auto-retrying expectation over an element's text
pub struct TextExpectation<'a> {
    client: &'a ToolClient,
    selector: String,
    timeout: Duration,
    poll_interval: Duration,
}

// to_* methods consume the expectation
#[allow(clippy::wrong_self_convention)]
impl TextExpectation<'_> {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Default is 100ms.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Asserts that the text contains `keyword` (case-insensitive)
    pub async fn to_contain(self, keyword: &str) -> Result<()> {
        let check = ContentCheck::new().require(keyword);
        self.to_satisfy(&check).await.map(|_| ())
    }

    /// Asserts that the text passes `check`
    ///
    /// Returns the final text on success.
    pub async fn to_satisfy(self, check: &ContentCheck) -> Result<String> {
        let start = Instant::now();

        loop {
            let last = match self.client.get_text(&self.selector).await {
                Ok(text) => {
                    let result = check.evaluate(&text);
                    if result.passed {
                        return Ok(text);
                    }
                    result.summary()
                }
                // A closed server will not recover while we poll
                Err(e) if e.is_closed() => return Err(e),
                Err(e) => {
                    tracing::debug!("get-text on '{}' failed while polling: {}", self.selector, e);
                    e.to_string()
                }
            };

            if start.elapsed() >= self.timeout {
                return Err(Error::AssertionTimeout(format!(
                    "Expected text of '{}' to pass content checks, but after {:?}: {}",
                    self.selector, self.timeout, last
                )));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
