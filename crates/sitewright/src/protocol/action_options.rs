// Action options for the tool-call facade
//
// Provides configuration for navigate, click, fill, and wait-for-element.
// Each `to_json` fills in the default timeout so the server never has to guess.

use std::time::Duration;

/// When to consider navigation succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    /// The `load` event fired
    #[default]
    Load,
    /// The `DOMContentLoaded` event fired
    DomContentLoaded,
    /// No network connections for at least 500ms
    NetworkIdle,
}

impl WaitUntil {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle => "networkidle",
        }
    }
}

/// Navigation options for `navigate-to`
#[derive(Debug, Clone, Default)]
pub struct NavigateOptions {
    /// Navigation timeout
    pub timeout: Option<Duration>,
    /// When navigation counts as finished (default: load)
    pub wait_until: Option<WaitUntil>,
}

impl NavigateOptions {
    /// Creates new NavigateOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the wait_until option
    pub fn wait_until(mut self, wait_until: WaitUntil) -> Self {
        self.wait_until = Some(wait_until);
        self
    }

    pub(crate) fn timeout_ms(&self) -> f64 {
        self.timeout
            .map(|t| t.as_millis() as f64)
            .unwrap_or(crate::DEFAULT_TIMEOUT_MS)
    }

    pub(crate) fn to_json(&self, url: &str) -> serde_json::Value {
        serde_json::json!({
            "url": url,
            "waitUntil": self.wait_until.unwrap_or_default().as_str(),
            "timeout": self.timeout_ms(),
        })
    }
}

/// Mouse button for click actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

/// Click options for `click-element`
#[derive(Debug, Clone, Default)]
pub struct ClickOptions {
    /// Mouse button (default: left)
    pub button: Option<MouseButton>,
    /// Number of clicks (2 for a double click)
    pub click_count: Option<u32>,
    /// Maximum time in milliseconds
    pub timeout: Option<f64>,
}

impl ClickOptions {
    /// Create a new builder for ClickOptions
    pub fn builder() -> ClickOptionsBuilder {
        ClickOptionsBuilder::default()
    }

    pub(crate) fn timeout_ms(&self) -> f64 {
        self.timeout.unwrap_or(crate::DEFAULT_TIMEOUT_MS)
    }

    /// Convert options to the tool's argument object
    pub(crate) fn to_json(&self, selector: &str) -> serde_json::Value {
        let mut json = serde_json::json!({ "selector": selector });

        if let Some(button) = self.button {
            json["button"] = serde_json::json!(button.as_str());
        }

        if let Some(click_count) = self.click_count {
            json["clickCount"] = serde_json::json!(click_count);
        }

        json["timeout"] = serde_json::json!(self.timeout_ms());

        json
    }
}

/// Builder for ClickOptions
#[derive(Debug, Clone, Default)]
pub struct ClickOptionsBuilder {
    button: Option<MouseButton>,
    click_count: Option<u32>,
    timeout: Option<f64>,
}

impl ClickOptionsBuilder {
    /// Set the mouse button
    pub fn button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    /// Set the number of clicks
    pub fn click_count(mut self, click_count: u32) -> Self {
        self.click_count = Some(click_count);
        self
    }

    /// Set timeout in milliseconds
    pub fn timeout(mut self, timeout: f64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the ClickOptions
    pub fn build(self) -> ClickOptions {
        ClickOptions {
            button: self.button,
            click_count: self.click_count,
            timeout: self.timeout,
        }
    }
}

/// Fill options for `fill-input`
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// Maximum time in milliseconds
    pub timeout: Option<f64>,
}

impl FillOptions {
    /// Create a new builder for FillOptions
    pub fn builder() -> FillOptionsBuilder {
        FillOptionsBuilder::default()
    }

    pub(crate) fn timeout_ms(&self) -> f64 {
        self.timeout.unwrap_or(crate::DEFAULT_TIMEOUT_MS)
    }

    pub(crate) fn to_json(&self, selector: &str, value: &str) -> serde_json::Value {
        serde_json::json!({
            "selector": selector,
            "value": value,
            "timeout": self.timeout_ms(),
        })
    }
}

/// Builder for FillOptions
#[derive(Debug, Clone, Default)]
pub struct FillOptionsBuilder {
    timeout: Option<f64>,
}

impl FillOptionsBuilder {
    /// Set timeout in milliseconds
    pub fn timeout(mut self, timeout: f64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the FillOptions
    pub fn build(self) -> FillOptions {
        FillOptions {
            timeout: self.timeout,
        }
    }
}

/// Element state to wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementState {
    Attached,
    Detached,
    #[default]
    Visible,
    Hidden,
}

impl ElementState {
    fn as_str(&self) -> &'static str {
        match self {
            ElementState::Attached => "attached",
            ElementState::Detached => "detached",
            ElementState::Visible => "visible",
            ElementState::Hidden => "hidden",
        }
    }
}

/// Options for `wait-for-element`
#[derive(Debug, Clone, Default)]
pub struct WaitForOptions {
    /// State to wait for (default: visible)
    pub state: Option<ElementState>,
    /// Maximum time in milliseconds
    pub timeout: Option<f64>,
}

impl WaitForOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: ElementState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn timeout(mut self, timeout: f64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn timeout_ms(&self) -> f64 {
        self.timeout.unwrap_or(crate::DEFAULT_TIMEOUT_MS)
    }

    pub(crate) fn to_json(&self, selector: &str) -> serde_json::Value {
        serde_json::json!({
            "selector": selector,
            "state": self.state.unwrap_or_default().as_str(),
            "timeout": self.timeout_ms(),
        })
    }
}
