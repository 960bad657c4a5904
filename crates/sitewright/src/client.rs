//! Tool-call facade over the automation server
//!
//! `ToolClient` owns one server process at a time. The process starts on the
//! first call, and every named convenience method funnels into a single
//! `tools/call` request. Calls are never retried.

use crate::api::{ClientOptions, LaunchOptions};
use crate::error::{Error, Result};
use crate::protocol::{
    ClickOptions, FillOptions, NavigateOptions, PageInfo, Screenshot, ScreenshotOptions,
    ToolOutcome, ToolOutput, WaitForOptions,
};
use crate::server::connection::Connection;
use crate::server::tool_server::ToolServer;
use crate::server::transport::LineTransport;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

/// Protocol revision announced in the handshake
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Names of the tools the automation server exposes
pub mod tool_names {
    pub const LAUNCH_BROWSER: &str = "launch-browser";
    pub const NAVIGATE_TO: &str = "navigate-to";
    pub const CLICK_ELEMENT: &str = "click-element";
    pub const FILL_INPUT: &str = "fill-input";
    pub const GET_TEXT: &str = "get-text";
    pub const TAKE_SCREENSHOT: &str = "take-screenshot";
    pub const WAIT_FOR_ELEMENT: &str = "wait-for-element";
    pub const EVALUATE_JAVASCRIPT: &str = "evaluate-javascript";
    pub const GET_PAGE_INFO: &str = "get-page-info";
    pub const CLOSE_BROWSER: &str = "close-browser";
}

const METHOD_INITIALIZE: &str = "initialize";
const METHOD_INITIALIZED: &str = "notifications/initialized";
const METHOD_TOOLS_CALL: &str = "tools/call";
const METHOD_TOOLS_LIST: &str = "tools/list";

// Slack between a tool's own timeout and the RPC timeout, so the tool
// reports its failure before the request is abandoned.
const TOOL_TIMEOUT_SLACK: Duration = Duration::from_secs(1);

// How long to wait for the process to exit after its stdout closes
const EXIT_WAIT: Duration = Duration::from_secs(5);

/// A tool advertised by `tools/list`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Option<Value>,
}

enum State {
    NotStarted,
    Running(Session),
    Closed { exit_code: Option<i32> },
}

struct Session {
    connection: Arc<Connection>,
    server_info: Value,
    shutdown_tx: Option<oneshot::Sender<()>>,
    supervisor: Option<JoinHandle<()>>,
}

impl Session {
    async fn start(options: &ClientOptions) -> Result<Self> {
        let mut server = ToolServer::launch(options).await?;
        let (stdin, stdout) = server.take_stdio()?;

        let (transport, message_rx) = LineTransport::new(stdin, stdout);
        let (sender, receiver) = transport.into_parts();
        let connection = Arc::new(
            Connection::new(sender, receiver, message_rx)
                .with_request_timeout(options.request_timeout),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let supervisor = tokio::spawn(supervise(Arc::clone(&connection), server, shutdown_rx));

        let mut session = Session {
            connection,
            server_info: Value::Null,
            shutdown_tx: Some(shutdown_tx),
            supervisor: Some(supervisor),
        };

        match handshake(&session.connection, options).await {
            Ok(info) => {
                session.server_info = info;
                Ok(session)
            }
            Err(e) => {
                session.shutdown().await;
                Err(e)
            }
        }
    }

    /// Stop the server (if we own it) and close the connection
    async fn shutdown(mut self) -> Option<i32> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(supervisor) = self.supervisor.take() {
            if tokio::time::timeout(EXIT_WAIT * 2, supervisor).await.is_err() {
                tracing::warn!("Supervisor did not finish after shutdown request");
            }
        }

        self.connection.close(None);
        self.connection.exit_code().flatten()
    }
}

/// Drive the connection and close it with the server's exit code
async fn supervise(
    connection: Arc<Connection>,
    mut server: ToolServer,
    shutdown_rx: oneshot::Receiver<()>,
) {
    let exit_code = tokio::select! {
        result = connection.run() => {
            if let Err(e) = result {
                tracing::error!("Connection loop failed: {}", e);
            }
            match tokio::time::timeout(EXIT_WAIT, server.wait_exit_code()).await {
                Ok(Ok(code)) => code,
                Ok(Err(e)) => {
                    tracing::warn!("Failed to reap automation server: {}", e);
                    None
                }
                Err(_) => {
                    tracing::warn!("Server closed stdout but kept running; killing it");
                    server.shutdown().await.unwrap_or_else(|e| {
                        tracing::warn!("Failed to shut down automation server: {}", e);
                        None
                    })
                }
            }
        }
        // Fires on an explicit close and when the client is dropped
        _ = shutdown_rx => {
            server.shutdown().await.unwrap_or_else(|e| {
                tracing::warn!("Failed to shut down automation server: {}", e);
                None
            })
        }
    };

    tracing::debug!("Automation server exited with code {:?}", exit_code);
    connection.close(exit_code);
}

async fn handshake(connection: &Connection, options: &ClientOptions) -> Result<Value> {
    let params = json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": options.client_name,
            "version": options.client_version,
        },
    });

    let info = connection
        .send_request(METHOD_INITIALIZE, params, options.handshake_timeout)
        .await
        .map_err(|e| e.context("Handshake with automation server failed"))?;

    connection.notify(METHOD_INITIALIZED, Value::Null).await?;

    tracing::debug!("Handshake complete: {}", info);
    Ok(info)
}

/// Client for a subprocess automation server
///
/// # Example
///
/// ```ignore
/// use sitewright::{ClientOptions, ToolClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ToolClient::new(ClientOptions::from_env()?);
///
///     client.launch_browser(None).await?;
///     client.navigate_to("https://example.com/", None).await?;
///     let heading = client.get_text("h1").await?;
///     assert_eq!(heading, "Example Domain");
///
///     client.close_browser().await?;
///     client.close().await?;
///     Ok(())
/// }
/// ```
pub struct ToolClient {
    options: ClientOptions,
    state: Mutex<State>,
}

impl ToolClient {
    /// Create a client; the server is launched by the first call
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            state: Mutex::new(State::NotStarted),
        }
    }

    /// Wrap an already-running connection and perform the handshake
    ///
    /// The caller drives `connection.run()`. Used to talk to servers that
    /// are not child processes, and by integration tests.
    #[doc(hidden)]
    pub async fn attach(connection: Arc<Connection>, options: ClientOptions) -> Result<Self> {
        let server_info = handshake(&connection, &options).await?;
        Ok(Self {
            options,
            state: Mutex::new(State::Running(Session {
                connection,
                server_info,
                shutdown_tx: None,
                supervisor: None,
            })),
        })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Launch the server now instead of on the first call
    pub async fn start(&self) -> Result<()> {
        self.connection().await.map(|_| ())
    }

    /// The `initialize` result, once the server is running
    pub async fn server_info(&self) -> Option<Value> {
        match &*self.state.lock().await {
            State::Running(session) => Some(session.server_info.clone()),
            _ => None,
        }
    }

    /// True once the server has exited or `close` was called
    pub async fn is_closed(&self) -> bool {
        match &*self.state.lock().await {
            State::Closed { .. } => true,
            State::Running(session) => session.connection.is_closed(),
            State::NotStarted => false,
        }
    }

    /// Shut down the server; further calls fail until `restart`
    pub async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let previous = std::mem::replace(&mut *state, State::Closed { exit_code: None });

        match previous {
            State::Running(session) => {
                let exit_code = session.shutdown().await;
                tracing::debug!("Client closed (server exit code {:?})", exit_code);
                *state = State::Closed { exit_code };
            }
            State::Closed { exit_code } => *state = State::Closed { exit_code },
            State::NotStarted => {}
        }

        Ok(())
    }

    /// Discard the current server (if any) and launch a fresh one
    pub async fn restart(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if let State::Running(session) = std::mem::replace(&mut *state, State::NotStarted) {
                session.shutdown().await;
            }
        }
        self.start().await
    }

    async fn connection(&self) -> Result<Arc<Connection>> {
        let mut state = self.state.lock().await;

        let exited = match &*state {
            State::Running(session) => session.connection.exit_code(),
            _ => None,
        };
        if let Some(exit_code) = exited {
            tracing::warn!("Automation server exited (code {:?})", exit_code);
            *state = State::Closed { exit_code };
        }

        match &*state {
            State::Running(session) => Ok(Arc::clone(&session.connection)),
            State::Closed { exit_code } => Err(Error::ProcessClosed {
                exit_code: *exit_code,
            }),
            State::NotStarted => {
                let session = Session::start(&self.options).await?;
                let connection = Arc::clone(&session.connection);
                *state = State::Running(session);
                Ok(connection)
            }
        }
    }

    /// List the tools the server offers
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let connection = self.connection().await?;
        let result = connection
            .send_request(METHOD_TOOLS_LIST, json!({}), self.options.request_timeout)
            .await?;

        let tools = result.get("tools").cloned().unwrap_or_else(|| json!([]));
        Ok(serde_json::from_value(tools)?)
    }

    /// Call a tool by name with the default request timeout
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutcome> {
        self.call_tool_with_timeout(name, arguments, self.options.request_timeout)
            .await
    }

    /// Call a tool by name
    ///
    /// Returns the normalized outcome; a tool that reports failure comes back
    /// as `ToolOutcome::Failure`, while protocol-level problems (timeout,
    /// error response, closed server) are `Err`.
    pub async fn call_tool_with_timeout(
        &self,
        name: &str,
        arguments: Value,
        timeout: Duration,
    ) -> Result<ToolOutcome> {
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "Tool name must not be empty".to_string(),
            ));
        }

        let arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments
        };

        let connection = self.connection().await?;
        tracing::debug!("Calling tool '{}'", name);

        let raw = connection
            .send_request(
                METHOD_TOOLS_CALL,
                json!({ "name": name, "arguments": arguments }),
                timeout,
            )
            .await
            .map_err(|e| attribute_to_tool(e, name))?;

        Ok(ToolOutcome::from_result(raw))
    }

    // Tools that take their own timeout get an RPC window that outlasts it
    async fn run_tool(
        &self,
        name: &str,
        arguments: Value,
        tool_timeout_ms: Option<f64>,
    ) -> Result<ToolOutput> {
        let timeout = match tool_timeout_ms {
            Some(ms) => self.rpc_timeout(ms),
            None => self.options.request_timeout,
        };
        self.call_tool_with_timeout(name, arguments, timeout)
            .await?
            .into_result(name)
    }

    fn rpc_timeout(&self, tool_timeout_ms: f64) -> Duration {
        let tool = Duration::from_millis(tool_timeout_ms.max(0.0) as u64) + TOOL_TIMEOUT_SLACK;
        tool.max(self.options.request_timeout)
    }

    /// Launch a browser in the automation server
    pub async fn launch_browser(&self, options: Option<LaunchOptions>) -> Result<ToolOutput> {
        let options = options.unwrap_or_default();
        self.run_tool(
            tool_names::LAUNCH_BROWSER,
            options.normalize()?,
            Some(options.timeout_ms()),
        )
        .await
    }

    /// Navigate the current page to an absolute URL
    ///
    /// The URL is validated but sent exactly as given.
    pub async fn navigate_to(
        &self,
        url: &str,
        options: Option<NavigateOptions>,
    ) -> Result<ToolOutput> {
        url::Url::parse(url)
            .map_err(|e| Error::InvalidArgument(format!("Invalid URL '{}': {}", url, e)))?;

        let options = options.unwrap_or_default();
        self.run_tool(
            tool_names::NAVIGATE_TO,
            options.to_json(url),
            Some(options.timeout_ms()),
        )
        .await
    }

    /// Click the first element matching `selector`
    pub async fn click_element(
        &self,
        selector: &str,
        options: Option<ClickOptions>,
    ) -> Result<ToolOutput> {
        check_selector(selector)?;
        let options = options.unwrap_or_default();
        self.run_tool(
            tool_names::CLICK_ELEMENT,
            options.to_json(selector),
            Some(options.timeout_ms()),
        )
        .await
    }

    /// Replace the value of the input matching `selector`
    pub async fn fill_input(
        &self,
        selector: &str,
        value: &str,
        options: Option<FillOptions>,
    ) -> Result<ToolOutput> {
        check_selector(selector)?;
        let options = options.unwrap_or_default();
        self.run_tool(
            tool_names::FILL_INPUT,
            options.to_json(selector, value),
            Some(options.timeout_ms()),
        )
        .await
    }

    /// Text content of the element matching `selector`
    pub async fn get_text(&self, selector: &str) -> Result<String> {
        check_selector(selector)?;
        let output = self
            .run_tool(tool_names::GET_TEXT, json!({ "selector": selector }), None)
            .await?;
        Ok(output.output)
    }

    /// Capture the page (or one element)
    pub async fn take_screenshot(&self, options: Option<ScreenshotOptions>) -> Result<Screenshot> {
        let options = options.unwrap_or_default();
        if let Some(selector) = &options.selector {
            check_selector(selector)?;
        }

        let output = self
            .run_tool(
                tool_names::TAKE_SCREENSHOT,
                options.to_json(),
                Some(options.timeout_ms()),
            )
            .await?;

        let data = output.images.into_iter().next().map(|image| image.data);
        if options.path.is_none() && data.is_none() {
            tracing::warn!("take-screenshot returned neither a file nor image data");
        }

        Ok(Screenshot {
            path: options.path,
            data,
        })
    }

    /// Wait until the element matching `selector` reaches a state
    pub async fn wait_for_element(
        &self,
        selector: &str,
        options: Option<WaitForOptions>,
    ) -> Result<ToolOutput> {
        check_selector(selector)?;
        let options = options.unwrap_or_default();
        self.run_tool(
            tool_names::WAIT_FOR_ELEMENT,
            options.to_json(selector),
            Some(options.timeout_ms()),
        )
        .await
    }

    /// Run a script in the page
    pub async fn evaluate_javascript(&self, script: &str) -> Result<ToolOutput> {
        if script.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "Script must not be empty".to_string(),
            ));
        }

        self.run_tool(
            tool_names::EVALUATE_JAVASCRIPT,
            json!({ "script": script }),
            None,
        )
        .await
    }

    /// Run a script and deserialize its result
    ///
    /// The output is read as JSON; output that is not JSON is treated as a
    /// plain string.
    pub async fn evaluate<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let output = self.evaluate_javascript(script).await?;

        let value = match output.raw.get("structuredContent") {
            Some(structured) => structured.clone(),
            None => serde_json::from_str(&output.output)
                .unwrap_or_else(|_| Value::String(output.output.clone())),
        };

        Ok(serde_json::from_value(value)?)
    }

    /// URL, title and whatever else the server reports about the page
    pub async fn get_page_info(&self) -> Result<PageInfo> {
        let output = self
            .run_tool(tool_names::GET_PAGE_INFO, json!({}), None)
            .await?;
        PageInfo::from_output(&output)
    }

    /// Close the browser (the server process keeps running)
    pub async fn close_browser(&self) -> Result<ToolOutput> {
        self.run_tool(tool_names::CLOSE_BROWSER, json!({}), None)
            .await
    }
}

fn check_selector(selector: &str) -> Result<()> {
    if selector.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "Selector must not be empty".to_string(),
        ));
    }
    Ok(())
}

// Errors from the connection name the RPC method; callers care about the tool
fn attribute_to_tool(error: Error, tool: &str) -> Error {
    match error {
        Error::Timeout { elapsed_ms, .. } => Error::Timeout {
            method: tool.to_string(),
            elapsed_ms,
        },
        Error::ToolError { message, code, .. } => Error::ToolError {
            method: tool.to_string(),
            message,
            code,
        },
        other => other,
    }
}
