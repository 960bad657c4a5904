//! ToolClient against an in-memory automation server
//!
//! The server side is scripted with `TestPipes::serve`, so these tests cover
//! the facade's argument shapes and result mapping without launching a
//! process.

use serde_json::{Value, json};
use sitewright::server::connection::Connection;
use sitewright::{
    ClickOptions, ClientOptions, ContentCheck, Error, MouseButton, ScreenshotOptions, ToolClient,
    ToolOutcome, expect_text, tool_names,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;

fn options() -> ClientOptions {
    ClientOptions::new("in-memory")
        .request_timeout(Duration::from_secs(5))
        .handshake_timeout(Duration::from_secs(5))
        .client_info("sitewright-tests", "0.0.1")
}

fn initialize_result() -> Value {
    json!({
        "result": {
            "protocolVersion": "2024-11-05",
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "mock-browser-tools", "version": "1.0.0"}
        }
    })
}

/// Serve tools/call with `tools`; initialize is always answered
fn serve<F>(tools: F) -> Arc<Connection>
where
    F: Fn(&str, &Value) -> Option<Value> + Send + 'static,
{
    common::connect(Duration::from_secs(5)).serve(move |request| {
        match request["method"].as_str() {
            Some("initialize") => Some(initialize_result()),
            Some("tools/call") => {
                let name = request["params"]["name"].as_str().unwrap_or_default();
                tools(name, &request["params"]["arguments"])
            }
            Some("tools/list") => Some(json!({
                "result": {"tools": [
                    {"name": "navigate-to", "description": "Open a URL"},
                    {"name": "get-text", "inputSchema": {"type": "object"}}
                ]}
            })),
            _ => Some(json!({"error": {"code": -32601, "message": "Method not found"}})),
        }
    })
}

#[tokio::test]
async fn test_handshake_then_initialized_notification() {
    common::init_tracing();
    let mut pipes = common::connect(Duration::from_secs(5));

    let connection = Arc::clone(&pipes.connection);
    let attach = tokio::spawn(async move { ToolClient::attach(connection, options()).await });

    let initialize = pipes.read_message().await;
    assert_eq!(initialize["method"], "initialize");
    assert_eq!(initialize["id"], 1);
    assert_eq!(initialize["params"]["protocolVersion"], "2024-11-05");
    assert_eq!(initialize["params"]["clientInfo"]["name"], "sitewright-tests");
    assert_eq!(initialize["params"]["clientInfo"]["version"], "0.0.1");

    let mut response = initialize_result();
    response["jsonrpc"] = json!("2.0");
    response["id"] = json!(1);
    pipes.write_message(&response).await;

    let initialized = pipes.read_message().await;
    assert_eq!(initialized["method"], "notifications/initialized");
    assert!(initialized.get("id").is_none());

    let client = attach.await.unwrap().unwrap();
    let info = client.server_info().await.unwrap();
    assert_eq!(info["serverInfo"]["name"], "mock-browser-tools");
    assert!(!client.is_closed().await);
}

#[tokio::test]
async fn test_named_tools_send_expected_arguments() {
    common::init_tracing();
    let calls: Arc<Mutex<Vec<(String, Value)>>> = Arc::default();
    let recorded = Arc::clone(&calls);

    let connection = serve(move |name, arguments| {
        recorded
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        Some(common::text_result(match name {
            "get-text" => "Example Domain",
            _ => "ok",
        }))
    });
    let client = ToolClient::attach(connection, options()).await.unwrap();

    client.launch_browser(None).await.unwrap();
    client.navigate_to("https://example.com", None).await.unwrap();
    client
        .click_element(
            "#more",
            Some(ClickOptions::builder().button(MouseButton::Right).build()),
        )
        .await
        .unwrap();
    client.fill_input("#q", "rust", None).await.unwrap();
    assert_eq!(client.get_text("h1").await.unwrap(), "Example Domain");
    client.close_browser().await.unwrap();

    let calls = calls.lock().unwrap();
    let names: Vec<&str> = calls.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            tool_names::LAUNCH_BROWSER,
            tool_names::NAVIGATE_TO,
            tool_names::CLICK_ELEMENT,
            tool_names::FILL_INPUT,
            tool_names::GET_TEXT,
            tool_names::CLOSE_BROWSER,
        ]
    );

    assert_eq!(calls[0].1["browser"], "chromium");
    assert_eq!(calls[0].1["headless"], true);
    assert_eq!(calls[1].1["url"], "https://example.com");
    assert_eq!(calls[1].1["waitUntil"], "load");
    assert_eq!(calls[2].1["selector"], "#more");
    assert_eq!(calls[2].1["button"], "right");
    assert_eq!(calls[3].1, json!({"selector": "#q", "value": "rust", "timeout": 30000.0}));
    assert_eq!(calls[4].1, json!({"selector": "h1"}));
}

#[tokio::test]
async fn test_navigate_sends_url_as_given() {
    common::init_tracing();
    let urls: Arc<Mutex<Vec<Value>>> = Arc::default();
    let recorded = Arc::clone(&urls);

    let connection = serve(move |_, arguments| {
        recorded.lock().unwrap().push(arguments["url"].clone());
        Some(common::text_result("ok"))
    });
    let client = ToolClient::attach(connection, options()).await.unwrap();

    client
        .navigate_to("https://EXAMPLE.com:443/Docs", None)
        .await
        .unwrap();
    assert!(matches!(
        client.navigate_to("example.com/docs", None).await,
        Err(Error::InvalidArgument(_))
    ));

    // Only the valid URL reached the server, unchanged
    assert_eq!(*urls.lock().unwrap(), vec![json!("https://EXAMPLE.com:443/Docs")]);
}

#[tokio::test]
async fn test_tool_failure_is_an_outcome_not_an_error() {
    common::init_tracing();
    let connection = serve(|_, _| {
        Some(json!({
            "result": {
                "content": [{"type": "text", "text": "No element matches selector '#missing'"}],
                "isError": true
            }
        }))
    });
    let client = ToolClient::attach(connection, options()).await.unwrap();

    let outcome = client
        .call_tool("get-text", json!({"selector": "#missing"}))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ToolOutcome::Failure {
            message: "No element matches selector '#missing'".to_string()
        }
    );

    // Named methods surface the failure as an error
    match client.get_text("#missing").await {
        Err(Error::ToolFailed { tool, message }) => {
            assert_eq!(tool, "get-text");
            assert!(message.contains("#missing"));
        }
        other => panic!("expected ToolFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_response_names_the_tool() {
    common::init_tracing();
    let connection = serve(|name, _| {
        Some(json!({"error": {"code": -32602, "message": format!("Unknown tool: {}", name)}}))
    });
    let client = ToolClient::attach(connection, options()).await.unwrap();

    match client.call_tool("hover-element", Value::Null).await {
        Err(Error::ToolError {
            method,
            message,
            code,
        }) => {
            assert_eq!(method, "hover-element");
            assert_eq!(message, "Unknown tool: hover-element");
            assert_eq!(code, Some(-32602));
        }
        other => panic!("expected ToolError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_names_the_tool() {
    common::init_tracing();
    let connection = serve(|name, _| match name {
        "slow-tool" => None,
        _ => Some(common::text_result("fast")),
    });
    let client = ToolClient::attach(connection, options()).await.unwrap();

    let err = client
        .call_tool_with_timeout("slow-tool", json!({}), Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { ref method, .. } if method == "slow-tool"));

    // The client stays usable
    let outcome = client.call_tool("fast-tool", json!({})).await.unwrap();
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_screenshot_evaluate_and_page_info() {
    common::init_tracing();
    let connection = serve(|name, arguments| match name {
        "take-screenshot" => {
            assert_eq!(arguments["fullPage"], true);
            Some(json!({
                "result": {"content": [
                    {"type": "text", "text": "Captured"},
                    {"type": "image", "mimeType": "image/png", "data": "iVBORw=="}
                ]}
            }))
        }
        "evaluate-javascript" => Some(common::text_result("42")),
        "get-page-info" => Some(json!({
            "result": {
                "content": [{"type": "text", "text": "Example Domain"}],
                "structuredContent": {"url": "https://example.com/", "title": "Example Domain"}
            }
        })),
        _ => None,
    });
    let client = ToolClient::attach(connection, options()).await.unwrap();

    let screenshot = client
        .take_screenshot(Some(ScreenshotOptions::builder().full_page(true).build()))
        .await
        .unwrap();
    assert_eq!(screenshot.data, Some(vec![0x89, b'P', b'N', b'G']));
    assert!(screenshot.path.is_none());

    let answer: u32 = client.evaluate("6 * 7").await.unwrap();
    assert_eq!(answer, 42);

    let info = client.get_page_info().await.unwrap();
    assert_eq!(info.url, "https://example.com/");
    assert_eq!(info.title, "Example Domain");
}

#[tokio::test]
async fn test_list_tools() {
    common::init_tracing();
    let client = ToolClient::attach(serve(|_, _| None), options())
        .await
        .unwrap();

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].name, "navigate-to");
    assert_eq!(tools[0].description.as_deref(), Some("Open a URL"));
    assert!(tools[1].input_schema.is_some());
}

#[tokio::test]
async fn test_expect_text_polls_until_content_appears() {
    common::init_tracing();
    let reads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reads);

    let connection = serve(move |_, _| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Some(common::text_result(if n < 2 {
            "Loading..."
        } else {
            "Welcome back"
        }))
    });
    let client = ToolClient::attach(connection, options()).await.unwrap();

    expect_text(&client, "#status")
        .with_poll_interval(Duration::from_millis(10))
        .to_contain("welcome")
        .await
        .unwrap();
    assert_eq!(reads.load(Ordering::SeqCst), 3);

    let check = ContentCheck::new().require("Goodbye").forbid("back");
    let err = expect_text(&client, "#status")
        .with_timeout(Duration::from_millis(100))
        .with_poll_interval(Duration::from_millis(10))
        .to_satisfy(&check)
        .await
        .unwrap_err();
    match err {
        Error::AssertionTimeout(message) => {
            assert!(message.contains("#status"));
            assert!(message.contains("missing 'Goodbye'"));
            assert!(message.contains("found forbidden 'back'"));
        }
        other => panic!("expected AssertionTimeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_close_rejects_later_calls() {
    common::init_tracing();
    let client = ToolClient::attach(serve(|_, _| Some(common::text_result("ok"))), options())
        .await
        .unwrap();

    client.close().await.unwrap();
    client.close().await.unwrap();

    assert!(client.is_closed().await);
    assert!(matches!(
        client.call_tool("get-text", json!({"selector": "h1"})).await,
        Err(Error::ProcessClosed { .. })
    ));
}
