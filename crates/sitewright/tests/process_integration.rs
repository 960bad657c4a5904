//! ToolClient against real child processes
//!
//! The "servers" are short `sh` scripts that answer on stdout, which is
//! enough to exercise launch, handshake, process exit and restart.

#![cfg(unix)]

use serde_json::json;
use sitewright::{ClientOptions, Error, ToolClient};
use std::time::Duration;

mod common;

const HANDSHAKE_REPLY: &str =
    r#"printf '{"jsonrpc":"2.0","id":1,"result":{"serverInfo":{"name":"sh"}}}\n'"#;

fn sh(script: &str) -> ClientOptions {
    ClientOptions::new("sh")
        .args(["-c", script])
        .request_timeout(Duration::from_secs(5))
        .handshake_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_lazy_launch_handshake_and_call() {
    common::init_tracing();
    // initialize, initialized notification, one tools/call, then wait for EOF
    let script = format!(
        r#"read l; {}; read l; read l; printf '{{"jsonrpc":"2.0","id":2,"result":{{"content":[{{"type":"text","text":"Example Domain"}}]}}}}\n'; read l"#,
        HANDSHAKE_REPLY
    );
    let client = ToolClient::new(sh(&script));
    assert!(client.server_info().await.is_none());

    let text = client.get_text("h1").await.unwrap();
    assert_eq!(text, "Example Domain");

    let info = client.server_info().await.unwrap();
    assert_eq!(info["serverInfo"]["name"], "sh");

    client.close().await.unwrap();
    assert!(client.is_closed().await);
}

#[tokio::test]
async fn test_exit_during_handshake_reports_exit_code() {
    common::init_tracing();
    let client = ToolClient::new(sh("read line; exit 4"));

    let err = client.start().await.unwrap_err();
    assert!(err.is_closed(), "unexpected error: {:?}", err);
    match err {
        Error::Context(_, inner) => {
            assert!(matches!(*inner, Error::ProcessClosed { exit_code: Some(4) }));
        }
        other => panic!("expected handshake context, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exit_mid_session_then_restart() {
    common::init_tracing();
    // Answers the handshake, swallows one call, then exits
    let script = format!("read l; {}; read l; read l; exit 7", HANDSHAKE_REPLY);
    let client = ToolClient::new(sh(&script));

    let err = client
        .call_tool("get-text", json!({"selector": "h1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ProcessClosed { exit_code: Some(7) }));

    // No relaunch behind the caller's back
    assert!(client.is_closed().await);
    assert!(matches!(
        client.get_text("h1").await,
        Err(Error::ProcessClosed { exit_code: Some(7) })
    ));

    client.restart().await.unwrap();
    assert!(!client.is_closed().await);
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_executable_is_launch_failure() {
    common::init_tracing();
    let client = ToolClient::new(ClientOptions::new("/nonexistent/automation-server"));

    assert!(matches!(
        client.get_text("h1").await,
        Err(Error::LaunchFailed(_))
    ));
    // A failed start leaves the client ready to try again
    assert!(!client.is_closed().await);
}
