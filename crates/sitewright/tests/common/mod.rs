//! Shared helpers for integration tests
//!
//! `TestPipes` stands in for the automation server: it sees every line the
//! client writes and can answer with whatever bytes a test wants, split
//! however the test likes.

#![allow(dead_code)]

use serde_json::Value;
use sitewright::server::connection::Connection;
use sitewright::server::transport::LineTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber; honours RUST_LOG, defaults to warnings
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Server side of an in-memory connection
pub struct TestPipes {
    pub connection: Arc<Connection>,
    pub server_in: BufReader<DuplexStream>,
    pub server_out: DuplexStream,
}

/// Connection over duplex pipes, with its read loop already running
pub fn connect(request_timeout: Duration) -> TestPipes {
    connect_with_capacity(64 * 1024, request_timeout)
}

/// Like `connect`, with `capacity` bytes of buffering in each direction
///
/// A small capacity makes the client's writes block until the test reads
/// `server_in`.
pub fn connect_with_capacity(capacity: usize, request_timeout: Duration) -> TestPipes {
    let (stdin_read, stdin_write) = duplex(capacity);
    let (stdout_read, stdout_write) = duplex(capacity);

    let (transport, message_rx) = LineTransport::new(stdin_write, stdout_read);
    let (sender, receiver) = transport.into_parts();
    let connection = Arc::new(
        Connection::new(sender, receiver, message_rx).with_request_timeout(request_timeout),
    );

    let conn = Arc::clone(&connection);
    tokio::spawn(async move {
        if let Err(e) = conn.run().await {
            tracing::error!("Connection loop failed: {}", e);
        }
    });

    TestPipes {
        connection,
        server_in: BufReader::new(stdin_read),
        server_out: stdout_write,
    }
}

impl TestPipes {
    /// Next line written by the client, parsed
    pub async fn read_message(&mut self) -> Value {
        let mut line = String::new();
        let n = self.server_in.read_line(&mut line).await.unwrap();
        assert!(n > 0, "client closed its output");
        serde_json::from_str(&line).unwrap()
    }

    /// Write raw bytes to the client, exactly as given
    pub async fn write_raw(&mut self, bytes: &str) {
        self.server_out.write_all(bytes.as_bytes()).await.unwrap();
        self.server_out.flush().await.unwrap();
    }

    /// Write one JSON value followed by a newline
    pub async fn write_message(&mut self, value: &Value) {
        let line = format!("{}\n", value);
        self.write_raw(&line).await;
    }

    /// Answer requests with `handler` until the client hangs up
    ///
    /// Notifications are read and dropped; a `None` from the handler leaves
    /// that request unanswered.
    pub fn serve<F>(mut self, handler: F) -> Arc<Connection>
    where
        F: Fn(&Value) -> Option<Value> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::spawn(async move {
            loop {
                let mut line = String::new();
                match self.server_in.read_line(&mut line).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                let Ok(request) = serde_json::from_str::<Value>(&line) else {
                    continue;
                };
                let Some(id) = request.get("id").cloned() else {
                    continue;
                };
                if let Some(mut response) = handler(&request) {
                    response["jsonrpc"] = Value::from("2.0");
                    response["id"] = id;
                    self.write_message(&response).await;
                }
            }
        });
        connection
    }
}

/// A `tools/call` result with one text item
pub fn text_result(text: &str) -> Value {
    serde_json::json!({
        "result": { "content": [{ "type": "text", "text": text }] }
    })
}
