//! JSON-RPC connection layer for the automation server
//!
//! The connection assigns ids, writes requests, and routes response lines
//! back to the caller that is waiting on the matching id. Responses can
//! arrive in any order; a response for an id nobody is waiting on (timed
//! out, or unsolicited) is dropped.

use crate::error::{Error, Result};
use crate::protocol::{Message, Notification, Request, Response};
use crate::server::pending::PendingRequests;
use crate::server::transport::{TransportReceiver, TransportSender};
use parking_lot::Mutex as ParkingLotMutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::mpsc;

/// JSON-RPC connection to an automation server
pub struct Connection {
    pending: ParkingLotMutex<PendingRequests>,
    sender: TokioMutex<Box<dyn TransportSender>>,
    message_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
    transport_receiver: TokioMutex<Option<Box<dyn TransportReceiver>>>,
    request_timeout: Duration,
}

impl Connection {
    pub fn new(
        sender: impl TransportSender + 'static,
        receiver: impl TransportReceiver + 'static,
        message_rx: mpsc::UnboundedReceiver<Value>,
    ) -> Self {
        Self {
            pending: ParkingLotMutex::new(PendingRequests::new()),
            sender: TokioMutex::new(Box::new(sender)),
            message_rx: TokioMutex::new(Some(message_rx)),
            transport_receiver: TokioMutex::new(Some(Box::new(receiver))),
            request_timeout: Duration::from_millis(crate::DEFAULT_TIMEOUT_MS as u64),
        }
    }

    /// Set the timeout used by `send_message`
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Send a request and await its response with the default timeout
    pub async fn send_message(&self, method: &str, params: Value) -> Result<Value> {
        self.send_request(method, params, self.request_timeout)
            .await
    }

    /// Send a request and await its response
    ///
    /// The timeout covers the whole exchange, including waiting for the
    /// writer and writing the line. The pending entry is removed when the
    /// response arrives, when the timeout fires, or when the write fails,
    /// so every id completes at most once.
    pub async fn send_request(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value> {
        let (id, rx) = self.pending.lock().register(method)?;
        let started = Instant::now();

        tracing::debug!("Sending request: id={}, method='{}'", id, method);

        let request_value = match serde_json::to_value(Request::new(id, method, params)) {
            Ok(value) => value,
            Err(e) => {
                self.pending.lock().remove(id);
                return Err(e.into());
            }
        };
        tracing::trace!("Request JSON: {}", request_value);

        let exchange = async {
            // Holding the writer lock for the whole line keeps concurrent
            // requests from interleaving on stdin.
            if let Err(e) = self.sender.lock().await.send(request_value).await {
                tracing::error!("Failed to send request {}: {}", id, e);
                return Err(e);
            }
            rx.await.unwrap_or(Err(Error::ChannelClosed))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                // No-op when the entry was already completed
                self.pending.lock().remove(id);
                Err(e)
            }
            Err(_) => {
                self.pending.lock().remove(id);
                let elapsed_ms = started.elapsed().as_millis() as u64;
                tracing::warn!(
                    "Request {} ('{}') timed out after {}ms",
                    id,
                    method,
                    elapsed_ms
                );
                Err(Error::Timeout {
                    method: method.to_string(),
                    elapsed_ms,
                })
            }
        }
    }

    /// Send a notification (no id, no response expected)
    pub async fn notify(&self, method: &str, params: Value) -> Result<()> {
        if let Some(exit_code) = self.pending.lock().closed() {
            return Err(Error::ProcessClosed { exit_code });
        }

        let value = serde_json::to_value(Notification::new(method, params))?;
        tracing::debug!("Sending notification: method='{}'", method);
        self.sender.lock().await.send(value).await
    }

    /// Run the transport read loop and route every incoming message
    ///
    /// Returns once the server's output stream ends. It does not close the
    /// connection: the owner decides the exit code and calls `close`.
    pub async fn run(self: &Arc<Self>) -> Result<()> {
        let mut transport_receiver = self.transport_receiver.lock().await.take().ok_or_else(|| {
            Error::ProtocolError("run() can only be called once".to_string())
        })?;

        let mut message_rx = self.message_rx.lock().await.take().ok_or_else(|| {
            Error::ProtocolError("run() can only be called once".to_string())
        })?;

        let transport_handle = tokio::spawn(async move {
            if let Err(e) = transport_receiver.run().await {
                tracing::error!("Transport error: {}", e);
            }
        });

        while let Some(message_value) = message_rx.recv().await {
            self.dispatch(message_value);
        }

        tracing::debug!("Message loop ended (transport closed)");
        let _ = transport_handle.await;
        Ok(())
    }

    /// Route one parsed line
    pub(crate) fn dispatch(&self, value: Value) {
        match Message::from_value(value) {
            Some(Message::Response(response)) => self.handle_response(response),
            Some(Message::Notification(notification)) => {
                tracing::debug!(
                    "Ignoring server notification: method='{}'",
                    notification.method
                );
            }
            None => {
                tracing::warn!("Ignoring message that is neither a response nor a notification");
            }
        }
    }

    fn handle_response(&self, response: Response) {
        let mut pending = self.pending.lock();

        let Some(method) = pending.method_of(response.id).map(str::to_owned) else {
            tracing::debug!("Ignoring response for unknown id: {}", response.id);
            return;
        };

        tracing::debug!("Processing response for id {} ('{}')", response.id, method);

        let result = match response.error {
            Some(error) => Err(Error::ToolError {
                method,
                message: error.message(),
                code: error.code(),
            }),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };

        pending.complete(response.id, result);
    }

    /// Mark the server as gone and reject every outstanding request
    ///
    /// Each pending caller receives `Error::ProcessClosed` carrying
    /// `exit_code`; later requests fail immediately with the same error.
    pub fn close(&self, exit_code: Option<i32>) {
        let rejected = self.pending.lock().close(exit_code);
        tracing::debug!(
            "Connection closed (exit code {:?}), rejected {} pending request(s)",
            exit_code,
            rejected
        );
    }

    pub fn is_closed(&self) -> bool {
        self.pending.lock().closed().is_some()
    }

    /// Exit code recorded by `close`, if closed
    pub fn exit_code(&self) -> Option<Option<i32>> {
        self.pending.lock().closed()
    }

    /// Number of requests still waiting for a response
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}
