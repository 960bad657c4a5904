// JSON-RPC envelopes exchanged with the automation server
//
// Outgoing: requests `{jsonrpc, id, method, params}` and notifications
// (no id). Incoming: responses `{id, result}` / `{id, error}` and
// server-initiated notifications, which the client only logs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC version marker sent on every outgoing envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// Request message sent to the automation server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl Request {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// Fire-and-forget message: no id, never answered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// Response message from the automation server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Error field of a response
///
/// Servers send a JSON-RPC error object, a bare string, or occasionally
/// something else entirely (an object without `message`, a number). Every
/// shape is accepted so the waiting request always settles with an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcError {
    Object {
        #[serde(default)]
        code: Option<i64>,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Text(String),
    Other(Value),
}

impl RpcError {
    /// Human-readable message; unrecognised shapes fall back to their JSON
    pub fn message(&self) -> String {
        match self {
            RpcError::Object { message, .. } => message.clone(),
            RpcError::Text(message) => message.clone(),
            RpcError::Other(value) => value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| value.to_string()),
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Object { code, .. } => *code,
            RpcError::Text(_) => None,
            RpcError::Other(value) => value.get("code").and_then(Value::as_i64),
        }
    }
}

/// An incoming line, classified
#[derive(Debug, Clone)]
pub enum Message {
    Response(Response),
    Notification(Notification),
}

impl Message {
    /// Classify a parsed line
    ///
    /// Anything carrying a `method` is server-initiated. Anything else must
    /// carry an unsigned integer `id` to be a response. Returns `None` for
    /// objects that fit neither shape.
    pub fn from_value(value: Value) -> Option<Self> {
        if value.get("method").is_some_and(Value::is_string) {
            return serde_json::from_value(value).ok().map(Message::Notification);
        }

        if value.get("id").is_some_and(Value::is_u64) {
            return serde_json::from_value(value).ok().map(Message::Response);
        }

        None
    }
}
