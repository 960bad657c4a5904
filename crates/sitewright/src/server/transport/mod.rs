// Automation server transport layer
//
// Handles bidirectional communication with the automation server.
// - LineTransport: stdio pipes carrying one JSON object per line

use crate::Result;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::pin::Pin;

pub mod line;

pub use line::{LineBuffer, LineTransport, LineTransportReceiver, send_message};

/// Trait for the sending half of a transport
pub trait TransportSender: Send + Unpin {
    fn send(&mut self, message: JsonValue)
    -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Trait for the receiving half of a transport
pub trait TransportReceiver: Send + Unpin {
    /// Run the receive loop until the stream ends
    fn run(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
