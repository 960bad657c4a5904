use super::{TransportReceiver, TransportSender};
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use serde_json::Value as JsonValue;
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

const CHUNK_SIZE: usize = 32_768; // 32KB reads

/// Send a JSON message as a single newline-terminated line
pub async fn send_message<W>(stdin: &mut W, message: JsonValue) -> Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    // serde_json never emits raw newlines, so one value is always one line
    let mut line = serde_json::to_vec(&message)
        .map_err(|e| Error::TransportError(format!("Failed to serialize JSON: {}", e)))?;
    line.push(b'\n');

    stdin
        .write_all(&line)
        .await
        .map_err(|e| Error::TransportError(format!("Failed to write message: {}", e)))?;

    stdin
        .flush()
        .await
        .map_err(|e| Error::TransportError(format!("Failed to flush: {}", e)))?;

    Ok(())
}

/// Accumulates raw output chunks and yields complete lines
///
/// Chunks may split or merge line boundaries arbitrarily. Anything after the
/// last newline stays buffered until a later chunk completes it.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk read from the stream
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Number of buffered bytes not yet terminated by a newline
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take the next complete line, without its `\n` (or `\r\n`)
    pub fn next_line(&mut self) -> Option<Bytes> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let mut line = self.buf.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(pos - 1);
        }
        Some(line.freeze())
    }

    /// Parse every complete line currently buffered
    ///
    /// Blank lines are skipped. Lines that are not valid JSON are logged and
    /// discarded; they never surface as errors.
    pub fn drain_messages(&mut self) -> Vec<JsonValue> {
        let mut messages = Vec::new();

        while let Some(line) = self.next_line() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match serde_json::from_slice::<JsonValue>(&line) {
                Ok(value) => messages.push(value),
                Err(e) => {
                    tracing::warn!(
                        "Discarding malformed line from server ({}): {}",
                        e,
                        String::from_utf8_lossy(&line)
                    );
                }
            }
        }

        messages
    }
}

/// Line-delimited transport over a child's stdin/stdout
pub struct LineTransport<W, R>
where
    W: AsyncWrite + Unpin + Send,
    R: AsyncRead + Unpin + Send,
{
    stdin: W,
    stdout: R,
    message_tx: mpsc::UnboundedSender<JsonValue>,
}

/// Receive-only part of LineTransport
pub struct LineTransportReceiver<R>
where
    R: AsyncRead + Unpin + Send,
{
    stdout: R,
    buffer: LineBuffer,
    message_tx: mpsc::UnboundedSender<JsonValue>,
}

impl<R> LineTransportReceiver<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Run the message read loop
    ///
    /// Returns `Ok(())` at EOF or once nobody is listening for messages.
    pub async fn run_loop(&mut self) -> Result<()> {
        let mut chunk = vec![0u8; CHUNK_SIZE];

        loop {
            let n = self
                .stdout
                .read(&mut chunk)
                .await
                .map_err(|e| Error::TransportError(format!("Failed to read output: {}", e)))?;

            if n == 0 {
                if !self.buffer.is_empty() {
                    tracing::warn!(
                        "Server output ended with {} bytes of unterminated line",
                        self.buffer.pending_len()
                    );
                }
                break;
            }

            self.buffer.push(&chunk[..n]);

            for message in self.buffer.drain_messages() {
                if self.message_tx.send(message).is_err() {
                    return Ok(());
                }
            }
        }

        Ok(())
    }
}

impl<W, R> LineTransport<W, R>
where
    W: AsyncWrite + Unpin + Send,
    R: AsyncRead + Unpin + Send,
{
    pub fn new(stdin: W, stdout: R) -> (Self, mpsc::UnboundedReceiver<JsonValue>) {
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        let transport = Self {
            stdin,
            stdout,
            message_tx,
        };

        (transport, message_rx)
    }

    pub fn into_parts(self) -> (W, LineTransportReceiver<R>) {
        (
            self.stdin,
            LineTransportReceiver {
                stdout: self.stdout,
                buffer: LineBuffer::new(),
                message_tx: self.message_tx,
            },
        )
    }
}

impl<W> TransportSender for W
where
    W: AsyncWrite + Unpin + Send,
{
    fn send(
        &mut self,
        message: JsonValue,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { send_message(self, message).await })
    }
}

impl<R> TransportReceiver for LineTransportReceiver<R>
where
    R: AsyncRead + Unpin + Send,
{
    fn run(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { self.run_loop().await })
    }
}
