//! Bookkeeping for in-flight requests
//!
//! `PendingRequests` owns the id counter, the id -> waiter map and the
//! closed flag for one connection. Every dispatch and every routed response
//! goes through its accessors; nothing else touches the map.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::oneshot;

/// A request awaiting its response
#[derive(Debug)]
pub struct PendingRequest {
    pub method: String,
    pub sent_at: Instant,
    waiter: oneshot::Sender<Result<Value>>,
}

/// Id counter plus the map of outstanding requests
#[derive(Debug)]
pub struct PendingRequests {
    next_id: u64,
    entries: HashMap<u64, PendingRequest>,
    // Some(exit_code) once the server is gone
    closed: Option<Option<i32>>,
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingRequests {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: HashMap::new(),
            closed: None,
        }
    }

    /// Mint a fresh id and register a waiter for it
    ///
    /// Ids increase monotonically and are never handed out twice. Fails with
    /// `ProcessClosed` once `close` has run.
    pub fn register(&mut self, method: &str) -> Result<(u64, oneshot::Receiver<Result<Value>>)> {
        if let Some(exit_code) = self.closed {
            return Err(Error::ProcessClosed { exit_code });
        }

        let id = self.next_id;
        self.next_id += 1;

        let (tx, rx) = oneshot::channel();
        self.entries.insert(
            id,
            PendingRequest {
                method: method.to_string(),
                sent_at: Instant::now(),
                waiter: tx,
            },
        );

        Ok((id, rx))
    }

    /// Deliver a result to the request with this id
    ///
    /// Returns `false` when nothing is waiting on the id (already timed out,
    /// or never sent by us).
    pub fn complete(&mut self, id: u64, result: Result<Value>) -> bool {
        match self.entries.remove(&id) {
            Some(pending) => {
                // Receiver may have been dropped by a cancelled caller
                let _ = pending.waiter.send(result);
                true
            }
            None => false,
        }
    }

    /// Drop the entry without resolving it
    pub fn remove(&mut self, id: u64) -> Option<PendingRequest> {
        self.entries.remove(&id)
    }

    /// Reject every outstanding request, each exactly once
    pub fn fail_all(&mut self, make_error: impl Fn(&PendingRequest) -> Error) -> usize {
        let count = self.entries.len();
        for (_, pending) in self.entries.drain() {
            let error = make_error(&pending);
            let _ = pending.waiter.send(Err(error));
        }
        count
    }

    /// Mark the server as gone and reject everything outstanding
    ///
    /// Returns how many requests were rejected. Later calls keep the first
    /// exit code.
    pub fn close(&mut self, exit_code: Option<i32>) -> usize {
        let exit_code = *self.closed.get_or_insert(exit_code);
        self.fail_all(|_| Error::ProcessClosed { exit_code })
    }

    /// `Some(exit_code)` once closed
    pub fn closed(&self) -> Option<Option<i32>> {
        self.closed
    }

    pub fn contains(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn method_of(&self, id: u64) -> Option<&str> {
        self.entries.get(&id).map(|p| p.method.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
