//! Server management and connection layer (internal)
//!
//! This module handles the automation server lifecycle, the line-delimited
//! JSON-RPC transport, and request/response correlation.
//!
//! **Note**: This module is exposed publicly only for integration testing purposes.
//! The types and APIs in this module are considered internal implementation details
//! and may change without notice. User code should go through `ToolClient`.

#[doc(hidden)]
pub mod connection;
#[doc(hidden)]
pub mod pending;
#[doc(hidden)]
pub mod tool_server;
#[doc(hidden)]
pub mod transport;
