// Copyright 2024 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Protocol types - Rust representations of the automation server's wire format
//
// This module contains the JSON-RPC envelopes, the normalized tool result,
// and the argument builders for each tool the facade exposes.

pub mod action_options;
pub mod message;
pub mod page_info;
pub mod screenshot;
pub mod tool_result;

pub use action_options::{
    ClickOptions, ClickOptionsBuilder, ElementState, FillOptions, FillOptionsBuilder, MouseButton,
    NavigateOptions, WaitForOptions, WaitUntil,
};
pub use message::{JSONRPC_VERSION, Message, Notification, Request, Response, RpcError};
pub use page_info::PageInfo;
pub use screenshot::{Screenshot, ScreenshotOptions, ScreenshotOptionsBuilder, ScreenshotType};
pub use tool_result::{ToolImage, ToolOutcome, ToolOutput};
