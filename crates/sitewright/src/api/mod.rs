// Public API types module
//
// Configuration types with builder patterns: how to start the automation
// server, and what to ask it to launch.

pub mod client_options;
pub mod launch_options;

pub use client_options::ClientOptions;
pub use launch_options::{BrowserKind, LaunchOptions, ProxySettings, Viewport};
