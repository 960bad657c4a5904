// Client options
//
// How to start the automation server and how long to wait on it.
// Built in code with the chained setters, or read from the environment:
//
// - SITEWRIGHT_SERVER_COMMAND     executable to launch (required)
// - SITEWRIGHT_SERVER_ARGS        whitespace-separated arguments
// - SITEWRIGHT_REQUEST_TIMEOUT_MS per-request timeout in milliseconds

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_SERVER_COMMAND: &str = "SITEWRIGHT_SERVER_COMMAND";
pub const ENV_SERVER_ARGS: &str = "SITEWRIGHT_SERVER_ARGS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "SITEWRIGHT_REQUEST_TIMEOUT_MS";

/// Options for launching and talking to the automation server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    /// Server executable
    pub command: PathBuf,

    /// Arguments passed to the server
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables for the server process
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Working directory for the server process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_dir: Option<PathBuf>,

    /// How long a request may wait for its response
    #[serde(default = "default_timeout", with = "duration_ms")]
    pub request_timeout: Duration,

    /// How long the initial handshake may take
    #[serde(default = "default_timeout", with = "duration_ms")]
    pub handshake_timeout: Duration,

    /// The server must still be running after this long
    #[serde(default = "default_startup_grace", with = "duration_ms")]
    pub startup_grace: Duration,

    /// Name sent in the handshake's clientInfo
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Version sent in the handshake's clientInfo
    #[serde(default = "default_client_version")]
    pub client_version: String,
}

fn default_timeout() -> Duration {
    Duration::from_millis(crate::DEFAULT_TIMEOUT_MS as u64)
}

fn default_startup_grace() -> Duration {
    Duration::from_millis(100)
}

fn default_client_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

impl ClientOptions {
    /// Options for launching `command` with default timeouts
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            current_dir: None,
            request_timeout: default_timeout(),
            handshake_timeout: default_timeout(),
            startup_grace: default_startup_grace(),
            client_name: default_client_name(),
            client_version: default_client_version(),
        }
    }

    /// Read options from the process environment
    ///
    /// # Errors
    ///
    /// Returns `Error::ServerNotFound` when `SITEWRIGHT_SERVER_COMMAND` is
    /// unset or empty, and `Error::InvalidArgument` for a malformed timeout.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read options through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let command = lookup(ENV_SERVER_COMMAND)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(Error::ServerNotFound)?;

        let mut options = Self::new(command);

        if let Some(args) = lookup(ENV_SERVER_ARGS) {
            options.args = args.split_whitespace().map(str::to_string).collect();
        }

        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                Error::InvalidArgument(format!(
                    "{} must be a number of milliseconds, got '{}'",
                    ENV_REQUEST_TIMEOUT_MS, raw
                ))
            })?;
            options.request_timeout = Duration::from_millis(ms);
        }

        Ok(options)
    }

    /// Set the server arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add one environment variable for the server process
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory for the server process
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set how long the server must survive after spawning
    pub fn startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    /// Set the client name and version announced in the handshake
    pub fn client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_name = name.into();
        self.client_version = version.into();
        self
    }
}
