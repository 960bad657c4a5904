// Automation server process management
//
// Launches the configured automation server and owns the child process for
// the lifetime of one client session.

use crate::api::ClientOptions;
use crate::{Error, Result};
use std::process::Stdio;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Manages the automation server process lifecycle
///
/// The server speaks newline-delimited JSON-RPC on stdin/stdout. Its stderr
/// is discarded: diagnostics there are not part of the protocol.
///
/// # Example
///
/// ```ignore
/// # use sitewright::api::ClientOptions;
/// # use sitewright::server::tool_server::ToolServer;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut server = ToolServer::launch(&ClientOptions::new("browser-tools-server")).await?;
/// let (stdin, stdout) = server.take_stdio()?;
/// // Wire up a connection...
/// server.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ToolServer {
    /// The server child process
    ///
    /// Public so integration tests can reach the pipes directly.
    pub process: Child,
}

impl ToolServer {
    /// Launch the automation server process
    ///
    /// The process must still be running after `options.startup_grace`;
    /// a server that exits straight away is reported as a launch failure.
    ///
    /// # Errors
    ///
    /// Returns `Error::LaunchFailed` if the process cannot be spawned or
    /// exits during the startup grace period.
    pub async fn launch(options: &ClientOptions) -> Result<Self> {
        let mut command = Command::new(&options.command);
        command
            .args(&options.args)
            .envs(&options.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = &options.current_dir {
            command.current_dir(dir);
        }

        tracing::debug!(
            "Launching automation server: {} {:?}",
            options.command.display(),
            options.args
        );

        let mut child = command.spawn().map_err(|e| {
            Error::LaunchFailed(format!(
                "Failed to spawn '{}': {}",
                options.command.display(),
                e
            ))
        })?;

        tokio::time::sleep(options.startup_grace).await;

        match child.try_wait() {
            Ok(Some(status)) => {
                return Err(Error::LaunchFailed(format!(
                    "Server process exited immediately with status: {}",
                    status
                )));
            }
            Ok(None) => {}
            Err(e) => {
                return Err(Error::LaunchFailed(format!(
                    "Failed to check process status: {}",
                    e
                )));
            }
        }

        tracing::debug!("Automation server running (pid {:?})", child.id());

        Ok(Self { process: child })
    }

    /// Take the stdin/stdout pipes for the transport
    pub fn take_stdio(&mut self) -> Result<(ChildStdin, ChildStdout)> {
        let stdin = self
            .process
            .stdin
            .take()
            .ok_or_else(|| Error::TransportError("Server stdin already taken".to_string()))?;
        let stdout = self
            .process
            .stdout
            .take()
            .ok_or_else(|| Error::TransportError("Server stdout already taken".to_string()))?;
        Ok((stdin, stdout))
    }

    /// Wait for the process to exit and return its exit code
    ///
    /// `None` means the process was terminated by a signal.
    pub async fn wait_exit_code(&mut self) -> Result<Option<i32>> {
        let status = self.process.wait().await?;
        Ok(status.code())
    }

    /// Shut down the server
    ///
    /// Closes the pipes first, then kills and reaps the process.
    pub async fn shutdown(mut self) -> Result<Option<i32>> {
        drop(self.process.stdin.take());
        drop(self.process.stdout.take());

        if let Ok(Some(status)) = self.process.try_wait() {
            return Ok(status.code());
        }

        self.process
            .kill()
            .await
            .map_err(|e| Error::LaunchFailed(format!("Failed to kill process: {}", e)))?;

        match tokio::time::timeout(std::time::Duration::from_secs(5), self.process.wait()).await {
            Ok(Ok(status)) => Ok(status.code()),
            Ok(Err(e)) => Err(Error::LaunchFailed(format!(
                "Failed to wait for process: {}",
                e
            ))),
            Err(_) => {
                let _ = self.process.start_kill();
                Err(Error::LaunchFailed(
                    "Process shutdown timeout after 5 seconds".to_string(),
                ))
            }
        }
    }
}
