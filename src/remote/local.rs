// file: src/remote/local.rs
// version: 1.0.0
// guid: 89022b0a-423c-4ebc-8cf8-ee115edc679c

//! Local command execution for single-machine rehearsals

use super::executor::{CommandExecutor, CommandOutput, Connector};
use crate::config::HostTarget;
use crate::error::DeployError;
use crate::Result;
use tokio::process::Command;
use tracing::{debug, info};

/// Local command executor that mimics the SSH client interface
///
/// Keeps the name of the host it stands in for so NIC lookups still resolve.
pub struct LocalClient {
    host: String,
}

impl LocalClient {
    /// Create a new local client standing in for `host`
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Execute command locally through bash
    pub async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        debug!("[local:{}] {}", self.host, command);

        let output = Command::new("bash")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| DeployError::ProcessError {
                command: command.to_string(),
                exit_code: None,
                stderr: format!("Failed to execute command: {}", e),
            })?;

        Ok(CommandOutput::from_bytes(
            output.status.code().unwrap_or(-1),
            &output.stdout,
            &output.stderr,
        ))
    }
}

#[async_trait::async_trait]
impl CommandExecutor for LocalClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        LocalClient::run(self, command).await
    }

    fn disconnect(&mut self) {
        debug!("Local mode: no disconnect needed");
    }
}

/// Runs every host's commands on this machine
#[derive(Default)]
pub struct LocalConnector;

#[async_trait::async_trait]
impl Connector for LocalConnector {
    async fn connect(&self, target: &HostTarget) -> Result<Box<dyn CommandExecutor>> {
        info!("Local execution mode - standing in for {}", target);
        Ok(Box::new(LocalClient::new(target.host.clone())))
    }
}
