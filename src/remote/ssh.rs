// file: src/remote/ssh.rs
// version: 1.0.0
// guid: f0dec8d4-47ef-42ff-a358-d2fb74ed7b14

//! SSH client for remote deployment operations

use super::executor::{CommandExecutor, CommandOutput, Connector};
use crate::config::{HostTarget, SshSettings};
use crate::error::DeployError;
use crate::Result;
use ssh2::Session;
use std::io::Read;
use std::net::TcpStream;
use std::path::Path;
use tracing::{debug, info};

/// SSH client for one remote host
///
/// libssh2 calls block, so all session work runs on tokio's blocking pool
/// and the runtime stays free to service Ctrl-C while a command hangs.
pub struct SshClient {
    session: Option<Session>,
    host: String,
}

/// Run blocking session work off the async runtime
async fn off_runtime<F, T>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DeployError::ssh(format!("SSH worker failed: {}", e)))?
}

fn open_session(target: &HostTarget, identity_file: Option<&str>) -> Result<Session> {
    let tcp = TcpStream::connect((target.host.as_str(), target.port)).map_err(|e| {
        DeployError::ssh(format!("Failed to connect to {}: {}", target.host, e))
    })?;

    let mut session = Session::new()
        .map_err(|e| DeployError::ssh(format!("Failed to create SSH session: {}", e)))?;

    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| DeployError::ssh(format!("SSH handshake failed: {}", e)))?;

    // Try the agent first, then the configured private key
    if session.userauth_agent(&target.user).is_err() {
        match identity_file {
            Some(key) => {
                debug!("Agent authentication failed, trying key {}", key);
                session
                    .userauth_pubkey_file(&target.user, None, Path::new(key), None)
                    .map_err(|e| {
                        DeployError::ssh(format!(
                            "SSH key authentication failed for {}: {}",
                            target, e
                        ))
                    })?;
            }
            None => {
                return Err(DeployError::ssh(format!(
                    "SSH authentication failed for {} - no agent identity accepted",
                    target
                )));
            }
        }
    }

    if !session.authenticated() {
        return Err(DeployError::ssh(format!(
            "SSH authentication failed for {}",
            target
        )));
    }
    Ok(session)
}

/// Execute one command and collect exit code and both output streams
fn exec(session: &Session, command: &str) -> Result<CommandOutput> {
    let mut channel = session
        .channel_session()
        .map_err(|e| DeployError::ssh(format!("Failed to create SSH channel: {}", e)))?;

    channel
        .exec(command)
        .map_err(|e| DeployError::ssh(format!("Failed to execute command: {}", e)))?;

    // Logs are not guaranteed to be UTF-8; decode lossily after reading
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    channel
        .read_to_end(&mut stdout)
        .map_err(|e| DeployError::ssh(format!("Failed to read stdout: {}", e)))?;
    channel
        .stderr()
        .read_to_end(&mut stderr)
        .map_err(|e| DeployError::ssh(format!("Failed to read stderr: {}", e)))?;

    channel
        .wait_close()
        .map_err(|e| DeployError::ssh(format!("Failed to close SSH channel: {}", e)))?;

    let exit_code = channel
        .exit_status()
        .map_err(|e| DeployError::ssh(format!("Failed to get exit status: {}", e)))?;

    Ok(CommandOutput::from_bytes(exit_code, &stdout, &stderr))
}

impl SshClient {
    /// Create a new SSH client
    pub fn new() -> Self {
        Self {
            session: None,
            host: String::new(),
        }
    }

    /// Connect to remote host via SSH
    pub async fn connect(&mut self, target: &HostTarget, identity_file: Option<&str>) -> Result<()> {
        info!("Connecting to {} on port {}", target, target.port);

        let owned_target = target.clone();
        let key = identity_file.map(str::to_string);
        let session = off_runtime(move || open_session(&owned_target, key.as_deref())).await?;

        self.session = Some(session);
        self.host = target.host.clone();

        info!("SSH connection established to {}", target.host);
        Ok(())
    }

    /// Execute command and collect exit code and both output streams
    pub async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        debug!("[{}] {}", self.host, command);

        let session = self
            .session
            .take()
            .ok_or_else(|| DeployError::ssh("No active SSH session"))?;
        let owned = command.to_string();
        let (session, output) = off_runtime(move || {
            let output = exec(&session, &owned);
            Ok((session, output))
        })
        .await?;
        self.session = Some(session);

        let output = output?;
        debug!("[{}] exit code {}", self.host, output.exit_code);
        Ok(output)
    }

    /// Disconnect SSH session
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = session.disconnect(None, "", None);
            info!("SSH session to {} disconnected", self.host);
        }
    }
}

impl Drop for SshClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl Default for SshClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommandExecutor for SshClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        SshClient::run(self, command).await
    }

    fn disconnect(&mut self) {
        SshClient::disconnect(self)
    }
}

/// Opens one SSH session per host
pub struct SshConnector {
    identity_file: Option<String>,
}

impl SshConnector {
    /// Falls back to `~/.ssh/id_rsa` when no key is configured and one exists
    pub fn new(settings: &SshSettings) -> Self {
        let identity_file = settings.identity_file.clone().or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(".ssh").join("id_rsa"))
                .filter(|key| key.exists())
                .map(|key| key.to_string_lossy().to_string())
        });
        Self { identity_file }
    }
}

#[async_trait::async_trait]
impl Connector for SshConnector {
    async fn connect(&self, target: &HostTarget) -> Result<Box<dyn CommandExecutor>> {
        let mut client = SshClient::new();
        client
            .connect(target, self.identity_file.as_deref())
            .await?;
        Ok(Box::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_blocking_session_work_leaves_runtime_responsive() {
        // Arrange
        let started = Instant::now();

        // Act: a stalled remote command must not starve the other select branch
        let stalled = tokio::select! {
            _ = off_runtime(|| {
                std::thread::sleep(Duration::from_secs(2));
                Ok(())
            }) => true,
            _ = tokio::time::sleep(Duration::from_millis(50)) => false,
        };

        // Assert
        assert!(!stalled);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_run_without_session_is_an_ssh_error() {
        let mut client = SshClient::new();

        let err = client.run("uptime").await.unwrap_err();

        assert!(matches!(err, DeployError::SshError(_)));
    }
}
