// file: src/remote/executor.rs
// version: 1.0.0
// guid: e48afcc5-031e-466d-b80e-9920b76a2fc8

//! Command execution traits for SSH, local and dry-run transports

use crate::config::HostTarget;
use crate::Result;

/// Captured result of one shell command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Build from raw process output; bytes that are not UTF-8 are replaced
    pub fn from_bytes(exit_code: i32, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            exit_code,
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Trimmed stdout, the way recipes consume single-value output
    pub fn text(&self) -> &str {
        self.stdout.trim()
    }
}

/// Trait for executing commands on one host
///
/// `run` only fails on transport problems. A command exiting non-zero comes
/// back as a [`CommandOutput`] so the caller decides whether it matters.
#[async_trait::async_trait]
pub trait CommandExecutor: Send {
    /// Short host name, used for NIC lookups and log prefixes
    fn host(&self) -> &str;

    /// Execute command and capture exit code, stdout and stderr
    async fn run(&mut self, command: &str) -> Result<CommandOutput>;

    /// Execute a command intended as a boolean check
    async fn check_silent(&mut self, command: &str) -> Result<bool> {
        Ok(self.run(command).await?.success())
    }

    /// Disconnect
    fn disconnect(&mut self);
}

/// Opens an executor for a host of the role table
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, target: &HostTarget) -> Result<Box<dyn CommandExecutor>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_replaces_invalid_utf8() {
        let out = CommandOutput::from_bytes(0, b"Oct 18 14:05 eth0 \xff\xfe ERROR\n", b"");

        assert!(out.success());
        assert!(out.stdout.starts_with("Oct 18 14:05 eth0 "));
        assert!(out.stdout.ends_with(" ERROR\n"));
        assert!(out.stdout.contains('\u{FFFD}'));
    }
}
