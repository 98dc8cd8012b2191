// file: src/remote/shell.rs
// version: 1.0.0
// guid: e2b2615e-b97d-4e03-980e-71655d1fbe62

//! Command runner with status check, the primitive every recipe is built on

use super::executor::{CommandExecutor, CommandOutput};
use crate::report::{align_fail, align_ok};
use crate::verify::log_check::{TimedCommand, TimestampFormat};
use crate::Result;
use colored::Colorize;
use std::ops::{Deref, DerefMut};
use tracing::{debug, error, info};

/// A connected host plus the command prefixes currently in force
pub struct RemoteShell {
    executor: Box<dyn CommandExecutor>,
    prefixes: Vec<String>,
}

impl RemoteShell {
    pub fn new(executor: Box<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            prefixes: Vec::new(),
        }
    }

    /// Short name of the host behind this shell
    pub fn host(&self) -> &str {
        self.executor.host()
    }

    /// Prepend `prefix && ` to every command until the guard is dropped
    pub fn with_prefix(&mut self, prefix: impl Into<String>) -> PrefixGuard<'_> {
        self.prefixes.push(prefix.into());
        PrefixGuard { shell: self }
    }

    fn compose(&self, command: &str) -> String {
        if self.prefixes.is_empty() {
            command.to_string()
        } else {
            format!("{} && {}", self.prefixes.join(" && "), command)
        }
    }

    /// Run a command and capture its output without printing a status line
    pub async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        let full = self.compose(command);
        let output = self.executor.run(&full).await?;
        debug!(
            "[{}] '{}' exited with {}",
            self.executor.host(),
            command,
            output.exit_code
        );
        Ok(output)
    }

    /// Run a command intended as a boolean check
    pub async fn check_silent(&mut self, command: &str) -> Result<bool> {
        let full = self.compose(command);
        self.executor.check_silent(&full).await
    }

    /// Run a command, print an aligned pass/fail line for `label` and hand
    /// back the captured output
    ///
    /// A non-zero exit is reported, not raised; the caller decides whether
    /// it is fatal.
    pub async fn run_check(&mut self, label: &str, command: &str) -> Result<CommandOutput> {
        self.run_check_with(label, command, false).await
    }

    /// Like [`run_check`](Self::run_check) but never echoes command output
    pub async fn run_check_quiet(&mut self, label: &str, command: &str) -> Result<CommandOutput> {
        self.run_check_with(label, command, true).await
    }

    async fn run_check_with(
        &mut self,
        label: &str,
        command: &str,
        quiet: bool,
    ) -> Result<CommandOutput> {
        let host = self.executor.host().to_string();
        let output = self.run(command).await?;

        let msg = format!("[{}] {}", host, label);
        if output.success() {
            println!("{}", align_ok(&msg));
            info!("{} succeeded: {}", msg, command);
        } else {
            println!("{}", align_fail(&msg));
            error!(
                "{} failed with exit code {}: {}",
                msg, output.exit_code, command
            );
            if !quiet {
                for stream in [&output.stdout, &output.stderr] {
                    if !stream.trim().is_empty() {
                        println!("{}", stream.trim_end().red());
                    }
                }
            }
            if !output.stderr.trim().is_empty() {
                error!("STDERR: {}", output.stderr.trim_end());
            }
        }

        Ok(output)
    }

    /// Run a command, then read the host clock so the command can later be
    /// matched against log lines
    pub async fn run_and_record_time(
        &mut self,
        command: &str,
        format: TimestampFormat,
    ) -> Result<TimedCommand> {
        let output = self.run(command).await?;
        let timestamp = self.run(&format.remote_command()).await?;
        Ok(TimedCommand {
            command: command.to_string(),
            exit_code: output.exit_code,
            timestamp: timestamp.text().to_string(),
        })
    }

    /// Read the host clock in the given format
    pub async fn timestamp(&mut self, format: TimestampFormat) -> Result<String> {
        Ok(self.run(&format.remote_command()).await?.text().to_string())
    }

    pub fn disconnect(&mut self) {
        self.executor.disconnect();
    }
}

/// Scoped command prefix; pops itself when dropped
pub struct PrefixGuard<'a> {
    shell: &'a mut RemoteShell,
}

impl Deref for PrefixGuard<'_> {
    type Target = RemoteShell;

    fn deref(&self) -> &RemoteShell {
        self.shell
    }
}

impl DerefMut for PrefixGuard<'_> {
    fn deref_mut(&mut self) -> &mut RemoteShell {
        self.shell
    }
}

impl Drop for PrefixGuard<'_> {
    fn drop(&mut self) {
        self.shell.prefixes.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostTarget;
    use crate::remote::{Connector, DryRunConnector, LocalClient};

    async fn dry_shell(connector: &DryRunConnector) -> RemoteShell {
        let target = HostTarget::parse("root@controller", 22).unwrap();
        RemoteShell::new(connector.connect(&target).await.unwrap())
    }

    #[tokio::test]
    async fn test_run_check_returns_output_for_both_outcomes() {
        let mut shell = RemoteShell::new(Box::new(LocalClient::new("controller")));

        let ok = shell.run_check("Say hello", "echo hello").await.unwrap();
        let failed = shell.run_check_quiet("Fail on purpose", "echo bad >&2; exit 4").await.unwrap();

        assert_eq!(ok.exit_code, 0);
        assert_eq!(ok.text(), "hello");
        assert_eq!(failed.exit_code, 4);
        assert_eq!(failed.stderr.trim(), "bad");
    }

    #[tokio::test]
    async fn test_prefix_applies_only_while_guard_lives() {
        // Arrange
        let connector = DryRunConnector::silent();
        let mut shell = dry_shell(&connector).await;

        // Act
        {
            let mut scoped = shell.with_prefix("export OS_USERNAME=admin");
            scoped.run("keystone user-list").await.unwrap();
            {
                let mut nested = scoped.with_prefix("cd /tmp");
                nested.run("ls").await.unwrap();
            }
        }
        shell.run("uptime").await.unwrap();

        // Assert
        assert_eq!(
            connector.commands(),
            vec![
                "export OS_USERNAME=admin && keystone user-list".to_string(),
                "export OS_USERNAME=admin && cd /tmp && ls".to_string(),
                "uptime".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_run_and_record_time_reads_host_clock() {
        let connector = DryRunConnector::silent()
            .with_response("date +", crate::remote::CommandOutput::ok("Oct 18 14:05\n"));
        let mut shell = dry_shell(&connector).await;

        let record = shell
            .run_and_record_time("systemctl start rabbitmq-server.service", TimestampFormat::Syslog)
            .await
            .unwrap();

        assert_eq!(record.timestamp, "Oct 18 14:05");
        assert_eq!(record.exit_code, 0);
        assert_eq!(connector.commands()[1], "date +\"%b %d %R\"");
    }
}
