// file: src/remote/dry_run.rs
// version: 1.0.0
// guid: c384075f-fa9b-4305-b4bb-8f8b7e861b91

//! Dry-run transport: prints and records commands instead of running them
//!
//! Every command succeeds with empty output unless a canned response whose
//! pattern occurs in the command was registered. The shared journal lets a
//! caller see exactly which commands a recipe would send to which host.

use super::executor::{CommandExecutor, CommandOutput, Connector};
use crate::config::HostTarget;
use crate::Result;
use std::sync::{Arc, Mutex};
use tracing::info;

/// One command a recipe sent, with the host it was sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub host: String,
    pub command: String,
}

type Journal = Arc<Mutex<Vec<JournalEntry>>>;
type Responses = Arc<Vec<(String, CommandOutput)>>;

pub struct DryRunClient {
    host: String,
    echo: bool,
    responses: Responses,
    journal: Journal,
}

impl DryRunClient {
    fn respond(&self, command: &str) -> CommandOutput {
        self.responses
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl CommandExecutor for DryRunClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        if self.echo {
            println!("[dry-run {}] {}", self.host, command);
        }
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(JournalEntry {
                host: self.host.clone(),
                command: command.to_string(),
            });
        }
        Ok(self.respond(command))
    }

    fn disconnect(&mut self) {}
}

/// Hands out dry-run clients that share one journal
#[derive(Clone, Default)]
pub struct DryRunConnector {
    echo: bool,
    responses: Vec<(String, CommandOutput)>,
    journal: Journal,
}

impl DryRunConnector {
    /// Connector that prints each command to stdout
    pub fn new() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Connector that only records commands
    pub fn silent() -> Self {
        Self::default()
    }

    /// Answer commands containing `pattern` with `output`; first match wins
    pub fn with_response(mut self, pattern: impl Into<String>, output: CommandOutput) -> Self {
        self.responses.push((pattern.into(), output));
        self
    }

    /// Snapshot of every command sent so far
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.journal
            .lock()
            .map(|journal| journal.clone())
            .unwrap_or_default()
    }

    /// Commands sent so far, without host names
    pub fn commands(&self) -> Vec<String> {
        self.journal().into_iter().map(|e| e.command).collect()
    }
}

#[async_trait::async_trait]
impl Connector for DryRunConnector {
    async fn connect(&self, target: &HostTarget) -> Result<Box<dyn CommandExecutor>> {
        info!("Dry run - not connecting to {}", target);
        Ok(Box::new(DryRunClient {
            host: target.host.clone(),
            echo: self.echo,
            responses: Arc::new(self.responses.clone()),
            journal: Arc::clone(&self.journal),
        }))
    }
}
