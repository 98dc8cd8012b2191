// file: src/recipes/mod.rs
// version: 1.0.0
// guid: 9a43e6a1-0b6a-49d5-9e55-1c4f1a7b6c0e

//! Deployment recipes and the role dispatch they share
//!
//! Every recipe is a flat sequence of checked commands run against the hosts
//! of one or more roles. Hosts are visited one after another in role-table
//! order; a host listed under two of the requested roles is visited once.

pub mod keystone;
pub mod messaging;
pub mod vlan;

use crate::conffile::ConfigEditor;
use crate::config::{ClusterConfig, HostTarget, Role};
use crate::remote::{Connector, RemoteShell};
use crate::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Everything a recipe needs: the cluster table, a way to reach hosts and
/// the id tagging this run's log lines
pub struct DeployContext<'a> {
    config: &'a ClusterConfig,
    connector: &'a dyn Connector,
    editor: ConfigEditor,
    run_id: String,
}

impl<'a> DeployContext<'a> {
    pub fn new(config: &'a ClusterConfig, connector: &'a dyn Connector) -> Self {
        Self {
            config,
            connector,
            editor: ConfigEditor::new(config.editor),
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn config(&self) -> &'a ClusterConfig {
        self.config
    }

    pub fn editor(&self) -> ConfigEditor {
        self.editor
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Hosts of `roles`, in table order, without repeats
    pub fn hosts(&self, roles: &[Role]) -> Result<Vec<HostTarget>> {
        self.config.hosts_for(roles)
    }

    /// Open a shell on one host
    pub async fn open(&self, target: &HostTarget) -> Result<RemoteShell> {
        debug!("Opening shell on {}", target);
        let executor = self.connector.connect(target).await?;
        Ok(RemoteShell::new(executor))
    }

    /// Open a shell on every host of `roles`
    pub async fn connect_all(&self, roles: &[Role]) -> Result<Vec<RemoteShell>> {
        let mut shells = Vec::new();
        for target in self.hosts(roles)? {
            shells.push(self.open(&target).await?);
        }
        Ok(shells)
    }

    /// Sleep for `secs` seconds behind a spinner
    pub async fn wait(&self, secs: u64, message: &str) {
        if secs == 0 {
            return;
        }
        info!("{} ({}s)", message, secs);

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));

        tokio::time::sleep(Duration::from_secs(secs)).await;
        spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::remote::DryRunConnector;

    #[tokio::test]
    async fn test_connect_all_visits_role_hosts_once() {
        let config = ClusterConfig::for_environment(Environment::Production);
        let connector = DryRunConnector::silent();
        let ctx = DeployContext::new(&config, &connector);

        let shells = ctx
            .connect_all(&[Role::Network, Role::Compute, Role::Network])
            .await
            .unwrap();

        let hosts: Vec<&str> = shells.iter().map(|s| s.host()).collect();
        assert_eq!(hosts, vec!["network", "compute1", "compute2", "compute3", "compute4"]);
    }

    #[tokio::test]
    async fn test_wait_zero_returns_immediately() {
        let config = ClusterConfig::for_environment(Environment::Development);
        let connector = DryRunConnector::silent();
        let ctx = DeployContext::new(&config, &connector);

        let started = std::time::Instant::now();
        ctx.wait(0, "Waiting for instances").await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(ctx.run_id().len(), 36);
    }
}
