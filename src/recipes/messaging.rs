// file: src/recipes/messaging.rs
// version: 1.0.0
// guid: 6f0c1e2d-7b8a-4c3d-9e4f-5a6b7c8d9e01

//! RabbitMQ message broker on the controller

use super::DeployContext;
use crate::config::{ClusterConfig, Role};
use crate::remote::{shell_quote, RemoteShell};
use crate::report::CheckReport;
use crate::verify::{check_log, TimedCommand, TimestampFormat};
use crate::Result;
use tracing::info;

pub const RABBITMQ_ENV_FILE: &str = "/etc/rabbitmq/rabbitmq-env.conf";

/// Where the broker's systemd messages land
pub const MESSAGES_LOG: &str = "/var/log/messages";

fn nodename_command() -> String {
    format!("echo \"NODENAME=rabbit@localhost\" > {}", RABBITMQ_ENV_FILE)
}

fn change_password_command(config: &ClusterConfig) -> Result<String> {
    Ok(format!(
        "rabbitmqctl change_password guest {}",
        shell_quote(config.secret("RABBIT_PASS")?)
    ))
}

/// Install the broker, pin its node name and start it
pub async fn install_rabbitmq(shell: &mut RemoteShell) -> Result<()> {
    shell
        .run_check("Install rabbitmq-server", "yum -y install rabbitmq-server")
        .await?;
    shell
        .run_check("Set NODENAME on rabbitmq-env.conf", &nodename_command())
        .await?;
    shell
        .run_check("Enable rabbitmq service", "systemctl enable rabbitmq-server.service")
        .await?;
    shell
        .run_check("Start rabbitmq service", "systemctl start rabbitmq-server.service")
        .await?;
    Ok(())
}

/// Give the `guest` account the configured password
pub async fn set_guest_password(shell: &mut RemoteShell, config: &ClusterConfig) -> Result<()> {
    shell
        .run_check_quiet("Set password for user guest", &change_password_command(config)?)
        .await?;
    shell
        .run_check("Restart rabbitmq service", "systemctl restart rabbitmq-server.service")
        .await?;
    Ok(())
}

pub async fn deploy(ctx: &DeployContext<'_>) -> Result<()> {
    for mut shell in ctx.connect_all(&[Role::Controller]).await? {
        info!("Deploying RabbitMQ on {}", shell.host());
        install_rabbitmq(&mut shell).await?;
        set_guest_password(&mut shell, ctx.config()).await?;
        shell.disconnect();
    }
    Ok(())
}

/// Replay the broker setup, reading the host clock after every command
pub async fn install_rabbitmq_tdd(
    shell: &mut RemoteShell,
    config: &ClusterConfig,
) -> Result<Vec<TimedCommand>> {
    let commands = [
        nodename_command(),
        "systemctl enable rabbitmq-server.service".to_string(),
        "systemctl start rabbitmq-server.service".to_string(),
        "systemctl restart rabbitmq-server.service".to_string(),
        change_password_command(config)?,
    ];

    let mut records = Vec::with_capacity(commands.len());
    for command in &commands {
        records.push(
            shell
                .run_and_record_time(command, TimestampFormat::Syslog)
                .await?,
        );
    }
    Ok(records)
}

/// Replay the setup, look for broker errors logged while it ran and archive
/// the env file tagged `good` or `bad`
pub async fn tdd(ctx: &DeployContext<'_>) -> Result<CheckReport> {
    let mut report = CheckReport::new();
    let log_files = [MESSAGES_LOG.to_string()];

    for mut shell in ctx.connect_all(&[Role::Controller]).await? {
        let records = install_rabbitmq_tdd(&mut shell, ctx.config()).await?;
        let outcomes = check_log(&mut shell, &records, &log_files, &mut report).await?;

        let status = if outcomes.iter().all(|o| o.passed()) {
            "good"
        } else {
            "bad"
        };
        ctx.editor()
            .archive_config_file(&mut shell, RABBITMQ_ENV_FILE, status, &ctx.config().archive_dir)
            .await?;
        shell.disconnect();
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::remote::{CommandOutput, DryRunConnector};

    #[tokio::test]
    async fn test_deploy_runs_install_then_password() {
        // Arrange
        let config = ClusterConfig::for_environment(Environment::Production);
        let connector = DryRunConnector::silent();
        let ctx = DeployContext::new(&config, &connector);

        // Act
        deploy(&ctx).await.unwrap();

        // Assert
        let commands = connector.commands();
        assert_eq!(commands[0], "yum -y install rabbitmq-server");
        assert_eq!(
            commands[1],
            "echo \"NODENAME=rabbit@localhost\" > /etc/rabbitmq/rabbitmq-env.conf"
        );
        assert_eq!(commands[4], "rabbitmqctl change_password guest 34RabbGuest43");
        assert_eq!(commands.len(), 6);
        assert!(connector.journal().iter().all(|e| e.host == "controller"));
    }

    #[tokio::test]
    async fn test_tdd_flags_logged_errors_and_archives_bad() {
        // Arrange
        let archive = tempfile::tempdir().unwrap();
        let mut config = ClusterConfig::for_environment(Environment::Development);
        config.archive_dir = archive.path().to_path_buf();
        let connector = DryRunConnector::silent()
            .with_response("date +", CommandOutput::ok("Oct 18 14:05\n"))
            .with_response(
                "grep -F",
                CommandOutput::ok("Oct 18 14:05:03 controller rabbitmq-server: ERROR: epmd\n"),
            )
            .with_response("cat /etc/rabbitmq", CommandOutput::ok("NODENAME=rabbit@localhost\n"));
        let ctx = DeployContext::new(&config, &connector);

        // Act
        let report = tdd(&ctx).await.unwrap();

        // Assert
        assert_eq!(report.failed(), 5);
        assert!(archive
            .path()
            .join("controller")
            .join("rabbitmq-env.conf.bad")
            .exists());
    }

    #[tokio::test]
    async fn test_tdd_clean_log_archives_good() {
        let archive = tempfile::tempdir().unwrap();
        let mut config = ClusterConfig::for_environment(Environment::Development);
        config.archive_dir = archive.path().to_path_buf();
        let connector = DryRunConnector::silent()
            .with_response("date +", CommandOutput::ok("Oct 18 14:05\n"))
            .with_response("grep -F", CommandOutput::failed(1, ""));
        let ctx = DeployContext::new(&config, &connector);

        let report = tdd(&ctx).await.unwrap();

        assert!(report.all_passed());
        assert!(archive
            .path()
            .join("controller")
            .join("rabbitmq-env.conf.good")
            .exists());
    }
}
