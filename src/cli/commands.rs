// file: src/cli/commands.rs
// version: 2.0.0
// guid: a7b8c9d0-e1f2-4345-9678-9a0b1c2d3e4f

//! Command implementations for the CLI

use super::args::{RecipeAction, VlanAction};
use crate::{
    config::{ClusterConfig, Environment, Role},
    error::DeployError,
    logging::logger::with_async_operation_span,
    recipes::{keystone, messaging, vlan, DeployContext},
    remote::Transport,
    report::CheckReport,
    verify::{check_log_since, TimestampFormat},
    Result,
};
use tracing::{error, info};

/// Print the summary and turn failed checks into an error exit
fn finish_report(report: &CheckReport) -> Result<()> {
    report.print_summary();
    if report.all_passed() {
        Ok(())
    } else {
        Err(DeployError::validation(format!(
            "{} of {} checks failed",
            report.failed(),
            report.results().len()
        )))
    }
}

/// RabbitMQ deploy or verification
pub async fn messaging_command(
    config: &ClusterConfig,
    transport: Transport,
    action: RecipeAction,
) -> Result<()> {
    let connector = transport.connector(&config.ssh);
    let ctx = DeployContext::new(config, connector.as_ref());

    match action {
        RecipeAction::Deploy => {
            with_async_operation_span("messaging deploy", ctx.run_id(), || messaging::deploy(&ctx))
                .await?;
            info!("Messaging deployment finished");
            Ok(())
        }
        RecipeAction::Tdd => {
            let report =
                with_async_operation_span("messaging tdd", ctx.run_id(), || messaging::tdd(&ctx))
                    .await?;
            finish_report(&report)
        }
    }
}

/// Keystone deploy or verification
pub async fn keystone_command(
    config: &ClusterConfig,
    transport: Transport,
    action: RecipeAction,
) -> Result<()> {
    let connector = transport.connector(&config.ssh);
    let ctx = DeployContext::new(config, connector.as_ref());

    match action {
        RecipeAction::Deploy => {
            with_async_operation_span("keystone deploy", ctx.run_id(), || keystone::deploy(&ctx))
                .await
                .map_err(|e| {
                    error!("Keystone deployment aborted: {}", e);
                    e
                })?;
            info!("Keystone deployment finished");
            Ok(())
        }
        RecipeAction::Tdd => {
            let report =
                with_async_operation_span("keystone tdd", ctx.run_id(), || keystone::tdd(&ctx))
                    .await?;
            finish_report(&report)
        }
    }
}

/// One of the VLAN/VxLAN recipe steps
pub async fn vlan_command(
    config: &ClusterConfig,
    transport: Transport,
    action: VlanAction,
) -> Result<()> {
    let connector = transport.connector(&config.ssh);
    let ctx = DeployContext::new(config, connector.as_ref());
    let run_id = ctx.run_id().to_string();

    match action {
        VlanAction::Deploy => {
            let report =
                with_async_operation_span("vlan deploy", &run_id, || vlan::deploy(&ctx)).await?;
            finish_report(&report)
        }
        VlanAction::CreateVlans => {
            let report =
                with_async_operation_span("vlan create", &run_id, || vlan::create_vlans(&ctx))
                    .await?;
            finish_report(&report)
        }
        VlanAction::Undeploy => {
            with_async_operation_span("vlan undeploy", &run_id, || vlan::undeploy(&ctx)).await
        }
        VlanAction::SetupVxlan => {
            with_async_operation_span("vxlan setup", &run_id, || vlan::set_up_vxlan(&ctx)).await
        }
        VlanAction::BasicSetup => {
            with_async_operation_span("vxlan bridges", &run_id, || vlan::basic_setup(&ctx)).await
        }
    }
}

/// Scan logs on every host of `role` for errors at `timestamp`, or in the
/// current minute when none is given
pub async fn check_log_command(
    config: &ClusterConfig,
    transport: Transport,
    role: Role,
    timestamp: Option<&str>,
    format: TimestampFormat,
    logs: Vec<String>,
) -> Result<()> {
    let timestamp = match timestamp {
        Some(at) => at.to_string(),
        None => format.current_minute(),
    };
    let timestamp = timestamp.as_str();
    let connector = transport.connector(&config.ssh);
    let ctx = DeployContext::new(config, connector.as_ref());
    let logs = if logs.is_empty() {
        config.watched_logs.clone()
    } else {
        logs
    };

    let mut report = CheckReport::new();
    for mut shell in ctx.connect_all(&[role]).await? {
        let label = format!("[{}] activity at {}", shell.host(), timestamp);
        check_log_since(&mut shell, &label, timestamp, &logs, &mut report).await?;
        shell.disconnect();
    }
    finish_report(&report)
}

/// Set one INI key on every host of `role`
pub async fn set_param_command(
    config: &ClusterConfig,
    transport: Transport,
    role: Role,
    file: &str,
    section: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    let connector = transport.connector(&config.ssh);
    let ctx = DeployContext::new(config, connector.as_ref());

    let mut failed = Vec::new();
    for mut shell in ctx.connect_all(&[role]).await? {
        let output = ctx
            .editor()
            .set_parameter(&mut shell, file, section, key, value)
            .await?;
        if !output.success() {
            failed.push(shell.host().to_string());
        }
        shell.disconnect();
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(DeployError::deployment(format!(
            "Setting [{}] {} in {} failed on: {}",
            section,
            key,
            file,
            failed.join(", ")
        )))
    }
}

/// Configuration with every secret replaced by a mask
fn masked(config: &ClusterConfig) -> ClusterConfig {
    let mut masked = config.clone();
    for value in masked.passwords.values_mut() {
        *value = "********".to_string();
    }
    masked
}

/// Print the resolved configuration, secrets masked
pub fn show_config_command(config: &ClusterConfig, env: Environment, json: bool) -> Result<()> {
    let config = masked(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Environment: {}", env);
    println!("Log file:    {}", config.log_file.display());
    println!("Editor:      {:?}", config.editor);
    println!();
    println!("{:<12} {:<20} {:<12} {:<16}", "Role", "Host", "Tunnel", "Tunnel IP");
    println!("{:-<62}", "");
    for (role, hosts) in &config.roles {
        for id in hosts {
            let short = id.rsplit('@').next().unwrap_or(id);
            let short = short.split(':').next().unwrap_or(short);
            let (device, ip) = config
                .nics
                .get(short)
                .and_then(|nic| nic.tunnel.as_ref())
                .map(|t| (t.device.as_str(), t.ip_address.as_str()))
                .unwrap_or(("-", "-"));
            println!("{:<12} {:<20} {:<12} {:<16}", role.as_str(), id, device, ip);
        }
    }
    println!();
    println!("VLANs (tenant {}):", config.vlan.tenant);
    for entry in &config.vlan.vlans {
        println!("  {:>5}  {}", entry.tag, entry.cidr);
    }
    println!("Secrets: {}", config.passwords.keys().cloned().collect::<Vec<_>>().join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_report_fails_on_any_failed_check() {
        let mut report = CheckReport::new();
        report.check(true, "admin is a role", "admin not a role");
        assert!(finish_report(&report).is_ok());

        report.check(false, "demo is a user", "demo not a user");
        let err = finish_report(&report).unwrap_err();
        assert!(err.to_string().contains("1 of 2 checks failed"));
    }

    #[test]
    fn test_masked_hides_every_secret() {
        let config = ClusterConfig::for_environment(Environment::Production);
        let masked = masked(&config);

        assert_eq!(masked.passwords.len(), config.passwords.len());
        assert!(masked.passwords.values().all(|v| v == "********"));
        assert_eq!(masked.roles, config.roles);
    }

    #[tokio::test]
    async fn test_set_param_over_local_transport() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("dhcp_agent.ini");
        std::fs::write(&conf, "[DEFAULT]\n").unwrap();
        let mut config = ClusterConfig::for_environment(Environment::Development);
        config.editor = crate::config::EditorKind::Native;

        // Act
        set_param_command(
            &config,
            Transport::Local,
            Role::Controller,
            &conf.to_string_lossy(),
            "DEFAULT",
            "use_namespaces",
            "true",
        )
        .await
        .unwrap();

        // Assert
        let text = std::fs::read_to_string(&conf).unwrap();
        assert_eq!(text, "[DEFAULT]\nuse_namespaces = true\n");
        assert!(dir.path().join("dhcp_agent.ini.bak").exists());
    }
}
