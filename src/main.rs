// file: src/main.rs
// version: 2.0.0
// guid: b8c9d0e1-f2a3-4456-8789-0a1b2c3d4e5f

//! OpenStack Deploy Agent - Main entry point

use clap::Parser;
use openstack_deploy_agent::{
    cli::{
        args::{Cli, Commands},
        commands::*,
    },
    config::{ConfigLoader, Environment},
    logging::logger,
    remote::Transport,
    Result,
};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env: Environment = cli.env.into();
    let transport: Transport = cli.transport.into();

    // Resolve the cluster table once; every command borrows it
    let loader = ConfigLoader::new();
    let config = loader.resolve(env, cli.config.as_deref())?;

    // Initialize logging
    let log_file = cli.log_file.clone().unwrap_or_else(|| config.log_file.clone());
    if let Err(e) = logger::init_logger(cli.verbose, cli.quiet, Some(&log_file)) {
        logger::init_logger(cli.verbose, cli.quiet, None)?;
        warn!("{}; logging to stderr only", e);
    }
    info!(
        "openstack-deploy-agent {} ({} environment, {:?} transport)",
        openstack_deploy_agent::VERSION,
        env,
        transport
    );

    // Set up signal handling for graceful shutdown
    let shutdown_signal = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        warn!("Received Ctrl+C, initiating shutdown...");
    };

    // Execute command with signal handling
    let command_future = async {
        match cli.command {
            Commands::Messaging { action } => messaging_command(&config, transport, action).await,
            Commands::Keystone { action } => keystone_command(&config, transport, action).await,
            Commands::Vlan { action } => vlan_command(&config, transport, action).await,
            Commands::CheckLog {
                role,
                at,
                format,
                logs,
            } => {
                check_log_command(&config, transport, role.into(), at.as_deref(), format.into(), logs)
                    .await
            }
            Commands::SetParam {
                role,
                file,
                section,
                key,
                value,
            } => {
                set_param_command(&config, transport, role.into(), &file, &section, &key, &value)
                    .await
            }
            Commands::ShowConfig { json } => show_config_command(&config, env, json),
        }
    };

    // Run command with signal handling
    tokio::select! {
        result = command_future => result,
        _ = shutdown_signal => {
            warn!("Deployment interrupted by user");
            std::process::exit(130); // Standard exit code for Ctrl+C
        }
    }
}
