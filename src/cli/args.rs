// file: src/cli/args.rs
// version: 2.0.0
// guid: f6a7b8c9-d0e1-4234-8567-89a0b1c2d3e4

//! Command line argument definitions

use crate::config::{Environment, Role};
use crate::remote::Transport;
use crate::verify::TimestampFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "openstack-deploy-agent")]
#[command(about = "Role-based OpenStack deployment over SSH")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Cluster the built-in host table describes
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        env = "OSDEPLOY_ENV",
        default_value = "development"
    )]
    pub env: EnvArg,

    /// Cluster configuration file (YAML, TOML or JSON) replacing the built-in table
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, value_enum, default_value = "ssh")]
    pub transport: TransportArg,

    /// Log file, instead of the one the configuration names
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// RabbitMQ on the controller
    Messaging {
        #[command(subcommand)]
        action: RecipeAction,
    },

    /// Keystone identity service on the controller
    Keystone {
        #[command(subcommand)]
        action: RecipeAction,
    },

    /// Neutron VxLAN transport and test VLANs
    Vlan {
        #[command(subcommand)]
        action: VlanAction,
    },

    /// Look for errors logged at a host timestamp
    CheckLog {
        #[arg(short, long, value_enum)]
        role: RoleArg,

        #[arg(long, help = "Timestamp as it appears in the logs, e.g. \"2026-10-18 14:05\". Defaults to the current minute")]
        at: Option<String>,

        /// Log timestamp style used when --at is not given
        #[arg(long, value_enum, default_value = "iso")]
        format: FormatArg,

        #[arg(long = "log", help = "Log file to scan; repeatable. Defaults to the watched logs")]
        logs: Vec<String>,
    },

    /// Set one INI key on every host of a role
    SetParam {
        #[arg(short, long, value_enum)]
        role: RoleArg,

        #[arg(short, long)]
        file: String,

        #[arg(short, long)]
        section: String,

        #[arg(short, long)]
        key: String,

        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },

    /// Print the resolved cluster configuration
    ShowConfig {
        #[arg(short, long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipeAction {
    /// Install and configure
    Deploy,
    /// Verify a deployment
    Tdd,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VlanAction {
    /// Configure VxLAN then create the test VLANs
    Deploy,
    /// Remove bridges, restore agent configuration, delete test resources
    Undeploy,
    /// Neutron agent configuration and server restart
    SetupVxlan,
    /// Test tenant, nets, subnets and instances
    CreateVlans,
    /// Uplink and VLAN bridges on network and compute nodes
    BasicSetup,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum EnvArg {
    Production,
    Development,
}

impl From<EnvArg> for Environment {
    fn from(env: EnvArg) -> Self {
        match env {
            EnvArg::Production => Environment::Production,
            EnvArg::Development => Environment::Development,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum TransportArg {
    Ssh,
    Local,
    DryRun,
}

impl From<TransportArg> for Transport {
    fn from(transport: TransportArg) -> Self {
        match transport {
            TransportArg::Ssh => Transport::Ssh,
            TransportArg::Local => Transport::Local,
            TransportArg::DryRun => Transport::DryRun,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    /// `Oct 18 14:05`, as in /var/log/messages
    Syslog,
    /// `2026-10-18 14:05`, as in the OpenStack service logs
    Iso,
}

impl From<FormatArg> for TimestampFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Syslog => TimestampFormat::Syslog,
            FormatArg::Iso => TimestampFormat::Iso,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum RoleArg {
    Controller,
    Network,
    Compute,
    Storage,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Controller => Role::Controller,
            RoleArg::Network => Role::Network,
            RoleArg::Compute => Role::Compute,
            RoleArg::Storage => Role::Storage,
        }
    }
}
