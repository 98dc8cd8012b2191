// file: src/config/mod.rs
// version: 1.0.0
// guid: b5a9161d-94bf-469d-84f6-6291e0bb6827

//! Configuration module for the OpenStack deployment agent
//!
//! Holds the host/role table, per-host NIC parameters, secrets and recipe
//! settings. A [`ClusterConfig`] is built once at start-up for an explicitly
//! selected [`Environment`] and passed by reference to every recipe.

pub mod cluster;
pub mod defaults;
pub mod loader;

pub use cluster::{
    ClusterConfig, EditorKind, ExternalInterface, HostTarget, InterfaceConfig, KeystoneEmails,
    NicConfig, SshSettings, VlanEntry, VlanSettings,
};
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment responsibility shared by a group of hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Controller,
    Network,
    Compute,
    Storage,
}

impl Role {
    /// Get the role as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Controller => "controller",
            Role::Network => "network",
            Role::Compute => "compute",
            Role::Storage => "storage",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "controller" => Ok(Role::Controller),
            "network" => Ok(Role::Network),
            "compute" => Ok(Role::Compute),
            "storage" => Ok(Role::Storage),
            _ => Err(crate::error::DeployError::ValidationError(format!(
                "Unknown role: {}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = crate::error::DeployError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Which cluster the agent is pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    /// Get the environment as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = crate::error::DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            _ => Err(crate::error::DeployError::ValidationError(format!(
                "Unknown environment: {}",
                s
            ))),
        }
    }
}
