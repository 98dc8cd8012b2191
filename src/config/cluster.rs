// file: src/config/cluster.rs
// version: 1.0.0
// guid: 0cf4b03d-e202-4505-a115-d03a83e7f5f2

//! Cluster configuration structures

use super::Role;
use crate::error::DeployError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;

/// Secrets every recipe in this crate reads
pub const REQUIRED_SECRETS: &[&str] = &["RABBIT_PASS", "ADMIN_PASS", "DEMO_PASS", "KEYSTONE_DBPASS"];

/// Configuration for a whole deployment run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Role name to ordered host identifiers (`user@host[:port]`)
    pub roles: BTreeMap<Role, Vec<String>>,
    /// Per-host network parameters, keyed by short host name
    #[serde(default)]
    pub nics: BTreeMap<String, NicConfig>,
    /// Named secrets (ADMIN_PASS, RABBIT_PASS, ...)
    pub passwords: BTreeMap<String, String>,
    /// Keystone user e-mail addresses
    #[serde(default)]
    pub keystone_emails: KeystoneEmails,
    /// Local log file for this run
    pub log_file: PathBuf,
    /// Service logs scanned for errors after instance boots
    #[serde(default = "default_watched_logs")]
    pub watched_logs: Vec<String>,
    /// SSH connection settings
    #[serde(default)]
    pub ssh: SshSettings,
    /// How INI keys are written on remote hosts
    #[serde(default)]
    pub editor: EditorKind,
    /// Local directory receiving archived config files
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
    /// VLAN recipe settings
    #[serde(default)]
    pub vlan: VlanSettings,
}

/// Network parameters of one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicConfig {
    pub management: InterfaceConfig,
    #[serde(default)]
    pub tunnel: Option<InterfaceConfig>,
    #[serde(default)]
    pub external: Option<ExternalInterface>,
}

/// Addressing for a single interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub device: String,
    pub ip_address: String,
    pub netmask: String,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub dns1: Option<String>,
}

/// External (provider) interface of a network node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalInterface {
    pub device: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub onboot: String,
    pub bootproto: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeystoneEmails {
    pub admin: String,
    pub demo: String,
}

impl Default for KeystoneEmails {
    fn default() -> Self {
        Self {
            admin: "admin@example.com".to_string(),
            demo: "demo@example.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshSettings {
    /// Port used when a host identifier carries none
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// Private key tried after the SSH agent
    #[serde(default)]
    pub identity_file: Option<String>,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            port: default_ssh_port(),
            identity_file: None,
        }
    }
}

/// Strategy used to set INI keys remotely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    /// `crudini --set` on the remote host
    #[default]
    Crudini,
    /// Fetch, edit locally, write back
    Native,
}

/// One VLAN tag and the CIDR routed on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlanEntry {
    pub tag: u16,
    pub cidr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VlanSettings {
    pub tenant: String,
    pub vlans: Vec<VlanEntry>,
    pub instances_per_vlan: u32,
    pub flavor: String,
    pub image: String,
    /// Seconds to wait after `nova boot` before reading logs
    pub boot_wait_secs: u64,
    /// Seconds to wait between removal passes on undeploy
    pub removal_wait_secs: u64,
    pub ml2_conf_file: String,
    pub l3_agent_file: String,
    pub dhcp_agent_file: String,
}

impl Default for VlanSettings {
    fn default() -> Self {
        Self {
            tenant: "test-vlan".to_string(),
            vlans: vec![
                VlanEntry { tag: 6, cidr: "142.244.63.0/24".to_string() },
                VlanEntry { tag: 208, cidr: "129.128.208.0/24".to_string() },
                VlanEntry { tag: 209, cidr: "129.128.209.0/24".to_string() },
                VlanEntry { tag: 2131, cidr: "129.128.213.0/24".to_string() },
            ],
            instances_per_vlan: 1,
            flavor: "m1.tiny".to_string(),
            image: "cirros-test".to_string(),
            boot_wait_secs: 20,
            removal_wait_secs: 10,
            ml2_conf_file: "/etc/neutron/plugins/ml2/ml2_conf.ini".to_string(),
            l3_agent_file: "/etc/neutron/l3_agent.ini".to_string(),
            dhcp_agent_file: "/etc/neutron/dhcp_agent.ini".to_string(),
        }
    }
}

impl VlanSettings {
    /// Comma separated tag list used for the uplink trunk port
    pub fn trunk(&self) -> String {
        self.vlans
            .iter()
            .map(|v| v.tag.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn default_ssh_port() -> u16 {
    22
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("config-archive")
}

pub(crate) fn default_watched_logs() -> Vec<String> {
    [
        "/var/log/nova/nova-api.log",
        "/var/log/nova/nova-conductor.log",
        "/var/log/nova/nova-scheduler.log",
        "/var/log/nova/nova-cert.log",
        "/var/log/nova/nova-consoleauth.log",
        "/var/log/nova/nova-novncproxy.log",
        "/var/log/glance/api.log",
        "/var/log/glance/registry.log",
        "/var/log/keystone/keystone.log",
        "/var/log/neutron/server.log",
        "/var/log/heat/heat-api.log",
        "/var/log/heat/heat-engine.log",
        "/var/log/rabbitmq/rabbit@localhost.log",
        "/var/log/mariadb/server.log",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// A host reached over SSH, parsed from `user@host[:port]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostTarget {
    pub user: String,
    pub host: String,
    pub port: u16,
}

impl HostTarget {
    /// Parse a host identifier, falling back to `root` and `default_port`
    pub fn parse(id: &str, default_port: u16) -> crate::Result<Self> {
        let id = id.trim();
        let (user, rest) = match id.split_once('@') {
            Some((user, rest)) => (user, rest),
            None => ("root", id),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    DeployError::ValidationError(format!("Invalid port in host id: {}", id))
                })?;
                (host, port)
            }
            None => (rest, default_port),
        };

        if user.is_empty() || host.is_empty() {
            return Err(DeployError::ValidationError(format!(
                "Invalid host id: '{}'",
                id
            )));
        }

        Ok(Self {
            user: user.to_string(),
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}

impl ClusterConfig {
    /// Validate the cluster configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.roles.is_empty() {
            return Err(DeployError::ValidationError(
                "At least one role must be configured".to_string(),
            ));
        }

        for (role, hosts) in &self.roles {
            if hosts.is_empty() {
                return Err(DeployError::ValidationError(format!(
                    "Role '{}' has no hosts; remove it or add hosts",
                    role
                )));
            }
            for id in hosts {
                HostTarget::parse(id, self.ssh.port)?;
            }
        }

        for name in REQUIRED_SECRETS {
            if self.passwords.get(*name).map_or(true, |v| v.is_empty()) {
                return Err(DeployError::ValidationError(format!(
                    "Missing secret: {}",
                    name
                )));
            }
        }

        // VxLAN setup reads the tunnel address of every network/compute host
        for target in self.hosts_for(&[Role::Network, Role::Compute])? {
            let nic = self.nic(&target.host)?;
            if nic.tunnel.is_none() {
                return Err(DeployError::ValidationError(format!(
                    "Host '{}' has no tunnel interface",
                    target.host
                )));
            }
        }

        let mut seen = HashSet::new();
        for entry in &self.vlan.vlans {
            if !seen.insert(entry.tag) {
                return Err(DeployError::ValidationError(format!(
                    "Duplicate VLAN tag: {}",
                    entry.tag
                )));
            }
            if !entry.cidr.contains('/') {
                return Err(DeployError::ValidationError(format!(
                    "VLAN {} has an invalid CIDR: {}",
                    entry.tag, entry.cidr
                )));
            }
        }

        Ok(())
    }

    /// Hosts of the given roles, in role order then table order, without duplicates
    pub fn hosts_for(&self, roles: &[Role]) -> crate::Result<Vec<HostTarget>> {
        let mut targets: Vec<HostTarget> = Vec::new();
        for role in roles {
            let Some(ids) = self.roles.get(role) else {
                continue;
            };
            for id in ids {
                let target = HostTarget::parse(id, self.ssh.port)?;
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        Ok(targets)
    }

    /// Look up the NIC parameters of a host by its short name
    pub fn nic(&self, host: &str) -> crate::Result<&NicConfig> {
        self.nics.get(host).ok_or_else(|| {
            DeployError::ConfigError(format!("No NIC configuration for host '{}'", host))
        })
    }

    /// Look up a named secret
    pub fn secret(&self, name: &str) -> crate::Result<&str> {
        self.passwords
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| DeployError::ConfigError(format!("Missing secret: {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_host_target_parse_variants() {
        let full = HostTarget::parse("admin@controller:2222", 22).unwrap();
        assert_eq!(full.user, "admin");
        assert_eq!(full.host, "controller");
        assert_eq!(full.port, 2222);

        let bare = HostTarget::parse("compute1", 22).unwrap();
        assert_eq!(bare.user, "root");
        assert_eq!(bare.port, 22);
        assert_eq!(bare.to_string(), "root@compute1");

        assert!(HostTarget::parse("root@", 22).is_err());
        assert!(HostTarget::parse("root@network:ssh", 22).is_err());
    }

    #[test]
    fn test_hosts_for_keeps_order_and_dedups() {
        // Arrange
        let mut config = ClusterConfig::for_environment(Environment::Development);
        config
            .roles
            .insert(Role::Network, vec!["root@network".into(), "root@compute1".into()]);

        // Act
        let hosts = config.hosts_for(&[Role::Network, Role::Compute]).unwrap();

        // Assert
        let names: Vec<_> = hosts.iter().map(|h| h.host.as_str()).collect();
        assert_eq!(names, vec!["network", "compute1"]);
    }

    #[test]
    fn test_validate_rejects_empty_role() {
        let mut config = ClusterConfig::for_environment(Environment::Development);
        config.roles.insert(Role::Storage, Vec::new());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("storage"));
    }

    #[test]
    fn test_validate_rejects_duplicate_vlan_tags() {
        let mut config = ClusterConfig::for_environment(Environment::Development);
        config.vlan.vlans.push(VlanEntry {
            tag: 208,
            cidr: "10.1.0.0/24".to_string(),
        });

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate VLAN tag: 208"));
    }

    #[test]
    fn test_validate_requires_secrets() {
        let mut config = ClusterConfig::for_environment(Environment::Development);
        config.passwords.remove("RABBIT_PASS");

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trunk_lists_all_tags() {
        let settings = VlanSettings::default();
        assert_eq!(settings.trunk(), "6,208,209,2131");
    }
}
