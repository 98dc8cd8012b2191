// file: src/config/defaults.rs
// version: 1.0.0
// guid: 2f5726cf-a825-42fa-af41-2eab9cde6fd3

//! Built-in cluster tables for the production and development sites

use super::cluster::{
    default_watched_logs, ClusterConfig, EditorKind, ExternalInterface, InterfaceConfig,
    KeystoneEmails, NicConfig, SshSettings, VlanSettings,
};
use super::{Environment, Role};
use std::collections::BTreeMap;
use std::path::PathBuf;

const GATEWAY: &str = "192.168.1.1";
const DNS: &str = "129.128.208.13";
const NETMASK: &str = "255.255.255.0";

impl ClusterConfig {
    /// Built-in configuration for the selected environment
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Production => production(),
            Environment::Development => development(),
        }
    }
}

fn production() -> ClusterConfig {
    let mut roles = BTreeMap::new();
    roles.insert(
        Role::Compute,
        vec![
            "root@compute1".to_string(),
            "root@compute2".to_string(),
            "root@compute3".to_string(),
            "root@compute4".to_string(),
        ],
    );
    roles.insert(Role::Network, vec!["root@network".to_string()]);
    roles.insert(Role::Controller, vec!["root@controller".to_string()]);

    let mut nics = BTreeMap::new();
    nics.insert("controller".to_string(), node("eno1", "eno2", 11));
    nics.insert(
        "network".to_string(),
        network_node("enp2s0f0", "eno2", "enp2s0f1"),
    );
    for (index, name) in ["compute1", "compute2", "compute3", "compute4"]
        .iter()
        .enumerate()
    {
        nics.insert(name.to_string(), node("eno1", "eno2", 41 + index as u8));
    }
    nics.insert("storage1".to_string(), storage_node());

    ClusterConfig {
        roles,
        nics,
        passwords: passwords(),
        keystone_emails: KeystoneEmails::default(),
        log_file: PathBuf::from("/opt/coop2015/coop2015/fabric.log"),
        watched_logs: default_watched_logs(),
        ssh: SshSettings::default(),
        editor: EditorKind::Crudini,
        archive_dir: PathBuf::from("config-archive"),
        vlan: VlanSettings::default(),
    }
}

fn development() -> ClusterConfig {
    let mut roles = BTreeMap::new();
    roles.insert(Role::Compute, vec!["root@compute1".to_string()]);
    roles.insert(Role::Network, vec!["root@network".to_string()]);
    roles.insert(Role::Controller, vec!["root@controller".to_string()]);

    let mut nics = BTreeMap::new();
    nics.insert("controller".to_string(), node("eno1", "enp2s10", 11));
    nics.insert(
        "network".to_string(),
        network_node("eno1", "enp2s10", "enp2s12"),
    );
    nics.insert("compute1".to_string(), node("eno1", "enp2s10", 41));
    nics.insert("storage1".to_string(), storage_node());

    let mut passwords = passwords();
    passwords.insert("CEILOMETER_PASS".to_string(), "34ceilometer_db43".to_string());

    ClusterConfig {
        roles,
        nics,
        passwords,
        keystone_emails: KeystoneEmails::default(),
        log_file: PathBuf::from("/tmp/test.log"),
        watched_logs: default_watched_logs(),
        ssh: SshSettings::default(),
        editor: EditorKind::Crudini,
        archive_dir: PathBuf::from("config-archive"),
        vlan: VlanSettings::default(),
    }
}

/// Controller or compute node: management on .1.x, tunnel on .2.x
fn node(mgt_device: &str, tnl_device: &str, octet: u8) -> NicConfig {
    NicConfig {
        management: InterfaceConfig {
            device: mgt_device.to_string(),
            ip_address: format!("192.168.1.{}", octet),
            netmask: NETMASK.to_string(),
            gateway: Some(GATEWAY.to_string()),
            dns1: Some(DNS.to_string()),
        },
        tunnel: Some(InterfaceConfig {
            device: tnl_device.to_string(),
            ip_address: format!("192.168.2.{}", octet),
            netmask: NETMASK.to_string(),
            gateway: None,
            dns1: None,
        }),
        external: None,
    }
}

fn network_node(mgt_device: &str, tnl_device: &str, ext_device: &str) -> NicConfig {
    let mut nic = node(mgt_device, tnl_device, 21);
    nic.external = Some(ExternalInterface {
        device: ext_device.to_string(),
        kind: "Ethernet".to_string(),
        onboot: "\"yes\"".to_string(),
        bootproto: "\"none\"".to_string(),
        ip_address: "192.168.3.21".to_string(),
    });
    nic
}

fn storage_node() -> NicConfig {
    NicConfig {
        management: InterfaceConfig {
            device: "enp0s25".to_string(),
            ip_address: "192.168.1.31".to_string(),
            netmask: NETMASK.to_string(),
            gateway: Some(GATEWAY.to_string()),
            dns1: Some(DNS.to_string()),
        },
        tunnel: None,
        external: None,
    }
}

fn passwords() -> BTreeMap<String, String> {
    [
        ("METADATA_SECRET", "34m3t$3c43"),
        ("ROOT_SECRET", "34root43"),
        ("RABBIT_PASS", "34RabbGuest43"),
        ("NOVA_DBPASS", "34nova_db43"),
        ("NEUTRON_DBPASS", "34neu43"),
        ("HEAT_DBPASS", "34heat_db43"),
        ("GLANCE_DBPASS", "34glance_db43"),
        ("SAHARA_DBPASS", "34sahara_db43"),
        ("CINDER_DBPASS", "34cinder_db43"),
        ("ADMIN_PASS", "34adm43"),
        ("DEMO_PASS", "34demo43"),
        ("KEYSTONE_DBPASS", "34keydb43"),
        ("NOVA_PASS", "34nova_ks43"),
        ("NEUTRON_PASS", "34neu43"),
        ("HEAT_PASS", "34heat_ks43"),
        ("GLANCE_PASS", "34glance_ks43"),
        ("SAHARA_PASS", "34sahara_ks43"),
        ("CINDER_PASS", "34cinder_ks43"),
        ("SWIFT_PASS", "34Sw1f43"),
        ("TROVE_PASS", "34Tr0v343"),
        ("TROVE_DBPASS", "34Tr0v3db4s343"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
