// file: tests/integration_test.rs
// version: 2.0.0
// guid: 2c4e6a8b-0d1f-4a3c-8e5b-7d9f1b3c5e7a

//! Integration tests for the OpenStack deployment agent

use openstack_deploy_agent::{
    conffile::{backup_path, ini},
    config::{ConfigLoader, EditorKind, Role},
    recipes::{messaging, vlan, DeployContext},
    remote::{CommandOutput, Connector, DryRunConnector, LocalConnector},
    Result,
};
use std::path::Path;
use tempfile::TempDir;

const CLUSTER_YAML: &str = r#"
roles:
  controller: ["root@ctl"]
  network: ["root@net"]
  compute: ["root@cmp1", "root@cmp2:2222"]
nics:
  net:
    management: { device: eth0, ip_address: 10.0.0.2, netmask: 255.255.255.0 }
    tunnel: { device: eth1, ip_address: 10.0.1.2, netmask: 255.255.255.0 }
  cmp1:
    management: { device: eth0, ip_address: 10.0.0.3, netmask: 255.255.255.0 }
    tunnel: { device: eth1, ip_address: 10.0.1.3, netmask: 255.255.255.0 }
  cmp2:
    management: { device: eth0, ip_address: 10.0.0.4, netmask: 255.255.255.0 }
    tunnel: { device: ens4, ip_address: 10.0.1.4, netmask: 255.255.255.0 }
passwords:
  RABBIT_PASS: ${OSDEPLOY_IT_RABBIT}
  ADMIN_PASS: adm
  DEMO_PASS: demo
  KEYSTONE_DBPASS: ksdb
log_file: /tmp/osdeploy-it.log
editor: EDITOR
vlan:
  tenant: it-vlan
  vlans:
    - { tag: 100, cidr: 10.100.0.0/24 }
    - { tag: 200, cidr: 10.200.0.0/24 }
  boot_wait_secs: 0
  removal_wait_secs: 0
  ml2_conf_file: DIR/ml2_conf.ini
  l3_agent_file: DIR/l3_agent.ini
  dhcp_agent_file: DIR/dhcp_agent.ini
"#;

fn write_cluster(dir: &Path, editor: &str) -> std::path::PathBuf {
    let content = CLUSTER_YAML
        .replace("EDITOR", editor)
        .replace("DIR", &dir.to_string_lossy());
    let path = dir.join("cluster.yaml");
    std::fs::write(&path, content).unwrap();
    path
}

fn loader() -> ConfigLoader {
    let mut loader = ConfigLoader::new();
    loader.set_env_var("OSDEPLOY_IT_RABBIT".to_string(), "rabbit-it".to_string());
    loader
}

#[tokio::test]
async fn test_cluster_file_drives_vxlan_setup() -> Result<()> {
    // Arrange
    let temp_dir = TempDir::new().unwrap();
    let path = write_cluster(temp_dir.path(), "crudini");
    let config = loader().load_cluster_config(&path)?;
    let connector = DryRunConnector::silent();
    let ctx = DeployContext::new(&config, &connector);

    // Act
    vlan::basic_setup(&ctx).await?;
    vlan::set_up_vxlan(&ctx).await?;

    // Assert
    let journal = connector.journal();
    let trunk: Vec<_> = journal
        .iter()
        .filter(|e| e.command.contains("vlan_mode=trunk"))
        .map(|e| (e.host.as_str(), e.command.as_str()))
        .collect();
    assert_eq!(
        trunk,
        vec![
            ("net", "ovs-vsctl add-port br-uplink eth1 -- set port eth1 vlan_mode=trunk trunk=100,200"),
            ("cmp1", "ovs-vsctl add-port br-uplink eth1 -- set port eth1 vlan_mode=trunk trunk=100,200"),
            ("cmp2", "ovs-vsctl add-port br-uplink ens4 -- set port ens4 vlan_mode=trunk trunk=100,200"),
        ]
    );

    let ml2 = format!("{}/ml2_conf.ini", temp_dir.path().display());
    assert!(journal.iter().any(|e| e.host == "cmp2"
        && e.command == format!("crudini --set {} ovs local_ip 10.0.1.4", ml2)));
    assert!(journal.iter().any(|e| e.command
        == format!("crudini --set {} ml2_type_vlan network_vlan_ranges external:100:200", ml2)));
    assert_eq!(journal.last().unwrap().host, "ctl");

    Ok(())
}

#[tokio::test]
async fn test_native_agent_config_round_trip_on_local_host() -> Result<()> {
    // Arrange
    let temp_dir = TempDir::new().unwrap();
    let path = write_cluster(temp_dir.path(), "native");
    let config = loader().load_cluster_config(&path)?;
    assert_eq!(config.editor, EditorKind::Native);

    let l3 = temp_dir.path().join("l3_agent.ini");
    let original_l3 = "[DEFAULT]\n# verbose = False\nexternal_network_bridge = br-ex\n";
    std::fs::write(&l3, original_l3).unwrap();
    std::fs::write(temp_dir.path().join("ml2_conf.ini"), "[ml2]\ntype_drivers = gre\n").unwrap();
    std::fs::write(temp_dir.path().join("dhcp_agent.ini"), "").unwrap();

    let connector = DryRunConnector::silent();
    let ctx = DeployContext::new(&config, &connector);
    let target = config.hosts_for(&[Role::Network])?.remove(0);
    let mut shell = openstack_deploy_agent::remote::RemoteShell::new(
        LocalConnector.connect(&target).await?,
    );

    // Act: configure twice, as a re-run would
    for _ in 0..2 {
        vlan::set_ml2_conf(&mut shell, &ctx).await?;
        vlan::set_l3_conf(&mut shell, &ctx).await?;
        vlan::set_dhcp_conf(&mut shell, &ctx).await?;
    }

    // Assert
    let l3_text = std::fs::read_to_string(&l3).unwrap();
    for (section, key, value) in vlan::l3_settings() {
        assert_eq!(ini::count_entries(&l3_text, section, key), 1, "{}", key);
        assert_eq!(ini::get_value(&l3_text, section, key), Some(value));
    }
    let ml2_text = std::fs::read_to_string(temp_dir.path().join("ml2_conf.ini")).unwrap();
    assert_eq!(ini::get_value(&ml2_text, "ovs", "local_ip").as_deref(), Some("10.0.1.2"));
    assert_eq!(
        ini::get_value(&ml2_text, "ml2", "type_drivers").as_deref(),
        Some("vxlan,local,vlan,flat")
    );

    // the backup still holds the pre-edit file after the second pass
    let l3_path = l3.to_string_lossy().to_string();
    assert_eq!(std::fs::read_to_string(backup_path(&l3_path)).unwrap(), original_l3);

    // Act: undo
    let files = [l3_path.as_str()];
    vlan::restore_backups(&mut shell, ctx.editor(), &files).await?;

    // Assert
    assert_eq!(std::fs::read_to_string(&l3).unwrap(), original_l3);
    assert!(!Path::new(&backup_path(&l3_path)).exists());

    Ok(())
}

#[tokio::test]
async fn test_messaging_tdd_uses_configured_secret() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let path = write_cluster(temp_dir.path(), "crudini");
    let mut config = loader().load_cluster_config(&path)?;
    config.archive_dir = temp_dir.path().join("archive");
    let connector = DryRunConnector::silent()
        .with_response("date +", CommandOutput::ok("Oct 18 09:41\n"))
        .with_response("grep -F", CommandOutput::failed(1, ""));
    let ctx = DeployContext::new(&config, &connector);

    let report = messaging::tdd(&ctx).await?;

    assert!(report.all_passed());
    assert_eq!(report.results().len(), 5);
    assert!(connector
        .commands()
        .contains(&"rabbitmqctl change_password guest rabbit-it".to_string()));
    assert!(config
        .archive_dir
        .join("ctl")
        .join("rabbitmq-env.conf.good")
        .exists());

    Ok(())
}

#[test]
fn test_invalid_cluster_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cluster.yaml");
    // network host without a NIC entry
    std::fs::write(
        &path,
        "roles:\n  network: [\"root@net\"]\npasswords:\n  RABBIT_PASS: r\n  ADMIN_PASS: a\n  DEMO_PASS: d\n  KEYSTONE_DBPASS: k\nlog_file: /tmp/x.log\n",
    )
    .unwrap();

    let result = ConfigLoader::new().load_cluster_config(&path);

    assert!(result.is_err());
}
