// file: src/recipes/vlan.rs
// version: 1.0.0
// guid: 4e2a8c6b-9d1f-4a3e-b5c7-0d2f4a6b8c1e

//! Neutron VxLAN transport and provider VLAN networks
//!
//! Network and compute nodes get a `br-uplink` bridge trunking every VLAN tag
//! of the table over the tunnel interface, patched to `br-vlan`. The
//! controller then creates one external net and subnet per tag in a test
//! tenant and boots instances on each to prove the plumbing.

use super::DeployContext;
use crate::conffile::ConfigEditor;
use crate::config::{ClusterConfig, InterfaceConfig, Role, VlanSettings};
use crate::error::DeployError;
use crate::openstack::{admin_openrc, table, tenant_openrc};
use crate::remote::{shell_quote, RemoteShell};
use crate::report::{notice, CheckReport};
use crate::verify::{check_log_since, TimestampFormat};
use crate::Result;
use tracing::{info, warn};

const VNI_RANGES: &str = "65537:69999";
const OVS_INTERFACE_DRIVER: &str = "neutron.agent.linux.interface.OVSInterfaceDriver";

type Setting = (&'static str, &'static str, String);

fn setting(section: &'static str, key: &'static str, value: impl Into<String>) -> Setting {
    (section, key, value.into())
}

/// `physnet:min:max` spanning every tag of the table
fn network_vlan_ranges(vlan: &VlanSettings) -> String {
    let min = vlan.vlans.iter().map(|v| v.tag).min().unwrap_or(1);
    let max = vlan.vlans.iter().map(|v| v.tag).max().unwrap_or(4094);
    format!("external:{}:{}", min, max)
}

/// ML2 plugin entries; `local_ip` is the host's tunnel address
pub fn ml2_settings(vlan: &VlanSettings, local_ip: &str) -> Vec<Setting> {
    vec![
        setting("ml2", "type_drivers", "vxlan,local,vlan,flat"),
        setting("ml2", "tenant_network_types", "vxlan"),
        setting("ml2", "mechanism_drivers", "openvswitch"),
        setting("ml2_type_vxlan", "vni_ranges", VNI_RANGES),
        setting("ml2_type_vlan", "network_vlan_ranges", network_vlan_ranges(vlan)),
        setting("ml2_type_flat", "flat_networks", "*"),
        setting("ovs", "bridge_mappings", "vlannet:br-vlan"),
        setting("ovs", "tunnel_type", "vxlan"),
        setting("ovs", "tunnel_bridge", "br-tun"),
        setting("ovs", "integration_bridge", "br-int"),
        setting("ovs", "tunnel_id_ranges", VNI_RANGES),
        setting("ovs", "enable_tunneling", "True"),
        setting("ovs", "tenant_network_type", "vxlan"),
        setting("ovs", "local_ip", local_ip),
        setting("agent", "tunnel_types", "vxlan"),
        setting("agent", "l2_population", "False"),
    ]
}

/// L3 agent entries: legacy routers, metadata proxied to the controller
pub fn l3_settings() -> Vec<Setting> {
    vec![
        // both must be empty, not left at their defaults
        setting("DEFAULT", "gateway_external_network_id", ""),
        setting("DEFAULT", "external_network_bridge", ""),
        setting("DEFAULT", "agent_mode", "legacy"),
        setting("DEFAULT", "metadata_port", "8775"),
        setting("DEFAULT", "metadata_ip", "controller"),
        setting("DEFAULT", "enable_metadata_proxy", "True"),
        setting("DEFAULT", "handle_internal_only_routers", "true"),
        setting("DEFAULT", "router_delete_namespaces", "True"),
        setting("DEFAULT", "ovs_use_veth", "false"),
        setting("DEFAULT", "interface_driver", OVS_INTERFACE_DRIVER),
        setting("DEFAULT", "use_namespaces", "true"),
    ]
}

pub fn dhcp_settings() -> Vec<Setting> {
    vec![
        setting("DEFAULT", "dhcp_delete_namespaces", "True"),
        setting("DEFAULT", "enable_metadata_network", "false"),
        setting("DEFAULT", "enable_isolated_metadata", "true"),
        setting("DEFAULT", "use_namespaces", "true"),
        setting("DEFAULT", "dhcp_driver", "neutron.agent.linux.dhcp.Dnsmasq"),
        setting("DEFAULT", "ovs_use_veth", "false"),
        setting("DEFAULT", "interface_driver", OVS_INTERFACE_DRIVER),
        setting(
            "DEFAULT",
            "dhcp_agent_manager",
            "neutron.agent.dhcp_agent.DhcpAgentWithStateReport",
        ),
    ]
}

fn tunnel_of<'c>(config: &'c ClusterConfig, host: &str) -> Result<&'c InterfaceConfig> {
    config.nic(host)?.tunnel.as_ref().ok_or_else(|| {
        DeployError::config(format!("Host '{}' has no tunnel interface configured", host))
    })
}

/// Back up `file` once, then write every entry into it
async fn apply_settings(
    shell: &mut RemoteShell,
    editor: ConfigEditor,
    file: &str,
    settings: Vec<Setting>,
) -> Result<()> {
    editor.backup_conf_file(shell, file).await?;
    for (section, key, value) in settings {
        editor.set_parameter(shell, file, section, key, &value).await?;
    }
    Ok(())
}

/// Create the uplink and VLAN bridges and trunk the tunnel interface into them
pub async fn vxlan_basic_setup(shell: &mut RemoteShell, config: &ClusterConfig) -> Result<()> {
    let device = tunnel_of(config, shell.host())?.device.clone();
    let device = shell_quote(&device);

    shell
        .run_check("Create br-uplink bridge", "ovs-vsctl add-br br-uplink")
        .await?;
    shell
        .run_check("Create br-vlan bridge", "ovs-vsctl add-br br-vlan")
        .await?;
    shell
        .run_check(
            "Add the physical interface as the uplink",
            &format!("ip link set dev {} up", device),
        )
        .await?;
    // room for the VxLAN headers
    shell
        .run_check(
            "Increase MTU on the uplink",
            &format!("ip link set dev {} mtu 1600", device),
        )
        .await?;
    shell
        .run_check(
            "Add a port from br-uplink to the physical interface",
            &format!(
                "ovs-vsctl add-port br-uplink {dev} -- set port {dev} vlan_mode=trunk trunk={trunk}",
                dev = device,
                trunk = config.vlan.trunk()
            ),
        )
        .await?;
    shell
        .run_check(
            "Create a patch port from br-uplink to br-vlan",
            "ovs-vsctl add-port br-uplink patch-to-vlan \
             -- set Interface patch-to-vlan type=patch options:peer=patch-to-uplink",
        )
        .await?;
    shell
        .run_check(
            "Create a patch port from br-vlan to br-uplink",
            "ovs-vsctl add-port br-vlan patch-to-uplink \
             -- set Interface patch-to-uplink type=patch options:peer=patch-to-vlan",
        )
        .await?;
    Ok(())
}

pub async fn set_ml2_conf(shell: &mut RemoteShell, ctx: &DeployContext<'_>) -> Result<()> {
    let config = ctx.config();
    let local_ip = tunnel_of(config, shell.host())?.ip_address.clone();
    apply_settings(
        shell,
        ctx.editor(),
        &config.vlan.ml2_conf_file,
        ml2_settings(&config.vlan, &local_ip),
    )
    .await
}

pub async fn set_l3_conf(shell: &mut RemoteShell, ctx: &DeployContext<'_>) -> Result<()> {
    apply_settings(shell, ctx.editor(), &ctx.config().vlan.l3_agent_file, l3_settings()).await
}

pub async fn set_dhcp_conf(shell: &mut RemoteShell, ctx: &DeployContext<'_>) -> Result<()> {
    apply_settings(shell, ctx.editor(), &ctx.config().vlan.dhcp_agent_file, dhcp_settings()).await
}

/// Bridge setup on every network and compute node
pub async fn basic_setup(ctx: &DeployContext<'_>) -> Result<()> {
    for mut shell in ctx.connect_all(&[Role::Network, Role::Compute]).await? {
        vxlan_basic_setup(&mut shell, ctx.config()).await?;
        shell.disconnect();
    }
    Ok(())
}

/// Write the neutron agent configuration on network and compute nodes, then
/// restart neutron-server on the controller
pub async fn set_up_vxlan(ctx: &DeployContext<'_>) -> Result<()> {
    for mut shell in ctx.connect_all(&[Role::Network, Role::Compute]).await? {
        info!("Configuring neutron agents on {}", shell.host());
        set_ml2_conf(&mut shell, ctx).await?;
        set_l3_conf(&mut shell, ctx).await?;
        set_dhcp_conf(&mut shell, ctx).await?;
        shell.disconnect();
    }

    for mut shell in ctx.connect_all(&[Role::Controller]).await? {
        shell
            .run_check(
                "Restart neutron server",
                "systemctl restart neutron-server.service",
            )
            .await?;
        shell.disconnect();
    }
    Ok(())
}

/// Create the test tenant unless it exists and make admin an admin of it
pub async fn create_tenant(shell: &mut RemoteShell, config: &ClusterConfig) -> Result<()> {
    let tenant = &config.vlan.tenant;
    let mut shell = shell.with_prefix(admin_openrc(config)?);

    let tenants = shell.run("keystone tenant-list").await?;
    if table::contains_name(&tenants.stdout, tenant) {
        notice("Tenant already created. Nothing done");
        return Ok(());
    }

    shell
        .run_check(
            &format!("Create tenant {}", tenant),
            &format!(
                "keystone tenant-create --name {} --description \"VLAN testing\"",
                shell_quote(tenant)
            ),
        )
        .await?;
    shell
        .run_check(
            "Give the admin user the role of admin in the test tenant",
            &format!(
                "keystone user-role-add --user admin --tenant {} --role admin",
                shell_quote(tenant)
            ),
        )
        .await?;
    Ok(())
}

/// One external `vlan<tag>` net per table entry
pub async fn create_nets(shell: &mut RemoteShell, config: &ClusterConfig) -> Result<()> {
    let mut shell = shell.with_prefix(tenant_openrc(config, &config.vlan.tenant)?);
    for entry in &config.vlan.vlans {
        let net = format!("vlan{}", entry.tag);
        shell
            .run_check(
                &format!("Create net {}", net),
                &format!("neutron net-create {} --router:external True", net),
            )
            .await?;
    }
    Ok(())
}

/// One `vlansub<tag>` subnet per table entry, on the matching net
pub async fn create_subnets(shell: &mut RemoteShell, config: &ClusterConfig) -> Result<()> {
    let mut shell = shell.with_prefix(tenant_openrc(config, &config.vlan.tenant)?);
    for entry in &config.vlan.vlans {
        let subnet = format!("vlansub{}", entry.tag);
        shell
            .run_check(
                &format!("Create subnet {}", subnet),
                &format!(
                    "neutron subnet-create vlan{} --name {} {}",
                    entry.tag,
                    subnet,
                    shell_quote(&entry.cidr)
                ),
            )
            .await?;
    }
    Ok(())
}

/// Boot test instances on every VLAN net and check the service logs for
/// errors logged from the moment each boot was issued
pub async fn create_test_instances(
    shell: &mut RemoteShell,
    ctx: &DeployContext<'_>,
    report: &mut CheckReport,
) -> Result<()> {
    let config = ctx.config();
    let vlan = &config.vlan;
    let mut shell = shell.with_prefix(tenant_openrc(config, &vlan.tenant)?);

    let nets = shell.run("neutron net-list").await?;

    for entry in &vlan.vlans {
        let net = format!("vlan{}", entry.tag);
        let Some(net_id) = table::find_id(&nets.stdout, &net) else {
            report.check(false, "", &format!("No net id found for {}", net));
            continue;
        };

        for number in 0..vlan.instances_per_vlan {
            let name = format!("testvlan-{}-{}", entry.tag, number);
            let timestamp = shell.timestamp(TimestampFormat::Iso).await?;

            let label = format!("Create instance {}", name);
            shell
                .run_check(
                    &label,
                    &format!(
                        "nova boot --flavor {} --image {} --security-group default --nic net-id={} {}",
                        shell_quote(&vlan.flavor),
                        shell_quote(&vlan.image),
                        shell_quote(&net_id),
                        name
                    ),
                )
                .await?;

            ctx.wait(vlan.boot_wait_secs, &format!("Waiting for {} to boot", name))
                .await;
            check_log_since(&mut shell, &label, &timestamp, &config.watched_logs, report).await?;
        }
    }
    Ok(())
}

/// Tenant, nets, subnets and test instances on the controller
pub async fn create_vlans(ctx: &DeployContext<'_>) -> Result<CheckReport> {
    let mut report = CheckReport::new();
    for mut shell in ctx.connect_all(&[Role::Controller]).await? {
        create_tenant(&mut shell, ctx.config()).await?;
        create_nets(&mut shell, ctx.config()).await?;
        create_subnets(&mut shell, ctx.config()).await?;
        create_test_instances(&mut shell, ctx, &mut report).await?;
        shell.disconnect();
    }
    Ok(report)
}

pub async fn deploy(ctx: &DeployContext<'_>) -> Result<CheckReport> {
    set_up_vxlan(ctx).await?;
    create_vlans(ctx).await
}

pub async fn delete_bridges(shell: &mut RemoteShell) -> Result<()> {
    for bridge in ["br-uplink", "br-vlan"] {
        shell
            .run_check(
                &format!("Delete bridge {}", bridge),
                &format!("ovs-vsctl del-br {}", bridge),
            )
            .await?;
    }
    Ok(())
}

pub async fn restore_backups(shell: &mut RemoteShell, editor: ConfigEditor, files: &[&str]) -> Result<()> {
    for file in files {
        editor.restore_backup(shell, file).await?;
    }
    Ok(())
}

/// Delete every row a listing returns, one id at a time
async fn remove_all(
    shell: &mut RemoteShell,
    kind: &str,
    list_command: &str,
    delete_command: &str,
) -> Result<usize> {
    let listing = shell.run(list_command).await?;
    if !listing.success() {
        warn!("[{}] '{}' failed, nothing removed", shell.host(), list_command);
        return Ok(0);
    }

    let ids = table::ids(&listing.stdout);
    if ids.is_empty() {
        notice(&format!("[{}] No {} to remove", shell.host(), kind));
    }
    for id in &ids {
        shell
            .run_check(
                &format!("Remove {} {}", kind, id),
                &format!("{} {}", delete_command, shell_quote(id)),
            )
            .await?;
    }
    Ok(ids.len())
}

/// Remove instances, routers, subnets and nets, pausing after each class so
/// neutron can release the ports
pub async fn remove_all_instances(shell: &mut RemoteShell, ctx: &DeployContext<'_>) -> Result<()> {
    let config = ctx.config();
    let mut shell = shell.with_prefix(tenant_openrc(config, &config.vlan.tenant)?);

    let classes = [
        ("instances", "nova list", "nova delete"),
        ("routers", "neutron router-list", "neutron router-delete"),
        ("subnets", "neutron subnet-list", "neutron subnet-delete"),
        ("nets", "neutron net-list", "neutron net-delete"),
    ];
    for (kind, list, delete) in classes {
        remove_all(&mut shell, kind, list, delete).await?;
        ctx.wait(config.vlan.removal_wait_secs, &format!("Waiting for {} removal", kind))
            .await;
    }
    Ok(())
}

/// Tear down bridges, put back the original agent configuration and remove
/// everything the VLAN tests created
pub async fn undeploy(ctx: &DeployContext<'_>) -> Result<()> {
    let vlan = &ctx.config().vlan;

    for mut shell in ctx.connect_all(&[Role::Compute, Role::Network]).await? {
        delete_bridges(&mut shell).await?;
        shell.disconnect();
    }

    let files = [
        vlan.ml2_conf_file.as_str(),
        vlan.l3_agent_file.as_str(),
        vlan.dhcp_agent_file.as_str(),
    ];
    for mut shell in ctx.connect_all(&[Role::Network, Role::Controller]).await? {
        restore_backups(&mut shell, ctx.editor(), &files).await?;
        shell.disconnect();
    }

    for mut shell in ctx.connect_all(&[Role::Controller]).await? {
        remove_all_instances(&mut shell, ctx).await?;
        shell.disconnect();
    }
    Ok(())
}
