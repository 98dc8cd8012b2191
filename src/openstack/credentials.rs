// file: src/openstack/credentials.rs
// version: 1.0.0
// guid: 0a6a4a5e-5c1f-4b0e-b0e4-d8d8a1f4f7a3

//! Shell credential prefixes for the keystone, nova and neutron clients

use crate::config::ClusterConfig;
use crate::remote::shell_quote;
use crate::Result;

/// Identity admin endpoint
pub const ADMIN_AUTH_URL: &str = "http://controller:35357/v2.0";

/// Identity public endpoint
pub const PUBLIC_AUTH_URL: &str = "http://controller:5000/v2.0";

fn openrc(tenant: &str, user: &str, password: &str, auth_url: &str) -> String {
    format!(
        "export OS_TENANT_NAME={}; export OS_USERNAME={}; export OS_PASSWORD={}; export OS_AUTH_URL={}",
        shell_quote(tenant),
        shell_quote(user),
        shell_quote(password),
        auth_url
    )
}

/// Admin user scoped to the admin tenant
pub fn admin_openrc(config: &ClusterConfig) -> Result<String> {
    tenant_openrc(config, "admin")
}

/// Admin user scoped to `tenant`
pub fn tenant_openrc(config: &ClusterConfig, tenant: &str) -> Result<String> {
    Ok(openrc(tenant, "admin", config.secret("ADMIN_PASS")?, ADMIN_AUTH_URL))
}

/// Bootstrap credentials: the admin token against the admin endpoint
pub fn service_token_env(token: &str) -> String {
    format!(
        "export OS_SERVICE_TOKEN={}; export OS_SERVICE_ENDPOINT={}",
        shell_quote(token),
        ADMIN_AUTH_URL
    )
}

/// `--os-*` arguments authenticating a keystone CLI call
pub fn keystone_auth_args(tenant: &str, user: &str, password: &str) -> String {
    format!(
        "--os-tenant-name {} --os-username {} --os-password {} --os-auth-url {}",
        shell_quote(tenant),
        shell_quote(user),
        shell_quote(password),
        ADMIN_AUTH_URL
    )
}

/// SQL creating `database` and granting its same-named user local and
/// remote access
pub fn create_database_script(database: &str, password: &str) -> String {
    let password = password.replace('\'', "''");
    format!(
        "CREATE DATABASE IF NOT EXISTS {db}; \
         GRANT ALL PRIVILEGES ON {db}.* TO '{db}'@'localhost' IDENTIFIED BY '{pw}'; \
         GRANT ALL PRIVILEGES ON {db}.* TO '{db}'@'%' IDENTIFIED BY '{pw}';",
        db = database,
        pw = password
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_tenant_openrc_swaps_only_the_tenant() {
        let config = ClusterConfig::for_environment(Environment::Production);

        let admin = admin_openrc(&config).unwrap();
        let tenant = tenant_openrc(&config, "test-vlan").unwrap();

        assert_eq!(
            admin,
            "export OS_TENANT_NAME=admin; export OS_USERNAME=admin; \
             export OS_PASSWORD=34adm43; export OS_AUTH_URL=http://controller:35357/v2.0"
        );
        assert_eq!(tenant, admin.replace("OS_TENANT_NAME=admin", "OS_TENANT_NAME=test-vlan"));
    }

    #[test]
    fn test_secrets_are_quoted() {
        let env = service_token_env("a1b2$c3");
        assert_eq!(
            env,
            "export OS_SERVICE_TOKEN='a1b2$c3'; export OS_SERVICE_ENDPOINT=http://controller:35357/v2.0"
        );
    }

    #[test]
    fn test_create_database_script() {
        let sql = create_database_script("keystone", "34keydb43");
        assert!(sql.starts_with("CREATE DATABASE IF NOT EXISTS keystone;"));
        assert!(sql.contains("TO 'keystone'@'localhost' IDENTIFIED BY '34keydb43'"));
        assert!(sql.contains("TO 'keystone'@'%' IDENTIFIED BY '34keydb43'"));
    }
}
