// file: src/config/loader.rs
// version: 1.0.0
// guid: 2ae53ab7-7adb-4d87-931e-d2d5a7ba0bb5

//! Configuration file loading and environment variable substitution

use super::{ClusterConfig, Environment};
use crate::error::DeployError;
use crate::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Resolve the configuration for a run: the file if one is given, the
    /// built-in table for `env` otherwise
    pub fn resolve(&self, env: Environment, path: Option<&str>) -> Result<ClusterConfig> {
        let config = match path {
            Some(path) => {
                let expanded = shellexpand::tilde(path).to_string();
                info!("Loading {} configuration from {}", env, expanded);
                self.load_cluster_config(&expanded)?
            }
            None => {
                debug!("Using built-in {} configuration", env);
                let config = ClusterConfig::for_environment(env);
                config.validate()?;
                config
            }
        };
        Ok(config)
    }

    /// Load cluster configuration from a YAML, TOML or JSON file
    pub fn load_cluster_config<P: AsRef<Path>>(&self, path: P) -> Result<ClusterConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DeployError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let expanded = self.expand_env_vars(&content)?;
        let mut config: ClusterConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&expanded)?,
            Some("json") => serde_json::from_str(&expanded)?,
            _ => serde_yaml::from_str(&expanded)?,
        };

        config.log_file = expand_path(&config.log_file);
        config.archive_dir = expand_path(&config.archive_dir);
        if let Some(key) = config.ssh.identity_file.take() {
            config.ssh.identity_file = Some(shellexpand::tilde(&key).to_string());
        }

        config.validate()?;

        Ok(config)
    }

    /// Expand environment variables in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| DeployError::ConfigError(format!("Invalid regex pattern: {}", e)))?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else if !missing_vars.iter().any(|m| m == var_name) {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(DeployError::ConfigError(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EditorKind, Role};
    use std::io::Write;
    use tempfile::Builder;

    const YAML: &str = r#"
roles:
  controller: ["root@ctl"]
  network: ["root@net"]
nics:
  net:
    management: { device: eth0, ip_address: 10.0.0.2, netmask: 255.255.255.0 }
    tunnel: { device: eth1, ip_address: 10.0.1.2, netmask: 255.255.255.0 }
passwords:
  RABBIT_PASS: ${TEST_RABBIT}
  ADMIN_PASS: a
  DEMO_PASS: d
  KEYSTONE_DBPASS: k
log_file: /tmp/osdeploy.log
editor: native
"#;

    #[test]
    fn test_env_var_expansion() {
        let mut loader = ConfigLoader::new();
        loader.set_env_var("TEST_VAR".to_string(), "test_value".to_string());

        let content = "key: ${TEST_VAR}";
        let result = loader.expand_env_vars(content).unwrap();
        assert_eq!(result, "key: test_value");
    }

    #[test]
    fn test_missing_env_var() {
        let loader = ConfigLoader::new();
        let content = "key: ${OSDEPLOY_SURELY_MISSING_VAR}";

        let result = loader.expand_env_vars(content);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Missing environment variables"));
    }

    #[test]
    fn test_load_yaml_cluster_config() -> Result<()> {
        let mut file = Builder::new().suffix(".yaml").tempfile()?;
        write!(file, "{}", YAML)?;

        let mut loader = ConfigLoader::new();
        loader.set_env_var("TEST_RABBIT".to_string(), "guest-secret".to_string());
        let config = loader.load_cluster_config(file.path())?;

        assert_eq!(config.secret("RABBIT_PASS")?, "guest-secret");
        assert_eq!(config.editor, EditorKind::Native);
        assert_eq!(config.roles[&Role::Controller], vec!["root@ctl".to_string()]);
        // defaults fill the rest
        assert_eq!(config.vlan.tenant, "test-vlan");
        assert!(!config.watched_logs.is_empty());

        Ok(())
    }

    #[test]
    fn test_load_toml_cluster_config() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        write!(
            file,
            r#"
log_file = "/tmp/osdeploy.log"

[roles]
controller = ["root@ctl"]

[passwords]
RABBIT_PASS = "r"
ADMIN_PASS = "a"
DEMO_PASS = "d"
KEYSTONE_DBPASS = "k"
"#
        )?;

        let config = ConfigLoader::new().load_cluster_config(file.path())?;
        assert_eq!(config.hosts_for(&[Role::Controller])?[0].host, "ctl");

        Ok(())
    }

    #[test]
    fn test_resolve_without_file_uses_builtin_table() -> Result<()> {
        let config = ConfigLoader::new().resolve(Environment::Production, None)?;
        assert_eq!(config.hosts_for(&[Role::Compute])?.len(), 4);
        Ok(())
    }
}
