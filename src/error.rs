// file: src/error.rs
// version: 1.0.0
// guid: 9f1287bb-4a31-4c1e-8bfc-8ef778565db9

use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, DeployError>;

/// Error types for the deployment agent
///
/// A remote command exiting non-zero is not an error on its own: the runner
/// hands the exit code back to the recipe. These variants cover transport
/// failures, bad configuration and the few steps a recipe declares fatal.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SSH error: {0}")]
    SshError(String),

    #[error("Command '{command}' failed (exit code {exit_code:?}): {stderr}")]
    ProcessError {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Deployment error: {0}")]
    DeploymentError(String),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl DeployError {
    /// Create a new SSH error
    pub fn ssh(msg: impl Into<String>) -> Self {
        Self::SshError(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a new deployment error
    pub fn deployment(msg: impl Into<String>) -> Self {
        Self::DeploymentError(msg.into())
    }
}
