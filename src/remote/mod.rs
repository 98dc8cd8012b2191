// file: src/remote/mod.rs
// version: 1.0.0
// guid: 37114983-1c76-4a21-9af6-679adeac1203

//! Remote execution: transports, the connector seam and the checked shell

pub mod dry_run;
pub mod executor;
pub mod local;
pub mod shell;
pub mod ssh;

pub use dry_run::{DryRunConnector, JournalEntry};
pub use executor::{CommandExecutor, CommandOutput, Connector};
pub use local::{LocalClient, LocalConnector};
pub use shell::{PrefixGuard, RemoteShell};
pub use ssh::{SshClient, SshConnector};

use crate::config::SshSettings;

/// How commands reach the hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Ssh,
    Local,
    DryRun,
}

impl Transport {
    /// Build the connector for this transport
    pub fn connector(self, ssh: &SshSettings) -> Box<dyn Connector> {
        match self {
            Transport::Ssh => Box::new(SshConnector::new(ssh)),
            Transport::Local => Box::new(LocalConnector),
            Transport::DryRun => Box::new(DryRunConnector::new()),
        }
    }
}

/// Quote a value for a POSIX shell command line
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:,=@%+".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/etc/keystone/keystone.conf"), "/etc/keystone/keystone.conf");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("34m3t$3c43"), "'34m3t$3c43'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("Oct 18 14:05"), "'Oct 18 14:05'");
    }
}
