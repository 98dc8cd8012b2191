// file: src/verify/services.rs
// version: 1.0.0
// guid: 15205194-b59f-47aa-8ab1-b6983678cc3c

//! Post-deployment probes for services and databases

use crate::remote::{shell_quote, RemoteShell};
use crate::report::CheckReport;
use crate::Result;

/// Check that a systemd unit is active
pub async fn service_check(
    shell: &mut RemoteShell,
    unit: &str,
    report: &mut CheckReport,
) -> Result<bool> {
    let active = shell
        .check_silent(&format!("systemctl is-active --quiet {}", shell_quote(unit)))
        .await?;
    Ok(report.check(
        active,
        &format!("{} service is active", unit),
        &format!("{} service is not active", unit),
    ))
}

/// Check that a MariaDB database exists
pub async fn database_check(
    shell: &mut RemoteShell,
    database: &str,
    report: &mut CheckReport,
) -> Result<bool> {
    let output = shell
        .run("mysql -u root --batch --skip-column-names -e 'SHOW DATABASES;'")
        .await?;
    let found = output.success() && output.stdout.lines().any(|l| l.trim() == database);
    Ok(report.check(
        found,
        &format!("Database {} exists", database),
        &format!("Database {} not found", database),
    ))
}
