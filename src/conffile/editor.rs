// file: src/conffile/editor.rs
// version: 1.0.0
// guid: 8c7348b0-9d17-4b6b-9f23-3e22d96b996c

//! Remote INI editing with the copy-before-first-edit backup convention

use super::ini;
use crate::config::EditorKind;
use crate::remote::{shell_quote, CommandOutput, RemoteShell};
use crate::report::{align_fail, notice};
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Heredoc delimiter used when writing files back
const EOF_MARKER: &str = "OSDEPLOY_CONF_EOF";

/// What `backup_once` found or did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupOutcome {
    Created,
    AlreadyPresent,
    Failed,
}

/// Path of the one-time backup of `file`
pub fn backup_path(file: &str) -> String {
    format!("{}.bak", file)
}

/// Sets INI keys on a remote host
#[derive(Debug, Clone, Copy)]
pub struct ConfigEditor {
    kind: EditorKind,
}

impl ConfigEditor {
    pub fn new(kind: EditorKind) -> Self {
        Self { kind }
    }

    /// Copy `file` to `file.bak` unless a backup already exists
    pub async fn backup_once(&self, shell: &mut RemoteShell, file: &str) -> Result<BackupOutcome> {
        let backup = backup_path(file);
        if shell
            .check_silent(&format!("[ -e {} ]", shell_quote(&backup)))
            .await?
        {
            debug!("[{}] {} already exists", shell.host(), backup);
            return Ok(BackupOutcome::AlreadyPresent);
        }

        let output = shell
            .run_check(
                &format!("Make backup file {}", backup),
                &format!("cp {} {}", shell_quote(file), shell_quote(&backup)),
            )
            .await?;
        Ok(if output.success() {
            BackupOutcome::Created
        } else {
            BackupOutcome::Failed
        })
    }

    /// Explicit backup step; tells the operator when nothing is done
    pub async fn backup_conf_file(&self, shell: &mut RemoteShell, file: &str) -> Result<BackupOutcome> {
        let outcome = self.backup_once(shell, file).await?;
        if outcome == BackupOutcome::AlreadyPresent {
            notice(&format!(
                "[{}] Backup file for {} already exists and will not be rewritten",
                shell.host(),
                file
            ));
        }
        Ok(outcome)
    }

    /// Set `key = value` in `[section]` of `file`, backing the file up first
    pub async fn set_parameter(
        &self,
        shell: &mut RemoteShell,
        file: &str,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<CommandOutput> {
        self.backup_once(shell, file).await?;

        let label = format!("Set [{}] {} in {}", section, key, file);
        match self.kind {
            EditorKind::Crudini => {
                let command = format!(
                    "crudini --set {} {} {} {}",
                    shell_quote(file),
                    shell_quote(section),
                    shell_quote(key),
                    shell_quote(value)
                );
                shell.run_check(&label, &command).await
            }
            EditorKind::Native => {
                let current = shell.run(&format!("cat {}", shell_quote(file))).await?;
                let text = if current.success() {
                    current.stdout
                } else if shell
                    .check_silent(&format!("[ -e {} ]", shell_quote(file)))
                    .await?
                {
                    // present but unreadable: writing back would lose its content
                    let msg = format!("[{}] {}", shell.host(), label);
                    println!("{}", align_fail(&msg));
                    error!("{}: cannot read {}: {}", msg, file, current.stderr.trim_end());
                    return Ok(current);
                } else {
                    debug!("{} does not exist, starting from an empty file", file);
                    String::new()
                };
                let updated = ini::set_value(&text, section, key, value);
                shell.run_check(&label, &write_command(file, &updated)).await
            }
        }
    }

    /// Put `file.bak` back in place of `file`, if there is one
    pub async fn restore_backup(&self, shell: &mut RemoteShell, file: &str) -> Result<CommandOutput> {
        let backup = shell_quote(&backup_path(file));
        let target = shell_quote(file);
        let command = format!(
            "if [ -e {backup} ]; then rm -f {target}; mv {backup} {target}; \
             else echo No backup file; fi"
        );
        let output = shell
            .run_check(&format!("Restore backup for {}", file), &command)
            .await?;
        if output.text() == "No backup file" {
            warn!("[{}] no backup to restore for {}", shell.host(), file);
        }
        Ok(output)
    }

    /// Copy a remote file into `archive_dir/<host>/<name>.<status>`
    ///
    /// Returns `None` when the remote file cannot be read.
    pub async fn archive_config_file(
        &self,
        shell: &mut RemoteShell,
        file: &str,
        status: &str,
        archive_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let output = shell.run(&format!("cat {}", shell_quote(file))).await?;
        if !output.success() {
            warn!("[{}] could not read {} for archiving", shell.host(), file);
            return Ok(None);
        }

        let name = Path::new(file)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "config".to_string());
        let dir = archive_dir.join(shell.host());
        tokio::fs::create_dir_all(&dir).await?;
        let dest = dir.join(format!("{}.{}", name, status));
        tokio::fs::write(&dest, output.stdout.as_bytes()).await?;

        info!("Archived {}:{} to {}", shell.host(), file, dest.display());
        Ok(Some(dest))
    }
}

/// Shell command replacing `file` with `content`
fn write_command(file: &str, content: &str) -> String {
    let mut body = content.to_string();
    if !body.ends_with('\n') {
        body.push('\n');
    }
    format!(
        "cat > {} << '{}'\n{}{}",
        shell_quote(file),
        EOF_MARKER,
        body,
        EOF_MARKER
    )
}
