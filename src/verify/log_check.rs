// file: src/verify/log_check.rs
// version: 1.0.0
// guid: 71df2100-d55c-40b1-9d61-c5f74602dfe3

//! Log-window correlation: match recorded command times against error lines
//!
//! A command is flagged when some log line both contains the timestamp
//! recorded right after it ran and mentions `error`, `warning` or `critical`
//! in any letter case. The timestamp match is a plain substring test at the
//! granularity of the recorded string (a minute for the syslog format), so
//! unrelated activity within the same minute can produce false positives,
//! and syslog's space-padded day numbers can produce false negatives.

use crate::remote::{shell_quote, RemoteShell};
use crate::report::CheckReport;
use crate::Result;
use chrono::{DateTime, Local, TimeZone};
use colored::Colorize;
use tracing::debug;

const SEVERITY_KEYWORDS: [&str; 3] = ["error", "warning", "critical"];

fn mentions_severity(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    SEVERITY_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Clock formats the recipes record on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `Oct 18 14:05`, as written to /var/log/messages
    Syslog,
    /// `2026-10-18 14:05:07`, as written by the OpenStack services
    Iso,
}

impl TimestampFormat {
    pub fn pattern(&self) -> &'static str {
        match self {
            TimestampFormat::Syslog => "%b %d %R",
            TimestampFormat::Iso => "%Y-%m-%d %H:%M:%S",
        }
    }

    /// `date` invocation that prints the host clock in this format
    pub fn remote_command(&self) -> String {
        format!("date +\"{}\"", self.pattern())
    }

    /// Pattern truncated to the minute
    pub fn minute_pattern(&self) -> &'static str {
        match self {
            TimestampFormat::Syslog => "%b %d %R",
            TimestampFormat::Iso => "%Y-%m-%d %H:%M",
        }
    }

    /// Minute `time` falls in, rendered the way the logs print it
    pub fn format_minute<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        time.format(self.minute_pattern()).to_string()
    }

    /// Current minute on this machine
    pub fn current_minute(&self) -> String {
        self.format_minute(&Local::now())
    }
}

/// A command together with the host time recorded right after it ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedCommand {
    pub command: String,
    pub exit_code: i32,
    pub timestamp: String,
}

/// Error lines one log file holds for one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFinding {
    pub log_file: String,
    pub lines: Vec<String>,
}

/// Verdict for one recorded command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCheckOutcome {
    pub command: String,
    pub timestamp: String,
    pub findings: Vec<LogFinding>,
}

impl LogCheckOutcome {
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Lines of `log_text` that contain `timestamp` and a severity keyword
pub fn find_error_lines<'a>(log_text: &'a str, timestamp: &str) -> Vec<&'a str> {
    if timestamp.is_empty() {
        return Vec::new();
    }
    log_text
        .lines()
        .filter(|line| line.contains(timestamp) && mentions_severity(line))
        .collect()
}

/// Check every recorded command against every log file and print a verdict
/// per command
pub async fn check_log(
    shell: &mut RemoteShell,
    records: &[TimedCommand],
    log_files: &[String],
    report: &mut CheckReport,
) -> Result<Vec<LogCheckOutcome>> {
    let mut outcomes = Vec::with_capacity(records.len());

    for record in records {
        let mut findings = Vec::new();

        for log_file in log_files {
            // grep narrows by timestamp on the host (-a: logs carry stray bytes);
            // severity is matched here
            let command = format!(
                "grep -F -a -- {} {} 2>/dev/null",
                shell_quote(&record.timestamp),
                shell_quote(log_file)
            );
            let output = shell.run(&command).await?;
            if output.exit_code > 1 {
                debug!("{} unreadable on {}, skipping", log_file, shell.host());
                continue;
            }

            let lines = find_error_lines(&output.stdout, &record.timestamp);
            if !lines.is_empty() {
                findings.push(LogFinding {
                    log_file: log_file.clone(),
                    lines: lines.into_iter().map(str::to_string).collect(),
                });
            }
        }

        for finding in &findings {
            println!(
                "{}",
                format!(
                    "{} shows an error when the following command was run",
                    finding.log_file
                )
                .red()
            );
            println!("{}", format!("Command: {}", record.command).red());
            println!("{}", "Log error message: ".red());
            for line in &finding.lines {
                println!("{}", line.red());
            }
        }

        report.check(
            findings.is_empty(),
            &format!("No error when the command '{}' was run", record.command),
            &format!("Logged errors when the command '{}' was run", record.command),
        );

        outcomes.push(LogCheckOutcome {
            command: record.command.clone(),
            timestamp: record.timestamp.clone(),
            findings,
        });
    }

    Ok(outcomes)
}

/// Scan `log_files` for errors logged at `timestamp`, labelled with `label`
pub async fn check_log_since(
    shell: &mut RemoteShell,
    label: &str,
    timestamp: &str,
    log_files: &[String],
    report: &mut CheckReport,
) -> Result<LogCheckOutcome> {
    let record = TimedCommand {
        command: label.to_string(),
        exit_code: 0,
        timestamp: timestamp.to_string(),
    };
    let mut outcomes = check_log(shell, std::slice::from_ref(&record), log_files, report).await?;
    Ok(outcomes.remove(0))
}
