// file: src/report.rs
// version: 1.0.0
// guid: 21d37a13-9236-4644-8e04-ecdb0cceb0c3

//! Operator-facing status lines and pass/fail check reports

use colored::Colorize;
use tracing::{error, info};

/// Column the status tag is aligned to
const STATUS_COLUMN: usize = 72;

fn pad(msg: &str) -> String {
    format!("{:<width$}", msg, width = STATUS_COLUMN)
}

/// `msg` padded to the status column followed by a green `[ OK ]`
pub fn align_ok(msg: &str) -> String {
    format!("{}{}", pad(msg), "[ OK ]".green().bold())
}

/// `msg` padded to the status column followed by a red `[FAIL]`
pub fn align_fail(msg: &str) -> String {
    format!("{}{}", pad(msg), "[FAIL]".red().bold())
}

/// Informational line, printed in blue
pub fn notice(msg: &str) {
    println!("{}", msg.blue());
    info!("{}", msg);
}

/// Outcome of one verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub label: String,
    pub passed: bool,
}

/// Collects the pass/fail lines of a verification run
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    results: Vec<CheckResult>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check, printing `pass_msg` or `fail_msg` as an aligned status line
    pub fn check(&mut self, passed: bool, pass_msg: &str, fail_msg: &str) -> bool {
        if passed {
            println!("{}", align_ok(pass_msg));
            info!("PASS: {}", pass_msg);
        } else {
            println!("{}", align_fail(fail_msg));
            error!("FAIL: {}", fail_msg);
        }
        self.results.push(CheckResult {
            label: if passed { pass_msg } else { fail_msg }.to_string(),
            passed,
        });
        passed
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Print the totals line
    pub fn print_summary(&self) {
        let line = format!(
            "{} checks: {} passed, {} failed",
            self.results.len(),
            self.passed(),
            self.failed()
        );
        if self.all_passed() {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }
}
