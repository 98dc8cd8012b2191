// file: src/verify/mod.rs
// version: 1.0.0
// guid: 315d8354-3af5-44c1-935e-8975135100e9

//! Verification helpers used by the recipes' TDD steps

pub mod log_check;
pub mod services;

pub use log_check::{
    check_log, check_log_since, find_error_lines, LogCheckOutcome, LogFinding, TimedCommand,
    TimestampFormat,
};
pub use services::{database_check, service_check};
