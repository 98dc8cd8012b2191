// file: src/lib.rs
// version: 3.0.0
// guid: d82472d1-7f0f-4eb4-b0a3-6e1547103eb4

//! # OpenStack Deploy Agent
//!
//! Installs and configures OpenStack services on a small, role-tagged
//! cluster over SSH. Every step is a checked remote command; verification
//! steps correlate command times with errors in the hosts' logs.

pub mod cli;
pub mod conffile;
pub mod config;
pub mod error;
pub mod logging;
pub mod openstack;
pub mod recipes;
pub mod remote;
pub mod report;
pub mod verify;

pub use error::{DeployError, Result};

/// Version information for the agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
