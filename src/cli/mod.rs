// file: src/cli/mod.rs
// version: 2.0.0
// guid: e5f6a7b8-c9d0-4123-8456-789a0b1c2d3e

//! Command line interface for the OpenStack deployment agent

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::*;
