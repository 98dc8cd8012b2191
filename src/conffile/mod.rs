// file: src/conffile/mod.rs
// version: 1.0.0
// guid: fa6b0782-cfc8-476d-bf3c-c969be8551e5

//! Configuration-file editing on remote hosts

pub mod editor;
pub mod ini;

pub use editor::{backup_path, BackupOutcome, ConfigEditor};
