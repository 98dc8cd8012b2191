// file: src/logging/mod.rs
// version: 1.0.0
// guid: e7d4ff75-1422-460f-a0fe-7ac6e66cb748

//! Logging system for the OpenStack deployment agent

pub mod logger;

pub use logger::init_logger;
