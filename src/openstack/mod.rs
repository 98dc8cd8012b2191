// file: src/openstack/mod.rs
// version: 1.0.0
// guid: 3c0e3f93-6a43-4c8a-8f4e-0f1b1e5c4b62

//! OpenStack CLI helpers: credential prefixes and table output parsing

pub mod credentials;
pub mod table;

pub use credentials::{
    admin_openrc, create_database_script, keystone_auth_args, service_token_env, tenant_openrc,
    ADMIN_AUTH_URL, PUBLIC_AUTH_URL,
};
