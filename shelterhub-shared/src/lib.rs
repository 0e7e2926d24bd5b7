//! # ShelterHub Shared Library
//!
//! Types and business logic shared by the ShelterHub API server and the
//! admin CLI.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `store`: Tenant store trait with PostgreSQL and in-memory backends
//! - `auth`: Token validation, capability resolution and the authorization gate
//! - `modules`: Module coordinator, shelter provisioning and repair procedures
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod modules;
pub mod store;

/// Current version of the ShelterHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
