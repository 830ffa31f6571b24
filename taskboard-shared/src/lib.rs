//! # Taskboard Shared Library
//!
//! This crate contains the domain types, storage backends, and business logic
//! used by the Taskboard API server.
//!
//! ## Module Organization
//!
//! - `models`: Users, projects, tasks and their PostgreSQL operations
//! - `auth`: Password hashing, JWT tokens, request authentication
//! - `board`: Task reordering engine (stage/order assignment)
//! - `db`: Connection pool and migrations
//! - `store`: Storage trait with PostgreSQL and in-memory backends

pub mod auth;
pub mod board;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
