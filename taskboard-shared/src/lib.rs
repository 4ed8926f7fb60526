//! # Taskboard Shared Library
//!
//! Domain types, validation, authentication and persistence for the
//! Taskboard API server.
//!
//! ## Module Organization
//!
//! - `models`: Task, label and user rows with their SQL queries
//! - `validation`: Field rules for titles and label names
//! - `auth`: Bearer token verification and owner scoping
//! - `store`: The storage trait with PostgreSQL and in-memory backends
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;
pub mod validation;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
