//! Music catalog server library
//!
//! Exposes the internal modules for the binary and the integration tests.

pub mod catalog_store;
pub mod config;
pub mod server;
pub mod sqlite_persistence;

pub use catalog_store::{CatalogError, SqliteCatalogStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
