//! SQLite backend for tutorlink.
//!
//! A single [`SqliteBackend`] implements both external boundaries — the
//! identity provider (accounts with argon2 password hashes) and the
//! document store (schemaless JSON documents with merge-write support) —
//! against one database file, or in-memory for tests. Wraps
//! [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteBackend;
