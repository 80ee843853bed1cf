//! # tagstore-conn-mgr
//!
//! Opens SQLite connections for the tag store and makes sure every one of
//! them sees the store schema.
//!
//! ## Core Types
//!
//! - **[`SqliteStore`]**: A store file plus the policy used to open connections to it
//! - **[`StoreConfig`]**: Connection settings (busy timeout, journal mode, file creation)
//! - **[`WorkerConnection`]**: One connection owned by exactly one worker
//! - **[`Error`]**: Error type for connection management
//!
//! ## Connection Model
//!
//! - **One connection per worker**: each worker calls [`SqliteStore::connect`] once at
//!   startup and keeps the returned [`WorkerConnection`]. Connections are never pooled
//!   or shared.
//! - **Engine-level locking**: concurrent writers on different connections are
//!   serialized by SQLite itself; `busy_timeout` controls how long a writer waits.
//! - **Idempotent schema**: the schema script runs on every new connection and is a
//!   no-op when the tables already exist.

mod config;
mod database;
mod error;
mod schema;
mod worker;

pub use config::StoreConfig;
pub use database::SqliteStore;
pub use error::{Error, Result};
pub use schema::{SCHEMA, apply_schema};
pub use worker::WorkerConnection;

// Re-exported so dependents can pick a journal mode without naming sqlx paths
pub use sqlx::sqlite::SqliteJournalMode;
