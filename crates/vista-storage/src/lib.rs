//! Vista Storage Layer
//!
//! SQLite-backed persistence for host settings and per-tab snapshots.
//! Snapshots are what lets an open tab survive a full restart of the host.

mod database;
mod error;
mod migrations;

pub use database::{Database, StoredTab};
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
