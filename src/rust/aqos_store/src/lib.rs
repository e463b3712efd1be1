//! Persistence for per-minute metrics snapshots.
//!
//! The core only ever talks to a [`SnapshotStore`]; the SQLite
//! implementation opens a fresh connection for every operation, so an
//! unavailable database costs one failed cycle and nothing more.

mod record;
mod sqlite_store;

pub use record::{SnapshotRecord, StoredSnapshot};
pub use sqlite_store::SqliteStore;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Something that can persist and recall metrics snapshots.
pub trait SnapshotStore {
    /// Persist one snapshot, stamped with `timestamp`.
    fn insert(&self, record: &SnapshotRecord, timestamp: DateTime<Utc>) -> Result<(), StoreError>;

    /// Return up to `limit` stored snapshots, most recent first.
    fn query(&self, limit: usize) -> Result<Vec<StoredSnapshot>, StoreError>;
}

/// Persistence failures. None of these are fatal to the caller.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Couldn't open (or create) the database.
    #[error("Unable to connect to database: {0}")]
    Connect(String),
    /// A statement failed.
    #[error("Database query failed: {0}")]
    Query(String),
    /// A stored row couldn't be decoded.
    #[error("Unable to decode stored snapshot: {0}")]
    Decode(String),
}

impl From<sqlite::Error> for StoreError {
    fn from(e: sqlite::Error) -> Self {
        StoreError::Query(e.to_string())
    }
}
