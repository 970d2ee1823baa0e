//! Storage error types
//!
//! Every variant is a server-side failure. None of them are caused by
//! client input: unknown ids are `Ok(None)` / `Ok(false)`, not errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for contact store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Contact store failures
#[derive(Debug, Error)]
pub enum StorageError {
    /// The directory holding the database file could not be created
    #[error("Failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite rejected a statement or returned an unreadable row
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// `close()` was called; the connection is gone
    #[error("Contact store is closed")]
    Closed,

    /// A thread panicked while holding the connection
    #[error("Contact store lock poisoned")]
    Poisoned,

    /// The blocking task running the statement did not complete
    #[error("Storage task failed: {0}")]
    Task(String),
}
