//! Local persistence.
//!
//! The only durable state this tool keeps is the per-user activity
//! counters; everything else lives and dies with one invocation.

mod activity;

pub use activity::{ActivityStore, ActivityTotals};

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Blocking task failed to run to completion.
    #[error("storage task failed: {0}")]
    Task(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
