//! SQLite-backed activity counters.
//!
//! Keeps one cumulative row per user recording how many unsubscribes and
//! deletions this tool has performed for them. Uses a Mutex-wrapped
//! rusqlite connection with `spawn_blocking` so callers never block the
//! async runtime.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::{Result, StorageError};
use crate::services::{ActivityError, ActivityRecorder};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS activity (
    email TEXT PRIMARY KEY,
    unsubs_count INTEGER NOT NULL DEFAULT 0,
    deleted_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Cumulative counters for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityTotals {
    /// Total unsubscribes recorded.
    pub unsubscribed: i64,
    /// Total deletions recorded.
    pub deleted: i64,
}

/// Thread-safe activity counter store.
#[derive(Clone)]
pub struct ActivityStore {
    conn: Arc<Mutex<Connection>>,
}

impl ActivityStore {
    /// Opens a store at the given path, creating the schema if necessary.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            let conn = Connection::open(&path)?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory store for testing.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection> {
            let conn = Connection::open_in_memory()?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Adds deltas to a user's counters, inserting the row on first use.
    pub async fn upsert(&self, email: &str, unsub_delta: i64, deleted_delta: i64) -> Result<()> {
        let conn = self.conn.clone();
        let email = email.to_string();
        let now = Utc::now().to_rfc3339();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO activity (email, unsubs_count, deleted_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(email) DO UPDATE SET
                     unsubs_count = unsubs_count + excluded.unsubs_count,
                     deleted_count = deleted_count + excluded.deleted_count,
                     updated_at = excluded.updated_at",
                params![email, unsub_delta, deleted_delta, now],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }

    /// Returns a user's cumulative counters, if any activity was recorded.
    pub async fn totals(&self, email: &str) -> Result<Option<ActivityTotals>> {
        let conn = self.conn.clone();
        let email = email.to_string();

        tokio::task::spawn_blocking(move || -> Result<Option<ActivityTotals>> {
            let conn = conn.blocking_lock();
            let totals = conn
                .query_row(
                    "SELECT unsubs_count, deleted_count FROM activity WHERE email = ?1",
                    params![email],
                    |row| {
                        Ok(ActivityTotals {
                            unsubscribed: row.get(0)?,
                            deleted: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(totals)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

#[async_trait]
impl ActivityRecorder for ActivityStore {
    async fn record(
        &self,
        user_email: &str,
        unsub_delta: i64,
        deleted_delta: i64,
    ) -> std::result::Result<(), ActivityError> {
        self.upsert(user_email, unsub_delta, deleted_delta)
            .await
            .map_err(|e| ActivityError::Storage(e.to_string()))
    }
}
