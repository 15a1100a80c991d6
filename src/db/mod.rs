//! SQLite-backed store for developers, sprints, bugs, and auth state.
//!
//! The database is the single source of truth; every API handler reads
//! and writes through [`DbHandle`], which serializes access behind a
//! mutex and keeps synchronous SQLite I/O off the async worker threads.

use std::path::Path;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;

use crate::errors::StoreError;

pub mod auth;
pub mod bugs;
pub mod developers;
pub mod sprints;

/// Canonical timestamp format for `created_at` / `expires_at` columns.
/// Second precision keeps values lexicographically comparable.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Async-safe handle to the ledger database.
///
/// Wraps `LedgerDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, preventing synchronous
/// SQLite I/O from tying up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<LedgerDb>>,
}

impl DbHandle {
    pub fn new(db: LedgerDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`). The error
    /// type is anything `StoreError` converts into, so auth flows can
    /// return their own errors through the same seam.
    pub async fn call<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&LedgerDb) -> Result<R, E> + Send + 'static,
        R: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| E::from(StoreError::LockPoisoned))?;
            f(&guard)
        })
        .await
        .map_err(|_| E::from(StoreError::TaskPanicked))?
    }
}

pub struct LedgerDb {
    conn: Connection,
}

impl LedgerDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.run_migrations()?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS developers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                avatar_url TEXT,
                role TEXT NOT NULL DEFAULT 'developer',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sprints (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS bugs (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                sprint_id TEXT REFERENCES sprints(id)
                    ON DELETE SET NULL ON UPDATE CASCADE,
                developer_id TEXT REFERENCES developers(id)
                    ON DELETE SET NULL ON UPDATE CASCADE,
                penalty_amount REAL NOT NULL DEFAULT 0,
                penalty_status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS auth_users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                password_salt TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS auth_sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES auth_users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS magic_links (
                token TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                consumed_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_bugs_sprint ON bugs(sprint_id);
            CREATE INDEX IF NOT EXISTS idx_bugs_developer ON bugs(developer_id);
            CREATE INDEX IF NOT EXISTS idx_bugs_status ON bugs(penalty_status);
            CREATE INDEX IF NOT EXISTS idx_sessions_user ON auth_sessions(user_id);
            ",
        )?;

        // Additive migrations (columns are nullable, safe to re-run).
        // We only ignore "duplicate column" errors — any other error is propagated.
        self.add_column("ALTER TABLE sprints ADD COLUMN penalty_url TEXT")?;
        self.add_column("ALTER TABLE bugs ADD COLUMN image_url TEXT")?;

        Ok(())
    }

    fn add_column(&self, ddl: &str) -> Result<(), StoreError> {
        match self.conn.execute(ddl, []) {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("duplicate column") => Ok(()),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Borrow the underlying connection for ad-hoc assertions in tests.
    #[cfg(test)]
    pub(crate) fn conn_ref(&self) -> &Connection {
        &self.conn
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
