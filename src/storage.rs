//! Embedded transactional key-value store.
//!
//! A thin bucket/sequence layer over SQLite in WAL mode. Writers take the
//! database write lock up front (`BEGIN IMMEDIATE`) so at most one write
//! transaction is in flight at a time; readers run on their own snapshot and
//! never wait for the writer. The busy timeout bounds how long a writer waits
//! for the lock.

use crate::error::{Result, UrlShareError};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA: &str = r#"
    PRAGMA journal_mode=WAL;
    CREATE TABLE IF NOT EXISTS entries (
        bucket  TEXT NOT NULL,
        key     TEXT NOT NULL,
        value   TEXT NOT NULL,
        PRIMARY KEY (bucket, key)
    ) WITHOUT ROWID;
    CREATE TABLE IF NOT EXISTS sequences (
        bucket  TEXT PRIMARY KEY,
        value   INTEGER NOT NULL
    );
"#;

/// Process-wide handle on the database file.
///
/// Opening validates the file and creates the schema once. Every transaction
/// gets its own engine connection, so the handle is `Send + Sync` and can be
/// shared through an `Arc` without any extra locking.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self { path, busy_timeout };
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA)?;
        info!(path = %store.path.display(), "store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Run `f` inside a read-only transaction.
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tx<'_>) -> Result<T>,
    {
        let mut conn = self.connect()?;
        let tx = Tx {
            inner: conn.transaction_with_behavior(TransactionBehavior::Deferred)?,
            writable: false,
        };
        // Dropping a read transaction rolls it back, which is all it needs.
        f(&tx)
    }

    /// Run `f` inside the single write transaction and commit if it succeeds.
    ///
    /// Blocks until the previous writer finishes or the busy timeout expires,
    /// in which case the engine error surfaces as `StorageFailure`.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tx<'_>) -> Result<T>,
    {
        let mut conn = self.connect()?;
        let tx = Tx {
            inner: conn.transaction_with_behavior(TransactionBehavior::Immediate)?,
            writable: true,
        };
        let out = f(&tx)?;
        tx.inner.commit()?;
        debug!("write transaction committed");
        Ok(out)
    }
}

pub struct Tx<'conn> {
    inner: Transaction<'conn>,
    writable: bool,
}

impl<'conn> Tx<'conn> {
    pub fn bucket<'tx>(&'tx self, name: &'tx str) -> Bucket<'tx> {
        Bucket {
            conn: &self.inner,
            name,
            writable: self.writable,
        }
    }
}

/// A named key namespace inside a transaction.
pub struct Bucket<'tx> {
    conn: &'tx Connection,
    name: &'tx str,
    writable: bool,
}

impl<'tx> Bucket<'tx> {
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM entries WHERE bucket = ?1 AND key = ?2",
                params![self.name, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_writable()?;
        self.conn.execute(
            "INSERT INTO entries (bucket, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(bucket, key) DO UPDATE SET value=excluded.value",
            params![self.name, key, value],
        )?;
        Ok(())
    }

    /// Advance and return the bucket's sequence counter. The first value is 1.
    pub fn next_sequence(&self) -> Result<u64> {
        self.ensure_writable()?;
        self.conn.execute(
            "INSERT INTO sequences (bucket, value) VALUES (?1, 1)
             ON CONFLICT(bucket) DO UPDATE SET value = value + 1",
            params![self.name],
        )?;
        let value: i64 = self.conn.query_row(
            "SELECT value FROM sequences WHERE bucket = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(value as u64)
    }

    /// All pairs in the bucket, last key first (byte-wise key order).
    pub fn entries_rev(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM entries WHERE bucket = ?1 ORDER BY key DESC")?;
        let rows = stmt.query_map(params![self.name], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(UrlShareError::StorageFailure(rusqlite::Error::InvalidQuery))
        }
    }
}
