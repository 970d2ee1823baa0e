//! SQLite-backed contact store
//!
//! ## Single writer
//!
//! The store owns exactly one connection behind a mutex. Every statement
//! runs on tokio's blocking pool while holding that lock, so writes are
//! serialized in lock-acquisition order and `id` order matches insert order.
//!
//! ## Read-after-write
//!
//! `create` inserts and then selects the new row under the same lock. The
//! returned record is what the database holds, including the `id` and
//! `created_at` it assigned.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::errors::{StorageError, StorageResult};
use super::record::{ContactSubmission, NewContact, Page, PageRequest, Pagination};

/// Busy timeout for a second process touching the same file
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Text layout of `created_at` (UTC, millisecond precision)
const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT    NOT NULL,
    email      TEXT    NOT NULL,
    message    TEXT    NOT NULL,
    ip_address TEXT,
    created_at TEXT    NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
);
CREATE INDEX IF NOT EXISTS contacts_created_at ON contacts (created_at);
";

const SELECT_COLUMNS: &str = "id, name, email, message, ip_address, created_at";

/// Handle to the contact table.
///
/// Cloning is cheap and shares the same connection. Opened once at startup,
/// released once with [`ContactStore::close`].
#[derive(Clone)]
pub struct ContactStore {
    conn: Arc<Mutex<Option<Connection>>>,
    path: Option<PathBuf>,
}

impl ContactStore {
    /// Open (or create) the database file and ensure the schema.
    ///
    /// Creates the parent directory when missing. Never drops or rewrites
    /// existing data.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        Self::bootstrap(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            path: Some(path.to_path_buf()),
        })
    }

    /// Private in-memory database, gone when the store is dropped
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            path: None,
        })
    }

    fn bootstrap(conn: &Connection) -> StorageResult<()> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // In-memory databases answer "memory"; only file databases switch to WAL.
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert a submission and return the row as persisted
    pub async fn create(&self, contact: NewContact) -> StorageResult<ContactSubmission> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO contacts (name, email, message, ip_address) VALUES (?1, ?2, ?3, ?4)",
                params![contact.name, contact.email, contact.message, contact.ip_address],
            )?;
            let id = conn.last_insert_rowid();
            select_by_id(conn, id)?.ok_or(StorageError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
        })
        .await
    }

    /// Point lookup. Unknown ids are `Ok(None)`.
    pub async fn find_by_id(&self, id: i64) -> StorageResult<Option<ContactSubmission>> {
        self.with_conn(move |conn| select_by_id(conn, id)).await
    }

    /// One page of submissions, newest first, plus the full row count
    pub async fn find_all(&self, request: PageRequest) -> StorageResult<Page> {
        self.with_conn(move |conn| {
            let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {SELECT_COLUMNS} FROM contacts
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1 OFFSET ?2"
            ))?;
            let items = stmt
                .query_map(params![request.limit(), offset], contact_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            let total = count_rows(conn)?;

            Ok(Page {
                items,
                pagination: Pagination::new(request, total),
            })
        })
        .await
    }

    /// Remove a submission. `true` iff a row existed.
    pub async fn delete_by_id(&self, id: i64) -> StorageResult<bool> {
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM contacts WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
    }

    /// Number of stored submissions
    pub async fn count(&self) -> StorageResult<u64> {
        self.with_conn(count_rows).await
    }

    /// Release the connection. Later calls fail with [`StorageError::Closed`].
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) -> StorageResult<()> {
        let mut guard = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        match guard.take() {
            Some(conn) => conn.close().map_err(|(_, e)| StorageError::Sqlite(e)),
            None => Ok(()),
        }
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StorageError::Poisoned)?;
            let conn = guard.as_ref().ok_or(StorageError::Closed)?;
            f(conn)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

fn select_by_id(conn: &Connection, id: i64) -> StorageResult<Option<ContactSubmission>> {
    let mut stmt =
        conn.prepare_cached(&format!("SELECT {SELECT_COLUMNS} FROM contacts WHERE id = ?1"))?;
    Ok(stmt.query_row(params![id], contact_from_row).optional()?)
}

fn count_rows(conn: &Connection) -> StorageResult<u64> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
    Ok(u64::try_from(total).unwrap_or(0))
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<ContactSubmission> {
    let created_at: String = row.get(5)?;
    let created_at = NaiveDateTime::parse_from_str(&created_at, CREATED_AT_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
        .and_utc();

    Ok(ContactSubmission {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        message: row.get(3)?,
        ip_address: row.get(4)?,
        created_at,
    })
}
