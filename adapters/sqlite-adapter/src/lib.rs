//! sqlite-adapter — SQLite implementation of the `AliasStore` port.
//!
//! Purpose
//! - Durable, file-based alias → URL mapping created on first use.
//! - Uniqueness is enforced by the table's UNIQUE constraint; constraint
//!   failures are classified into `CoreError::AliasConflict` here so callers
//!   never inspect SQLite error codes.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - One connection guarded by a mutex; SQLite itself provides atomicity of
//!   each insert.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use domain::{Alias, AliasStore, CoreError, MappingId};
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension};
use tracing::debug;

/// SQLite-backed alias store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    /// Missing parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                CoreError::StoreUnavailable(format!("create {}: {e}", dir.display()))
            })?;
        }
        let conn = Connection::open(path).map_err(map_sqerr)?;
        let store = Self::init(conn)?;
        debug!(path = %path.display(), "sqlite store ready");
        Ok(store)
    }

    /// Private in-memory database with the same schema.
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(map_sqerr)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, CoreError> {
        conn.busy_timeout(Duration::from_secs(5)).map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|_| CoreError::StoreUnavailable("mutex poisoned".into()))
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS url (
            id INTEGER PRIMARY KEY,
            alias TEXT NOT NULL UNIQUE,
            url TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_alias ON url(alias);
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::StoreUnavailable(format!("sqlite error: {e}"))
}

/// Uniqueness failures become `AliasConflict`; everything else is unavailable.
fn classify_insert_error(e: rusqlite::Error) -> CoreError {
    if let rusqlite::Error::SqliteFailure(err, _) = &e {
        if err.code == ErrorCode::ConstraintViolation
            && matches!(
                err.extended_code,
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            )
        {
            return CoreError::AliasConflict;
        }
    }
    map_sqerr(e)
}

impl AliasStore for SqliteStore {
    fn save(&self, target_url: &str, alias: &Alias) -> Result<MappingId, CoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO url(alias, url) VALUES (?1, ?2)",
            params![alias.as_str(), target_url],
        )
        .map_err(classify_insert_error)?;
        Ok(conn.last_insert_rowid())
    }

    fn lookup(&self, alias: &Alias) -> Result<String, CoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT url FROM url WHERE alias = ?1",
            params![alias.as_str()],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(map_sqerr)?
        .ok_or(CoreError::NotFound)
    }

    fn delete(&self, alias: &Alias) -> Result<(), CoreError> {
        let conn = self.conn()?;
        let changed = conn
            .execute("DELETE FROM url WHERE alias = ?1", params![alias.as_str()])
            .map_err(map_sqerr)?;
        debug!(alias = %alias, changed, "delete");
        Ok(())
    }
}
