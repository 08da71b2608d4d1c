//! Medicine store: SQLite-backed price/stock catalogue.
//!
//! One connection is opened at startup and kept for the process lifetime.
//! Lookups go through the [`DrugLookup`] trait so the tool registry can be
//! handed an in-memory double in tests.
//!
//! ## Schema
//! ```text
//! medicines(id INTEGER PRIMARY KEY AUTOINCREMENT,
//!           description TEXT NOT NULL UNIQUE,
//!           price REAL NOT NULL,
//!           stock INTEGER NOT NULL) STRICT
//! ```

pub mod seed;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::debug;

use crate::error::AppError;

/// One catalogue entry, serialized to the model as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicineRecord {
    pub id: i64,
    pub description: String,
    pub price: f64,
    pub stock: i64,
}

/// Read access to the catalogue.
pub trait DrugLookup: Send + Sync {
    /// Case-insensitive substring match on `description`.
    ///
    /// Returns the match with the lowest id, or `None`. A blank query never
    /// matches.
    fn find_drug(&self, query: &str) -> Result<Option<MedicineRecord>, AppError>;
}

pub struct MedicineStore {
    conn: Mutex<Connection>,
}

impl MedicineStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Store(format!("open {}: {e}", path.display())))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| AppError::Store(format!("set journal_mode WAL: {e}")))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| AppError::Store(format!("set busy_timeout: {e}")))?;

        Self::from_connection(conn)
    }

    /// Private in-memory database; nothing touches disk.
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Store(format!("open in-memory database: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS medicines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL UNIQUE,
                price REAL NOT NULL,
                stock INTEGER NOT NULL
            ) STRICT;
            ",
        )
        .map_err(|e| AppError::Store(format!("initialize schema: {e}")))?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Number of rows in the catalogue.
    pub fn count(&self) -> Result<usize, AppError> {
        let n: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM medicines", [], |row| row.get(0))
            .map_err(|e| AppError::Store(format!("count medicines: {e}")))?;
        Ok(n as usize)
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::Store("connection mutex poisoned".into()))
    }
}

impl DrugLookup for MedicineStore {
    fn find_drug(&self, query: &str) -> Result<Option<MedicineRecord>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let pattern = format!("%{}%", escape_like(query));
        let record = self
            .lock()?
            .query_row(
                "SELECT id, description, price, stock FROM medicines
                 WHERE lower(description) LIKE lower(?1) ESCAPE '\\'
                 ORDER BY id LIMIT 1",
                params![pattern],
                |row| {
                    Ok(MedicineRecord {
                        id: row.get(0)?,
                        description: row.get(1)?,
                        price: row.get(2)?,
                        stock: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(|e| AppError::Store(format!("find_drug: {e}")))?;

        debug!(query, found = record.is_some(), "drug lookup");
        Ok(record)
    }
}

/// Escape LIKE wildcards so they match literally (used with `ESCAPE '\'`).
fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
