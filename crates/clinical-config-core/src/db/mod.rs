//! Local database layer: reference catalog, templates and form drafts.
//!
//! The schema is versioned through `PRAGMA user_version`; a file written by a
//! newer release is refused rather than silently reused.

mod catalog;
mod drafts;
mod schema;
mod templates;

pub use schema::*;

use rusqlite::{Connection, Transaction};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Version stamped into `user_version` after the schema is applied.
pub const SCHEMA_VERSION: i32 = 1;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i32, supported: i32 },
}

pub type DbResult<T> = Result<T, DbError>;

/// Catalog, template and draft storage over one SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database file at `path`, creating and migrating it as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        debug!(path = %path.as_ref().display(), "opening clinical config database");
        Self::prepare(Connection::open(path)?)
    }

    /// Database that lives only as long as the returned value.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> DbResult<Self> {
        let found: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if found > SCHEMA_VERSION {
            return Err(DbError::UnsupportedSchema {
                found,
                supported: SCHEMA_VERSION,
            });
        }

        conn.execute_batch(SCHEMA)?;
        if found < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(Self { conn })
    }

    fn transaction(&mut self) -> DbResult<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}
