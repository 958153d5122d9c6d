use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use rusqlite::{Connection, OpenFlags};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;

/// Handle naming the backing SQLite file
/// Cheap to clone; every request opens its own connection through it
#[derive(Debug, Clone)]
pub struct Store {
    path: Arc<PathBuf>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a read-only connection
    /// A missing file is an error rather than a fresh empty database
    pub fn open(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            self.path.as_path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::debug!(path = %self.path.display(), "opened database connection");
        Ok(conn)
    }
}

/// Connection scoped to a single request
///
/// The connection is opened on first use and closed when the handle is
/// dropped, whichever way the handler exits.
pub struct RequestDb {
    store: Store,
    conn: Option<Connection>,
}

impl RequestDb {
    pub fn new(store: Store) -> Self {
        Self { store, conn: None }
    }

    /// Connection for this request, opened lazily
    pub fn conn(&mut self) -> Result<&Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.store.open()?,
        };
        Ok(&*self.conn.insert(conn))
    }

    /// Whether a connection has been opened in this scope
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }
}

impl Drop for RequestDb {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => tracing::debug!("closed database connection"),
                Err((_, e)) => tracing::warn!(error = %e, "failed to close database connection"),
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestDb
where
    S: Send + Sync,
    Store: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(RequestDb::new(Store::from_ref(state)))
    }
}

/// Create the sales table if missing
/// The server never writes; this provisions fixtures and empty stores
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS ManhattanSales (
            SALE_PRICE NUMERIC,
            LATITUDE REAL,
            LONGITUDE REAL,
            YEAR_SOLD INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_year_sold ON ManhattanSales(YEAR_SOLD)",
        [],
    )?;

    Ok(())
}
