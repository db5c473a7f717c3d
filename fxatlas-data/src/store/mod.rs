//! SQLite persistence for countries and the refresh status.
//!
//! The module is split into focused submodules:
//! - `schema` materialises the tables and records the schema version.
//! - `pool` hands out a bounded set of `r2d2` connections.
//! - `countries` and `status` implement the storage traits from
//!   `fxatlas-core` on top of them.
#![forbid(unsafe_code)]

mod countries;
mod pool;
mod schema;
mod status;

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use r2d2::ManageConnection;
use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;

use pool::ConnectionPool;

pub use schema::{SCHEMA_VERSION, SchemaError, initialise_schema};

/// Default ceiling on simultaneously open connections.
pub const DEFAULT_MAX_CONNECTIONS: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(value) => value,
    None => NonZeroUsize::MIN,
};

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a caller waits for a free pooled connection before failing.
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Error raised when opening a [`SqliteStore`].
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The connection pool could not be built.
    #[error("failed to build connection pool for {path}: {source}")]
    Pool {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `r2d2`.
        #[source]
        source: r2d2::Error,
    },
    /// The schema could not be created or is incompatible.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Country and status store backed by one SQLite database.
///
/// Every call borrows a connection from an internal pool, so one store can be
/// shared between threads. Each write commits on its own; no transaction
/// spans more than one call.
///
/// # Examples
/// ```
/// use fxatlas_core::{CountryRecord, CountryStore, Timestamp};
/// use fxatlas_data::SqliteStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::open_in_memory()?;
/// store.insert(&CountryRecord::new("Chad", 16_425_859), Timestamp::now())?;
/// assert!(store.find_by_name("CHAD")?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SqliteStore {
    pool: ConnectionPool,
}

impl SqliteStore {
    /// Open or create the database at `path`, allowing up to
    /// `max_connections` concurrent connections.
    ///
    /// Callers wait up to [`ACQUIRE_TIMEOUT`] for a free connection.
    pub fn open(
        path: impl AsRef<Path>,
        max_connections: NonZeroUsize,
    ) -> Result<Self, SqliteStoreError> {
        let path = path.as_ref().to_path_buf();
        let manager = SqliteConnectionManager::file(&path)
            .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
        let mut first = manager
            .connect()
            .map_err(|source| SqliteStoreError::OpenDatabase {
                path: path.clone(),
                source,
            })?;
        initialise_schema(&mut first)?;
        drop(first);

        let pool = ConnectionPool::bounded(manager, max_connections, ACQUIRE_TIMEOUT)
            .map_err(|source| SqliteStoreError::Pool {
                path: path.clone(),
                source,
            })?;
        debug!(
            "opened country store at {} with up to {max_connections} connections",
            path.display()
        );
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds a single connection because every in-memory connection
    /// is a separate database.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let path = PathBuf::from(":memory:");
        let pool = ConnectionPool::single(SqliteConnectionManager::memory()).map_err(|source| {
            SqliteStoreError::Pool {
                path: path.clone(),
                source,
            }
        })?;
        let mut connection = pool
            .checkout()
            .map_err(|source| SqliteStoreError::Pool { path, source })?;
        initialise_schema(&mut connection)?;
        drop(connection);
        Ok(Self { pool })
    }

    /// Ceiling on simultaneously open connections.
    pub fn max_connections(&self) -> NonZeroUsize {
        self.pool.max_connections()
    }
}
