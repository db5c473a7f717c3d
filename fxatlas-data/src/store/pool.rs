//! Bounded SQLite connection pool on top of `r2d2`.
//!
//! Connections are opened lazily up to a fixed ceiling. Once the ceiling is
//! reached, callers wait until another caller drops its connection or the
//! acquire timeout elapses.

use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

use fxatlas_core::StoreError;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub(crate) struct ConnectionPool {
    inner: Pool<SqliteConnectionManager>,
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();
        f.debug_struct("ConnectionPool")
            .field("idle", &state.idle_connections)
            .field("opened", &state.connections)
            .field("max_connections", &self.inner.max_size())
            .finish_non_exhaustive()
    }
}

impl ConnectionPool {
    /// Pool opening at most `max_connections` connections on demand.
    pub(crate) fn bounded(
        manager: SqliteConnectionManager,
        max_connections: NonZeroUsize,
        acquire_timeout: Duration,
    ) -> Result<Self, r2d2::Error> {
        let inner = Pool::builder()
            .max_size(u32::try_from(max_connections.get()).unwrap_or(u32::MAX))
            .min_idle(Some(0))
            .connection_timeout(acquire_timeout)
            .build(manager)?;
        Ok(Self { inner })
    }

    /// Pool around one connection that is never recycled.
    ///
    /// In-memory databases live and die with their connection, so the pool
    /// must keep it open for its whole lifetime.
    pub(crate) fn single(manager: SqliteConnectionManager) -> Result<Self, r2d2::Error> {
        let inner = Pool::builder()
            .max_size(1)
            .min_idle(Some(1))
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;
        Ok(Self { inner })
    }

    pub(crate) fn max_connections(&self) -> NonZeroUsize {
        usize::try_from(self.inner.max_size())
            .ok()
            .and_then(NonZeroUsize::new)
            .unwrap_or(NonZeroUsize::MIN)
    }

    pub(crate) fn checkout(
        &self,
    ) -> Result<PooledConnection<SqliteConnectionManager>, r2d2::Error> {
        self.inner.get()
    }

    /// Run `operation` on a pooled connection, blocking while the pool is
    /// exhausted. The connection goes back to the pool when the guard drops,
    /// including when `operation` panics.
    pub(crate) fn with_connection<T>(
        &self,
        operation: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut connection = self
            .checkout()
            .map_err(|source| StoreError::backend("acquire pooled connection", source))?;
        operation(&mut connection)
    }
}
