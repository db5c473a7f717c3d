//! [`StatusStore`] over the `system_status` singleton row.

use fxatlas_core::{StatusStore, StoreError, SystemStatus, Timestamp};
use rusqlite::{OptionalExtension, params};

use super::SqliteStore;

impl StatusStore for SqliteStore {
    fn status(&self) -> Result<SystemStatus, StoreError> {
        let row: Option<(i64, Option<i64>)> = self.pool.with_connection(|conn| {
            conn.query_row(
                "SELECT total_countries, last_refreshed_at FROM system_status WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|source| StoreError::backend("read system status", source))
        })?;

        let Some((total, refreshed_at)) = row else {
            return Ok(SystemStatus::default());
        };
        let total_countries = u64::try_from(total).map_err(|_| StoreError::OutOfRange {
            field: "total_countries",
            value: total.to_string(),
        })?;
        Ok(SystemStatus {
            total_countries,
            last_refreshed_at: refreshed_at.map(Timestamp::from_millis),
        })
    }

    fn record_refresh(
        &self,
        total_countries: u64,
        refreshed_at: Timestamp,
    ) -> Result<(), StoreError> {
        let total = i64::try_from(total_countries).map_err(|_| StoreError::OutOfRange {
            field: "total_countries",
            value: total_countries.to_string(),
        })?;
        self.pool.with_connection(|conn| {
            conn.execute(
                "INSERT INTO system_status (id, total_countries, last_refreshed_at)
                    VALUES (1, ?1, ?2)
                    ON CONFLICT(id) DO UPDATE SET
                        total_countries = excluded.total_countries,
                        last_refreshed_at = excluded.last_refreshed_at",
                params![total, refreshed_at.as_millis()],
            )
            .map(|_| ())
            .map_err(|source| StoreError::backend("record refresh", source))
        })
    }
}
