//! Test-only, in-memory store and deterministic multiplier used by unit and
//! behaviour tests.

use std::sync::{Mutex, MutexGuard};

use crate::store::query::fold_case;
use crate::{
    CountryQuery, CountryRecord, CountryStore, MultiplierSource, StatusStore, StoreError,
    StoredCountry, SystemStatus, Timestamp,
};

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<StoredCountry>,
    next_id: i64,
    status: SystemStatus,
    writes: usize,
    write_limit: Option<usize>,
}

impl MemoryState {
    fn position(&self, name: &str) -> Option<usize> {
        let wanted = fold_case(name);
        self.rows
            .iter()
            .position(|row| fold_case(&row.record.name) == wanted)
    }

    fn begin_write(&mut self, operation: &'static str) -> Result<(), StoreError> {
        if self.write_limit.is_some_and(|limit| self.writes >= limit) {
            return Err(StoreError::backend(operation, "write limit reached"));
        }
        self.writes += 1;
        Ok(())
    }
}

/// In-memory implementation of both store traits.
///
/// Rows live in insertion order and every lookup is a linear scan, so it is
/// only suitable for small fixtures. Name matching folds ASCII case like the
/// SQLite store does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create a store pre-populated with `records`, all stamped `refreshed_at`.
    pub fn with_records<I>(records: I, refreshed_at: Timestamp) -> Self
    where
        I: IntoIterator<Item = CountryRecord>,
    {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            for record in records {
                state.next_id += 1;
                let id = state.next_id;
                state.rows.push(StoredCountry {
                    id,
                    record,
                    last_refreshed_at: refreshed_at,
                });
            }
        }
        store
    }

    /// Fail every country or status write after the first `limit` succeed.
    #[must_use]
    pub fn with_write_limit(self, limit: usize) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.write_limit = Some(limit);
        }
        self
    }

    /// Snapshot of every row in insertion order.
    pub fn rows(&self) -> Vec<StoredCountry> {
        self.state
            .lock()
            .map(|state| state.rows.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::backend("lock memory store", "mutex poisoned"))
    }
}

impl CountryStore for MemoryStore {
    fn find_by_name(&self, name: &str) -> Result<Option<StoredCountry>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .position(name)
            .and_then(|index| state.rows.get(index).cloned()))
    }

    fn insert(&self, record: &CountryRecord, refreshed_at: Timestamp) -> Result<i64, StoreError> {
        let mut state = self.lock()?;
        if state.position(&record.name).is_some() {
            return Err(StoreError::Duplicate {
                name: record.name.clone(),
            });
        }
        state.begin_write("insert country")?;
        state.next_id += 1;
        let id = state.next_id;
        state.rows.push(StoredCountry {
            id,
            record: record.clone(),
            last_refreshed_at: refreshed_at,
        });
        Ok(id)
    }

    fn update_by_name(
        &self,
        record: &CountryRecord,
        refreshed_at: Timestamp,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let Some(index) = state.position(&record.name) else {
            return Ok(false);
        };
        state.begin_write("update country")?;
        let Some(row) = state.rows.get_mut(index) else {
            return Ok(false);
        };
        let name = std::mem::take(&mut row.record.name);
        row.record = CountryRecord {
            name,
            ..record.clone()
        };
        row.last_refreshed_at = refreshed_at;
        Ok(true)
    }

    fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let Some(index) = state.position(name) else {
            return Ok(false);
        };
        state.begin_write("delete country")?;
        state.rows.remove(index);
        Ok(true)
    }

    fn list(&self, query: &CountryQuery) -> Result<Vec<StoredCountry>, StoreError> {
        let state = self.lock()?;
        let mut rows: Vec<_> = state
            .rows
            .iter()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| query.sort.compare(a, b));
        Ok(rows)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let state = self.lock()?;
        u64::try_from(state.rows.len()).map_err(|_| StoreError::OutOfRange {
            field: "count",
            value: state.rows.len().to_string(),
        })
    }

    fn top_by_gdp(&self, limit: usize) -> Result<Vec<StoredCountry>, StoreError> {
        let query = CountryQuery::default().with_sort(crate::SortOrder::GdpDesc);
        Ok(self
            .list(&query)?
            .into_iter()
            .filter(|row| row.record.estimated_gdp.is_some())
            .take(limit)
            .collect())
    }
}

impl StatusStore for MemoryStore {
    fn status(&self) -> Result<SystemStatus, StoreError> {
        Ok(self.lock()?.status)
    }

    fn record_refresh(
        &self,
        total_countries: u64,
        refreshed_at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.begin_write("record refresh")?;
        state.status = SystemStatus {
            total_countries,
            last_refreshed_at: Some(refreshed_at),
        };
        Ok(())
    }
}

/// [`MultiplierSource`] that always returns the same value and counts draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedMultiplier {
    value: u32,
    draws: usize,
}

impl FixedMultiplier {
    /// Always yield `value`.
    pub const fn new(value: u32) -> Self {
        Self { value, draws: 0 }
    }

    /// How many multipliers have been drawn.
    pub const fn draws(&self) -> usize {
        self.draws
    }
}

impl MultiplierSource for FixedMultiplier {
    fn next_multiplier(&mut self) -> u32 {
        self.draws += 1;
        self.value
    }
}
