//! Storage traits for countries and the refresh status singleton.
//!
//! Adapters implement [`CountryStore`] and [`StatusStore`]; the refresh
//! pipeline and the read-side operations only ever talk to these traits.
//! Name lookups are case-insensitive in every implementation.

mod error;
pub(crate) mod query;

pub use error::StoreError;
pub use query::{CountryQuery, SortOrder, UnknownSortOrder, fold_case};

use crate::{CountryRecord, StoredCountry, Timestamp};

/// Process-wide refresh bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemStatus {
    /// Rows in the country store as of the last refresh.
    pub total_countries: u64,
    /// Completion time of the last successful refresh.
    pub last_refreshed_at: Option<Timestamp>,
}

/// Read and write access to persisted countries.
///
/// # Examples
/// ```
/// use fxatlas_core::{CountryRecord, CountryStore, StoreError, Timestamp};
///
/// fn rename_capital(store: &dyn CountryStore, name: &str) -> Result<(), StoreError> {
///     let Some(mut stored) = store.find_by_name(name)? else {
///         return Err(StoreError::NotFound { name: name.to_owned() });
///     };
///     stored.record.capital = Some("New capital".to_owned());
///     store.update_by_name(&stored.record, Timestamp::now())?;
///     Ok(())
/// }
/// ```
pub trait CountryStore: Send + Sync {
    /// Look up a country by name, ignoring case.
    fn find_by_name(&self, name: &str) -> Result<Option<StoredCountry>, StoreError>;

    /// Insert a new row stamped with `refreshed_at` and return its id.
    ///
    /// Fails with [`StoreError::Duplicate`] when the name already exists.
    fn insert(&self, record: &CountryRecord, refreshed_at: Timestamp) -> Result<i64, StoreError>;

    /// Overwrite every data field of the row whose name matches `record.name`.
    ///
    /// Returns `false` when no row matched. The stored name keeps its
    /// original casing.
    fn update_by_name(
        &self,
        record: &CountryRecord,
        refreshed_at: Timestamp,
    ) -> Result<bool, StoreError>;

    /// Remove the row matching `name`, returning whether one existed.
    fn delete_by_name(&self, name: &str) -> Result<bool, StoreError>;

    /// List rows matching `query` in its requested order.
    fn list(&self, query: &CountryQuery) -> Result<Vec<StoredCountry>, StoreError>;

    /// Count every stored row.
    fn count(&self) -> Result<u64, StoreError>;

    /// The `limit` rows with the largest GDP estimate, skipping empty
    /// estimates.
    fn top_by_gdp(&self, limit: usize) -> Result<Vec<StoredCountry>, StoreError>;
}

/// Access to the refresh status singleton.
pub trait StatusStore: Send + Sync {
    /// Current status. A store that was never refreshed reports zero
    /// countries and no refresh time.
    fn status(&self) -> Result<SystemStatus, StoreError>;

    /// Record a completed refresh.
    fn record_refresh(
        &self,
        total_countries: u64,
        refreshed_at: Timestamp,
    ) -> Result<(), StoreError>;
}

/// Fetch a country by name or fail with [`StoreError::NotFound`].
///
/// # Examples
/// ```
/// use fxatlas_core::{CountryStore, StoreError, require_country};
///
/// fn capital_of(store: &dyn CountryStore, name: &str) -> Result<Option<String>, StoreError> {
///     Ok(require_country(store, name)?.record.capital)
/// }
/// ```
pub fn require_country(
    store: &dyn CountryStore,
    name: &str,
) -> Result<StoredCountry, StoreError> {
    store.find_by_name(name)?.ok_or_else(|| StoreError::NotFound {
        name: name.to_owned(),
    })
}

/// Delete a country by name or fail with [`StoreError::NotFound`].
pub fn remove_country(store: &dyn CountryStore, name: &str) -> Result<(), StoreError> {
    if store.delete_by_name(name)? {
        Ok(())
    } else {
        Err(StoreError::NotFound {
            name: name.to_owned(),
        })
    }
}
