//! Core domain types for the fxatlas country catalogue.
//!
//! This crate holds the pieces of a refresh that do not touch the network or
//! the filesystem: the upstream and stored country shapes, the exchange-rate
//! table, the reconciliation step that merges both upstream feeds into
//! persistable records, and the storage traits that adapters implement.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod country;
pub mod reconcile;
pub mod store;
pub mod timestamp;
pub mod upsert;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
#[doc(hidden)]
pub mod test_support;

pub use country::{
    CountryRecord, CurrencyDescriptor, ExchangeRateError, ExchangeRateTable, RawCountry,
    StoredCountry,
};
pub use reconcile::{
    EntropyMultiplier, MULTIPLIER_RANGE, MultiplierSource, RngMultiplier, reconcile, reconcile_all,
};
pub use store::{
    CountryQuery, CountryStore, SortOrder, StatusStore, StoreError, SystemStatus,
    UnknownSortOrder, fold_case, remove_country, require_country,
};
pub use timestamp::{ParseTimestampError, Timestamp};
pub use upsert::{UpsertSummary, upsert_records};
