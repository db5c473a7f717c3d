//! Facade crate for the fxatlas country catalogue.
//!
//! This crate re-exports the core domain types and exposes the HTTP feeds,
//! SQLite store and refresh orchestration behind the `data` feature.

#![forbid(unsafe_code)]

pub use fxatlas_core::{
    CountryQuery, CountryRecord, CountryStore, CurrencyDescriptor, EntropyMultiplier,
    ExchangeRateTable, MultiplierSource, ParseTimestampError, RawCountry, RngMultiplier,
    SortOrder, StatusStore, StoreError, StoredCountry, SystemStatus, Timestamp, UpsertSummary,
    fold_case, reconcile, reconcile_all, upsert_records,
};

#[cfg(feature = "data")]
pub use fxatlas_data::{
    ExternalSources, HttpSources, HttpSourcesConfig, JsonSummaryArtefact, RefreshError,
    RefreshReport, Refresher, SourceError, SqliteStore, Summary, SummaryArtefact,
};
