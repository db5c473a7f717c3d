//! Data access and refresh orchestration for fxatlas.
//!
//! Responsibilities:
//! - Fetch the country feed and the exchange-rate table over HTTP.
//! - Persist reconciled countries and the refresh status in SQLite.
//! - Regenerate the JSON summary artefact.
//! - Sequence a full refresh cycle and report its outcome.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `fxatlas-core`).
//! - Never retry; failures surface whole to the caller.
//!
//! Invariants:
//! - No fetch failure ever reaches the store.
//! - The status row only moves after every other step succeeded.
//! - No global mutable state.

pub mod refresh;
pub mod sources;
pub mod store;
pub mod summary;

pub use refresh::{RefreshError, RefreshReport, Refresher};
pub use sources::{ExternalSources, HttpSources, HttpSourcesConfig, SourceBuildError, SourceError};
pub use store::{SchemaError, SqliteStore, SqliteStoreError};
pub use summary::{
    ArtefactError, JsonSummaryArtefact, Summary, SummaryArtefact, SummaryEntry, read_summary,
};
