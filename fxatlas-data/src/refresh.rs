//! One full refresh cycle: fetch, reconcile, upsert, summarise, record.
//!
//! Every step depends on the previous one succeeding. The cycle never
//! deletes rows: countries that disappear upstream keep their last values.

use std::ops::Deref;
use std::sync::{Arc, Mutex, PoisonError};

use camino::Utf8PathBuf;
use fxatlas_core::{
    CountryRecord, CountryStore, EntropyMultiplier, MultiplierSource, StatusStore, StoreError,
    Timestamp, UpsertSummary, reconcile_all, upsert_records,
};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;
use tokio::task::{self, JoinError};

use crate::sources::{ExternalSources, SourceError};
use crate::summary::{ArtefactError, SummaryArtefact};

/// Outcome of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Countries reconciled from the feed.
    pub countries_processed: usize,
    /// Rows created.
    pub inserted: usize,
    /// Rows overwritten.
    pub updated: usize,
    /// Rows in the store after the refresh.
    pub total_countries: u64,
    /// Stamp applied to every written row and to the status.
    pub refreshed_at: Timestamp,
    /// Where the summary artefact was written.
    pub artefact_path: Utf8PathBuf,
}

/// Why a refresh stopped.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// A feed was unreachable, slow or answered with an error status.
    /// Nothing was written.
    #[error("upstream source unavailable: {source}")]
    SourceUnavailable {
        /// Feed failure.
        #[source]
        source: SourceError,
    },
    /// A feed answered with an unusable payload. Nothing was written.
    #[error("upstream source returned malformed data: {source}")]
    MalformedUpstreamData {
        /// Feed failure.
        #[source]
        source: SourceError,
    },
    /// Writing to the store failed. Rows committed before the failure stay.
    #[error("failed to {step}: {source}")]
    Persistence {
        /// Step that failed.
        step: &'static str,
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// The summary could not be regenerated. Upserted rows stay but the
    /// status is not advanced.
    #[error("failed to regenerate summary: {source}")]
    Artefact {
        /// Artefact failure.
        #[source]
        source: ArtefactError,
    },
    /// The blocking persistence task panicked or was cancelled. Rows
    /// committed before that point stay.
    #[error("persistence task did not complete: {source}")]
    Worker {
        /// Join failure.
        #[source]
        source: JoinError,
    },
}

impl From<SourceError> for RefreshError {
    fn from(source: SourceError) -> Self {
        if source.is_malformed() {
            Self::MalformedUpstreamData { source }
        } else {
            Self::SourceUnavailable { source }
        }
    }
}

/// Runs refresh cycles against injected collaborators.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use fxatlas_data::{HttpSources, JsonSummaryArtefact, Refresher, SqliteStore};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(SqliteStore::open_in_memory()?);
/// let artefact = JsonSummaryArtefact::new(Arc::clone(&store), "cache/summary.json");
/// let refresher = Refresher::new(HttpSources::new()?, store, artefact);
///
/// let report = refresher.refresh().await?;
/// println!("processed {} countries", report.countries_processed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Refresher<Src, St, A, M = EntropyMultiplier> {
    sources: Src,
    store: St,
    artefact: Arc<A>,
    multipliers: Mutex<M>,
}

impl<Src, St, A> Refresher<Src, St, A> {
    /// Build a refresher drawing GDP multipliers from OS entropy.
    pub fn new(sources: Src, store: St, artefact: A) -> Self {
        Self::with_multipliers(sources, store, artefact, EntropyMultiplier::from_entropy())
    }
}

impl<Src, St, A, M> Refresher<Src, St, A, M> {
    /// Build a refresher with an explicit multiplier source.
    pub fn with_multipliers(sources: Src, store: St, artefact: A, multipliers: M) -> Self {
        Self {
            sources,
            store,
            artefact: Arc::new(artefact),
            multipliers: Mutex::new(multipliers),
        }
    }

    /// The feeds this refresher reads.
    pub const fn sources(&self) -> &Src {
        &self.sources
    }

    /// The store this refresher writes.
    pub const fn store(&self) -> &St {
        &self.store
    }
}

impl<Src, St, A, M> Refresher<Src, St, A, M>
where
    Src: ExternalSources,
    St: Deref + Clone + Send + 'static,
    St::Target: CountryStore + StatusStore + Sized,
    A: SummaryArtefact + 'static,
    M: MultiplierSource,
{
    /// Run one refresh cycle.
    ///
    /// Both feeds are fetched concurrently; the first failure wins and
    /// nothing is written. Reconciled records are then upserted one at a
    /// time, the summary is regenerated and finally the status is set to the
    /// full row count and the cycle's timestamp. The store and artefact
    /// steps run on the blocking thread pool.
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let refreshed_at = Timestamp::now();
        info!("refresh started");

        let (countries, rates) = tokio::try_join!(
            self.sources.fetch_countries(),
            self.sources.fetch_exchange_rates()
        )?;
        debug!(
            "fetched {} countries and {} exchange rates",
            countries.len(),
            rates.len()
        );

        let records = {
            let mut multipliers = self
                .multipliers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            reconcile_all(&countries, &rates, &mut *multipliers)
        };
        let countries_processed = records.len();

        let store = self.store.clone();
        let artefact = Arc::clone(&self.artefact);
        let persisted = task::spawn_blocking(move || {
            persist(&*store, artefact.as_ref(), &records, refreshed_at)
        })
        .await
        .map_err(|source| RefreshError::Worker { source })??;
        info!(
            "refresh finished: {} countries stored",
            persisted.total_countries
        );

        Ok(RefreshReport {
            countries_processed,
            inserted: persisted.upserted.inserted,
            updated: persisted.upserted.updated,
            total_countries: persisted.total_countries,
            refreshed_at,
            artefact_path: persisted.artefact_path,
        })
    }
}

/// What the blocking half of a refresh wrote.
struct Persisted {
    upserted: UpsertSummary,
    artefact_path: Utf8PathBuf,
    total_countries: u64,
}

fn persist<T>(
    store: &T,
    artefact: &dyn SummaryArtefact,
    records: &[CountryRecord],
    refreshed_at: Timestamp,
) -> Result<Persisted, RefreshError>
where
    T: CountryStore + StatusStore,
{
    let upserted = upsert_records(store, records, refreshed_at).map_err(|source| {
        RefreshError::Persistence {
            step: "upsert countries",
            source,
        }
    })?;
    info!(
        "database updated: {} inserted, {} updated",
        upserted.inserted, upserted.updated
    );

    let artefact_path = artefact
        .generate()
        .map_err(|source| RefreshError::Artefact { source })?;

    let total_countries = store.count().map_err(|source| RefreshError::Persistence {
        step: "count countries",
        source,
    })?;
    store
        .record_refresh(total_countries, refreshed_at)
        .map_err(|source| RefreshError::Persistence {
            step: "record refresh status",
            source,
        })?;

    Ok(Persisted {
        upserted,
        artefact_path,
        total_countries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::StubSources;
    use fxatlas_core::test_support::{FixedMultiplier, MemoryStore};
    use fxatlas_core::{CountryQuery, ExchangeRateTable, RawCountry, StoredCountry, SystemStatus};
    use rstest::rstest;
    use std::sync::mpsc;
    use std::time::Duration;

    /// Store whose inserts wait until the test opens a gate.
    struct GatedStore {
        inner: MemoryStore,
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl CountryStore for GatedStore {
        fn find_by_name(&self, name: &str) -> Result<Option<StoredCountry>, StoreError> {
            self.inner.find_by_name(name)
        }

        fn insert(
            &self,
            record: &CountryRecord,
            refreshed_at: Timestamp,
        ) -> Result<i64, StoreError> {
            let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
            gate.recv_timeout(Duration::from_secs(5))
                .map_err(|_| StoreError::backend("insert country", "gate never opened"))?;
            self.inner.insert(record, refreshed_at)
        }

        fn update_by_name(
            &self,
            record: &CountryRecord,
            refreshed_at: Timestamp,
        ) -> Result<bool, StoreError> {
            self.inner.update_by_name(record, refreshed_at)
        }

        fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
            self.inner.delete_by_name(name)
        }

        fn list(&self, query: &CountryQuery) -> Result<Vec<StoredCountry>, StoreError> {
            self.inner.list(query)
        }

        fn count(&self) -> Result<u64, StoreError> {
            self.inner.count()
        }

        fn top_by_gdp(&self, limit: usize) -> Result<Vec<StoredCountry>, StoreError> {
            self.inner.top_by_gdp(limit)
        }
    }

    impl StatusStore for GatedStore {
        fn status(&self) -> Result<SystemStatus, StoreError> {
            self.inner.status()
        }

        fn record_refresh(
            &self,
            total_countries: u64,
            refreshed_at: Timestamp,
        ) -> Result<(), StoreError> {
            self.inner.record_refresh(total_countries, refreshed_at)
        }
    }

    struct FixedPathArtefact;

    impl SummaryArtefact for FixedPathArtefact {
        fn generate(&self) -> Result<Utf8PathBuf, ArtefactError> {
            Ok(Utf8PathBuf::from("summary.json"))
        }
    }

    // A current-thread runtime can only open the gate if the store work runs
    // somewhere other than the executor thread.
    #[rstest]
    #[tokio::test]
    async fn store_work_leaves_the_executor_free() {
        let (open_gate, gate) = mpsc::channel();
        let store = Arc::new(GatedStore {
            inner: MemoryStore::default(),
            gate: Mutex::new(gate),
        });
        let sources = StubSources::new(vec![RawCountry::new("Chad", 1)], ExchangeRateTable::new());
        let refresher = Refresher::with_multipliers(
            sources,
            Arc::clone(&store),
            FixedPathArtefact,
            FixedMultiplier::new(1500),
        );

        let opener = async {
            task::yield_now().await;
            open_gate.send(()).expect("gate receiver alive");
        };
        let (outcome, ()) = tokio::join!(refresher.refresh(), opener);

        let report = outcome.expect("refresh completes");
        assert_eq!((report.inserted, report.updated), (1, 0));
        assert_eq!(store.count().expect("count"), 1);
        assert_eq!(
            store.status().expect("status").total_countries,
            report.total_countries
        );
    }
}
