//! Test helpers for seeding databases and driving commands.

use super::*;
use camino::Utf8PathBuf;
use fxatlas_core::{CountryRecord, CountryStore, ExchangeRateTable, RawCountry, Timestamp};
use fxatlas_data::sources::test_support::StubSources;
use tempfile::TempDir;

/// A temporary workspace holding the database and summary locations.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("fxatlas.db")
    }

    pub(super) fn summary_path(&self) -> Utf8PathBuf {
        self.root.join("cache/summary.json")
    }

    /// Store the fixture countries directly, bypassing a refresh.
    pub(super) fn seed(&self) {
        let store = open_store(&self.database(), NonZeroUsize::MIN).expect("open store");
        for record in seed_records() {
            store
                .insert(&record, Timestamp::from_millis(1_000))
                .expect("seed insert");
        }
    }
}

fn priced(name: &str, region: &str, currency: &str, gdp: Option<f64>) -> CountryRecord {
    CountryRecord {
        region: Some(region.to_owned()),
        currency_code: Some(currency.to_owned()),
        exchange_rate: gdp.map(|_| 1.5),
        estimated_gdp: gdp,
        ..CountryRecord::new(name, 1_000_000)
    }
}

fn seed_records() -> Vec<CountryRecord> {
    vec![
        priced("Nigeria", "Africa", "NGN", Some(300.0)),
        priced("Ghana", "Africa", "GHS", Some(50.0)),
        priced("Zimbabwe", "Africa", "ZWL", None),
        priced("France", "Europe", "EUR", Some(900.0)),
    ]
}

/// Feeds serving two priced countries.
pub(super) fn stub_sources() -> StubSources {
    let mut rates = ExchangeRateTable::new();
    rates.insert("NGN", 1600.23).expect("valid rate");
    rates.insert("EUR", 0.92).expect("valid rate");
    StubSources::new(
        vec![
            RawCountry::new("Nigeria", 206_139_589)
                .with_region("Africa")
                .with_currency("NGN"),
            RawCountry::new("France", 67_391_582)
                .with_region("Europe")
                .with_currency("EUR"),
        ],
        rates,
    )
}

/// Drive `future` on a current-thread runtime.
pub(super) fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build runtime")
        .block_on(future)
}

/// Decode captured command output.
pub(super) fn parse_output(buffer: &[u8]) -> serde_json::Value {
    serde_json::from_slice(buffer).expect("output should be JSON")
}
