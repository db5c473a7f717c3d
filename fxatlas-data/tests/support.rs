//! Shared fixtures for the data integration tests.

#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use camino::Utf8PathBuf;
use fxatlas_core::{ExchangeRateTable, RawCountry};
use fxatlas_data::sources::{ExternalSources, SourceError};
use tempfile::TempDir;

/// Population of Nigeria used across fixtures.
pub const NIGERIA_POPULATION: u64 = 206_139_589;

/// Naira rate used across fixtures.
pub const NAIRA_RATE: f64 = 1600.23;

/// Drive `future` to completion on a fresh current-thread runtime.
pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|err| panic!("failed to build tokio runtime: {err}"))
        .block_on(future)
}

/// Four countries covering every reconciliation outcome.
pub fn sample_countries() -> Vec<RawCountry> {
    vec![
        RawCountry::new("Nigeria", NIGERIA_POPULATION)
            .with_capital("Abuja")
            .with_region("Africa")
            .with_currency("NGN")
            .with_flag_url("https://flagcdn.com/ng.svg"),
        RawCountry::new("Ghana", 31_072_940)
            .with_capital("Accra")
            .with_region("Africa")
            .with_currency("GHS"),
        RawCountry::new("Antarctica", 1_000).with_region("Polar"),
        RawCountry::new("Zimbabwe", 14_862_924)
            .with_region("Africa")
            .with_currency("ZWL"),
    ]
}

/// Rates for NGN and GHS but not ZWL.
pub fn sample_rates() -> ExchangeRateTable {
    let mut rates = ExchangeRateTable::new();
    rates.insert("NGN", NAIRA_RATE).expect("valid rate");
    rates.insert("GHS", 15.3).expect("valid rate");
    rates.insert("USD", 1.0).expect("valid rate");
    rates
}

/// A temporary directory and its UTF-8 path.
pub fn utf8_temp_dir() -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap_or_else(|err| panic!("failed to create temp dir: {err}"));
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .unwrap_or_else(|path| panic!("temp dir {path:?} is not UTF-8"));
    (dir, root)
}

/// Feeds that replay fixed payloads or errors and count each call.
#[derive(Debug)]
pub struct ReplaySources {
    countries: Result<Vec<RawCountry>, SourceError>,
    rates: Result<ExchangeRateTable, SourceError>,
    countries_calls: AtomicUsize,
    rates_calls: AtomicUsize,
}

impl ReplaySources {
    /// Serve `countries` and `rates` on every call.
    pub fn new(countries: Vec<RawCountry>, rates: ExchangeRateTable) -> Self {
        Self {
            countries: Ok(countries),
            rates: Ok(rates),
            countries_calls: AtomicUsize::new(0),
            rates_calls: AtomicUsize::new(0),
        }
    }

    /// Fail every country fetch with `error`.
    pub fn with_countries_error(mut self, error: SourceError) -> Self {
        self.countries = Err(error);
        self
    }

    /// Fail every exchange-rate fetch with `error`.
    pub fn with_rates_error(mut self, error: SourceError) -> Self {
        self.rates = Err(error);
        self
    }

    /// Country fetches served so far.
    pub fn countries_calls(&self) -> usize {
        self.countries_calls.load(Ordering::SeqCst)
    }

    /// Exchange-rate fetches served so far.
    pub fn rates_calls(&self) -> usize {
        self.rates_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalSources for ReplaySources {
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError> {
        self.countries_calls.fetch_add(1, Ordering::SeqCst);
        self.countries.clone()
    }

    async fn fetch_exchange_rates(&self) -> Result<ExchangeRateTable, SourceError> {
        self.rates_calls.fetch_add(1, Ordering::SeqCst);
        self.rates.clone()
    }
}
