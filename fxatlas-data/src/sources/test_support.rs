//! Test utilities for upstream feeds.
//!
//! [`StubSources`] is a deterministic [`ExternalSources`] double that replays
//! configured payloads or errors without touching the network.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fxatlas_core::{ExchangeRateTable, RawCountry};

use super::{ExternalSources, SourceError};

/// Stub `ExternalSources` for testing.
#[derive(Debug)]
pub struct StubSources {
    countries: Result<Vec<RawCountry>, SourceError>,
    rates: Result<ExchangeRateTable, SourceError>,
    countries_calls: AtomicUsize,
    rates_calls: AtomicUsize,
}

impl StubSources {
    /// Serve `countries` and `rates` on every call.
    #[must_use]
    pub const fn new(countries: Vec<RawCountry>, rates: ExchangeRateTable) -> Self {
        Self {
            countries: Ok(countries),
            rates: Ok(rates),
            countries_calls: AtomicUsize::new(0),
            rates_calls: AtomicUsize::new(0),
        }
    }

    /// Fail every country fetch with `error`.
    #[must_use]
    pub fn with_countries_error(mut self, error: SourceError) -> Self {
        self.countries = Err(error);
        self
    }

    /// Fail every exchange-rate fetch with `error`.
    #[must_use]
    pub fn with_rates_error(mut self, error: SourceError) -> Self {
        self.rates = Err(error);
        self
    }

    /// Number of country fetches served so far.
    pub fn countries_calls(&self) -> usize {
        self.countries_calls.load(Ordering::SeqCst)
    }

    /// Number of exchange-rate fetches served so far.
    pub fn rates_calls(&self) -> usize {
        self.rates_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalSources for StubSources {
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError> {
        self.countries_calls.fetch_add(1, Ordering::SeqCst);
        self.countries.clone()
    }

    async fn fetch_exchange_rates(&self) -> Result<ExchangeRateTable, SourceError> {
        self.rates_calls.fetch_add(1, Ordering::SeqCst);
        self.rates.clone()
    }
}
