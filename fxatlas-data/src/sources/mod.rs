//! Upstream country and exchange-rate feeds.
//!
//! [`ExternalSources`] is the seam the refresh pipeline depends on.
//! [`HttpSources`] implements it against the public REST Countries and
//! open.er-api endpoints. With the `test-support` feature,
//! `test_support::StubSources` replays canned payloads for tests.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use fxatlas_data::sources::{ExternalSources, HttpSources, HttpSourcesConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpSourcesConfig::default()
//!     .with_rates_timeout(Duration::from_secs(5))
//!     .with_user_agent("my-app/1.0");
//! let sources = HttpSources::with_config(config)?;
//!
//! let (countries, rates) =
//!     tokio::try_join!(sources.fetch_countries(), sources.fetch_exchange_rates())?;
//! println!("{} countries, {} rates", countries.len(), rates.len());
//! # Ok(())
//! # }
//! ```

mod http;
mod wire;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

use async_trait::async_trait;
use fxatlas_core::{ExchangeRateTable, RawCountry};
use thiserror::Error;

pub use http::{
    COUNTRY_FIELDS, DEFAULT_COUNTRIES_URL, DEFAULT_RATES_URL, DEFAULT_USER_AGENT, HttpSources,
    HttpSourcesConfig, SourceBuildError,
};

/// The two upstream feeds a refresh consumes.
///
/// The calls are independent and may run concurrently.
#[async_trait]
pub trait ExternalSources: Send + Sync {
    /// Fetch every country from the country feed.
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError>;

    /// Fetch the current exchange-rate table.
    async fn fetch_exchange_rates(&self) -> Result<ExchangeRateTable, SourceError>;
}

/// Failure reported by an upstream feed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The request did not finish within its deadline.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Deadline that elapsed.
        timeout_secs: u64,
    },
    /// The feed answered with a non-success status.
    #[error("{url} responded with status {status}: {message}")]
    Upstream {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The request never produced a response.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Error description.
        message: String,
    },
    /// The response body did not have the expected shape.
    #[error("malformed payload from {url}: {message}")]
    Malformed {
        /// Requested URL.
        url: String,
        /// What was wrong with the payload.
        message: String,
    },
}

impl SourceError {
    /// Whether the feed answered but with unusable data, as opposed to being
    /// unreachable.
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}
