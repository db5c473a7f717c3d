//! HTTP implementation of [`ExternalSources`].

use std::time::Duration;

use async_trait::async_trait;
use fxatlas_core::{ExchangeRateTable, RawCountry};
use log::{debug, info};
use reqwest::Client;
use thiserror::Error;
use url::Url;

use super::wire::{parse_countries, parse_rates};
use super::{ExternalSources, SourceError};

/// Default country feed.
pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v2/all";

/// Default exchange-rate feed, priced against the US dollar.
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Default user agent for upstream requests.
pub const DEFAULT_USER_AGENT: &str = "fxatlas/0.1";

/// Field set requested from the country feed.
pub const COUNTRY_FIELDS: &str = "name,capital,region,population,flag,currencies";

const DEFAULT_COUNTRIES_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RATES_TIMEOUT_SECS: u64 = 10;

/// Error raised while constructing [`HttpSources`].
#[derive(Debug, Error)]
pub enum SourceBuildError {
    /// A configured endpoint is not a valid absolute URL.
    #[error("invalid {which} URL {url}: {source}")]
    InvalidUrl {
        /// Which endpoint was misconfigured.
        which: &'static str,
        /// The rejected value.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Configuration for [`HttpSources`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSourcesConfig {
    /// Country feed endpoint, without the `fields` query.
    pub countries_url: String,
    /// Exchange-rate feed endpoint.
    pub rates_url: String,
    /// Deadline for the country request.
    pub countries_timeout: Duration,
    /// Deadline for the exchange-rate request.
    pub rates_timeout: Duration,
    /// User agent sent with both requests.
    pub user_agent: String,
}

impl Default for HttpSourcesConfig {
    fn default() -> Self {
        Self {
            countries_url: DEFAULT_COUNTRIES_URL.to_owned(),
            rates_url: DEFAULT_RATES_URL.to_owned(),
            countries_timeout: Duration::from_secs(DEFAULT_COUNTRIES_TIMEOUT_SECS),
            rates_timeout: Duration::from_secs(DEFAULT_RATES_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpSourcesConfig {
    /// Set the country feed endpoint.
    #[must_use]
    pub fn with_countries_url(mut self, url: impl Into<String>) -> Self {
        self.countries_url = url.into();
        self
    }

    /// Set the exchange-rate feed endpoint.
    #[must_use]
    pub fn with_rates_url(mut self, url: impl Into<String>) -> Self {
        self.rates_url = url.into();
        self
    }

    /// Set the country request deadline.
    #[must_use]
    pub const fn with_countries_timeout(mut self, timeout: Duration) -> Self {
        self.countries_timeout = timeout;
        self
    }

    /// Set the exchange-rate request deadline.
    #[must_use]
    pub const fn with_rates_timeout(mut self, timeout: Duration) -> Self {
        self.rates_timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetches both feeds with a shared `reqwest` client.
///
/// Each request carries its own deadline; there are no retries.
#[derive(Debug, Clone)]
pub struct HttpSources {
    client: Client,
    countries_url: Url,
    rates_url: Url,
    config: HttpSourcesConfig,
}

impl HttpSources {
    /// Create sources pointing at the public feeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, SourceBuildError> {
        Self::with_config(HttpSourcesConfig::default())
    }

    /// Create sources with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either URL is invalid or the HTTP client fails to
    /// build.
    pub fn with_config(config: HttpSourcesConfig) -> Result<Self, SourceBuildError> {
        let mut countries_url = parse_url("countries", &config.countries_url)?;
        countries_url
            .query_pairs_mut()
            .append_pair("fields", COUNTRY_FIELDS);
        let rates_url = parse_url("rates", &config.rates_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(SourceBuildError::HttpClient)?;
        Ok(Self {
            client,
            countries_url,
            rates_url,
            config,
        })
    }

    /// The country request URL including the `fields` query.
    pub const fn countries_url(&self) -> &Url {
        &self.countries_url
    }

    /// The exchange-rate request URL.
    pub const fn rates_url(&self) -> &Url {
        &self.rates_url
    }

    async fn get_body(&self, url: &Url, timeout: Duration) -> Result<String, SourceError> {
        debug!("requesting {url}");
        self.client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| convert_reqwest_error(&err, url, timeout))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(&err, url, timeout))?
            .text()
            .await
            .map_err(|err| convert_reqwest_error(&err, url, timeout))
    }
}

#[async_trait]
impl ExternalSources for HttpSources {
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError> {
        let url = &self.countries_url;
        let body = self.get_body(url, self.config.countries_timeout).await?;
        let countries = parse_countries(&body).map_err(|message| SourceError::Malformed {
            url: url.to_string(),
            message,
        })?;
        info!("fetched {} countries", countries.len());
        Ok(countries)
    }

    async fn fetch_exchange_rates(&self) -> Result<ExchangeRateTable, SourceError> {
        let url = &self.rates_url;
        let body = self.get_body(url, self.config.rates_timeout).await?;
        let rates = parse_rates(&body).map_err(|message| SourceError::Malformed {
            url: url.to_string(),
            message,
        })?;
        info!("fetched {} exchange rates", rates.len());
        Ok(rates)
    }
}

fn parse_url(which: &'static str, raw: &str) -> Result<Url, SourceBuildError> {
    Url::parse(raw).map_err(|source| SourceBuildError::InvalidUrl {
        which,
        url: raw.to_owned(),
        source,
    })
}

fn convert_reqwest_error(error: &reqwest::Error, url: &Url, timeout: Duration) -> SourceError {
    if error.is_timeout() {
        return SourceError::Timeout {
            url: url.to_string(),
            timeout_secs: timeout.as_secs(),
        };
    }

    if let Some(status) = error.status() {
        return SourceError::Upstream {
            url: url.to_string(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    if error.is_decode() {
        return SourceError::Malformed {
            url: url.to_string(),
            message: error.to_string(),
        };
    }

    SourceError::Network {
        url: url.to_string(),
        message: error.to_string(),
    }
}
