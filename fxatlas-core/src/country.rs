//! Country shapes as fetched upstream and as persisted.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::Timestamp;

/// One currency entry from the upstream country feed.
///
/// Every field is optional because the upstream feed omits them freely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurrencyDescriptor {
    /// ISO-4217 style code, for example `NGN`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub code: Option<String>,
    /// Human readable currency name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
    /// Display symbol.
    #[cfg_attr(feature = "serde", serde(default))]
    pub symbol: Option<String>,
}

impl CurrencyDescriptor {
    /// Build a descriptor carrying only a currency code.
    ///
    /// # Examples
    /// ```
    /// use fxatlas_core::CurrencyDescriptor;
    ///
    /// let ngn = CurrencyDescriptor::with_code("NGN");
    /// assert_eq!(ngn.code.as_deref(), Some("NGN"));
    /// ```
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }
}

/// A country as delivered by the upstream country feed.
///
/// Only `name` and `population` are guaranteed; [`crate::reconcile`] fills the
/// gaps when turning this into a [`CountryRecord`].
///
/// # Examples
/// ```
/// use fxatlas_core::RawCountry;
///
/// let country = RawCountry::new("Ghana", 31_072_940)
///     .with_capital("Accra")
///     .with_currency("GHS");
/// assert_eq!(country.primary_currency(), Some("GHS"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCountry {
    /// Display name. Unique case-insensitively across the catalogue.
    pub name: String,
    /// Capital city, when the feed supplies one.
    pub capital: Option<String>,
    /// Continental region, when the feed supplies one.
    pub region: Option<String>,
    /// Head count.
    pub population: u64,
    /// Currencies in feed order; only the first one is ever used.
    pub currencies: Vec<CurrencyDescriptor>,
    /// Flag image location.
    pub flag_url: Option<String>,
}

impl RawCountry {
    /// Create a country with only the mandatory fields set.
    pub fn new(name: impl Into<String>, population: u64) -> Self {
        Self {
            name: name.into(),
            capital: None,
            region: None,
            population,
            currencies: Vec::new(),
            flag_url: None,
        }
    }

    /// Set the capital city.
    #[must_use]
    pub fn with_capital(mut self, capital: impl Into<String>) -> Self {
        self.capital = Some(capital.into());
        self
    }

    /// Set the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Append a currency descriptor carrying `code`.
    #[must_use]
    pub fn with_currency(mut self, code: impl Into<String>) -> Self {
        self.currencies.push(CurrencyDescriptor::with_code(code));
        self
    }

    /// Set the flag image location.
    #[must_use]
    pub fn with_flag_url(mut self, flag_url: impl Into<String>) -> Self {
        self.flag_url = Some(flag_url.into());
        self
    }

    /// Code of the first listed currency, ignoring blank codes.
    ///
    /// Later descriptors are never consulted, even when the first carries no
    /// code.
    pub fn primary_currency(&self) -> Option<&str> {
        self.currencies
            .first()
            .and_then(|currency| currency.code.as_deref())
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// A reconciled country ready to be written to a store.
///
/// The record carries no identity and no refresh time; both are assigned by
/// the store on write.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CountryRecord {
    /// Display name, the natural key.
    pub name: String,
    /// Capital city or `None` when unknown.
    pub capital: Option<String>,
    /// Region or `None` when unknown.
    pub region: Option<String>,
    /// Head count.
    pub population: u64,
    /// Primary currency code.
    pub currency_code: Option<String>,
    /// Units of the primary currency per US dollar.
    pub exchange_rate: Option<f64>,
    /// Randomised GDP estimate in US dollars.
    pub estimated_gdp: Option<f64>,
    /// Flag image location.
    pub flag_url: Option<String>,
}

impl CountryRecord {
    /// Create a record with only the mandatory fields set.
    ///
    /// # Examples
    /// ```
    /// use fxatlas_core::CountryRecord;
    ///
    /// let record = CountryRecord::new("Chad", 16_425_859);
    /// assert!(record.currency_code.is_none());
    /// ```
    pub fn new(name: impl Into<String>, population: u64) -> Self {
        Self {
            name: name.into(),
            capital: None,
            region: None,
            population,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: None,
            flag_url: None,
        }
    }
}

/// A persisted country row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoredCountry {
    /// Store-assigned identifier.
    pub id: i64,
    /// The country data.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub record: CountryRecord,
    /// When this row was last written.
    pub last_refreshed_at: Timestamp,
}

/// Errors returned by [`ExchangeRateTable::insert`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExchangeRateError {
    /// The rate was zero, negative, infinite or NaN.
    #[error("exchange rate for {code} must be a positive finite number, got {rate}")]
    InvalidRate {
        /// Currency code the rate was offered for.
        code: String,
        /// Offending value.
        rate: f64,
    },
}

/// Units of each currency per US dollar, keyed by currency code.
///
/// Codes are matched exactly; `usd` and `USD` are distinct keys.
///
/// # Examples
/// ```
/// use fxatlas_core::ExchangeRateTable;
///
/// # fn main() -> Result<(), fxatlas_core::ExchangeRateError> {
/// let mut rates = ExchangeRateTable::new();
/// rates.insert("NGN", 1600.0)?;
/// assert_eq!(rates.rate("NGN"), Some(1600.0));
/// assert!(rates.insert("XXX", 0.0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeRateTable {
    rates: BTreeMap<String, f64>,
}

impl ExchangeRateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rate for `code`.
    ///
    /// Rates must be strictly positive and finite so they can divide safely.
    pub fn insert(&mut self, code: impl Into<String>, rate: f64) -> Result<(), ExchangeRateError> {
        let code = code.into();
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ExchangeRateError::InvalidRate { code, rate });
        }
        self.rates.insert(code, rate);
        Ok(())
    }

    /// Look up the rate for `code`.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Number of currencies in the table.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether the table holds no rates.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-3.5)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn rejects_unusable_rates(#[case] rate: f64) {
        let mut table = ExchangeRateTable::new();
        let err = table.insert("ABC", rate).expect_err("rate must be rejected");
        assert!(matches!(err, ExchangeRateError::InvalidRate { ref code, .. } if code == "ABC"));
        assert!(table.is_empty());
    }

    #[rstest]
    fn rate_lookup_is_case_sensitive() {
        let mut table = ExchangeRateTable::new();
        table.insert("USD", 1.0).expect("valid rate");
        assert_eq!(table.rate("USD"), Some(1.0));
        assert_eq!(table.rate("usd"), None);
    }

    #[rstest]
    fn later_insert_replaces_rate() {
        let mut table = ExchangeRateTable::new();
        table.insert("EUR", 0.9).expect("valid rate");
        table.insert("EUR", 0.92).expect("valid rate");
        assert_eq!(table.len(), 1);
        assert_eq!(table.rate("EUR"), Some(0.92));
    }

    #[rstest]
    #[case::first_wins(vec![CurrencyDescriptor::with_code("XAF"), CurrencyDescriptor::with_code("EUR")], Some("XAF"))]
    #[case::none_listed(Vec::new(), None)]
    #[case::blank_code(vec![CurrencyDescriptor::with_code("  ")], None)]
    #[case::first_without_code(vec![CurrencyDescriptor::default(), CurrencyDescriptor::with_code("EUR")], None)]
    fn primary_currency_uses_first_descriptor(
        #[case] currencies: Vec<CurrencyDescriptor>,
        #[case] expected: Option<&str>,
    ) {
        let mut country = RawCountry::new("Somewhere", 1);
        country.currencies = currencies;
        assert_eq!(country.primary_currency(), expected);
    }
}
