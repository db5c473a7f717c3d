//! Wire shapes of the upstream JSON payloads.
//!
//! Payloads are decoded into these permissive structs first and then
//! validated into domain types, so one malformed entry yields a precise
//! message instead of a generic decode failure.

use std::collections::BTreeMap;

use fxatlas_core::{CurrencyDescriptor, ExchangeRateTable, RawCountry};
use log::warn;
use serde::Deserialize;
use serde_json::{Number, Value};

/// One entry of the REST Countries v2 response.
#[derive(Debug, Deserialize)]
pub(crate) struct CountryPayload {
    name: Option<String>,
    capital: Option<String>,
    region: Option<String>,
    population: Option<Number>,
    flag: Option<String>,
    currencies: Option<Vec<CurrencyPayload>>,
}

#[derive(Debug, Deserialize)]
struct CurrencyPayload {
    code: Option<String>,
    name: Option<String>,
    symbol: Option<String>,
}

/// The open.er-api latest-rates response; everything but `rates` is ignored.
#[derive(Debug, Deserialize)]
struct RatesPayload {
    rates: Option<BTreeMap<String, Value>>,
}

impl CountryPayload {
    fn into_raw(self, index: usize) -> Result<RawCountry, String> {
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| format!("country #{index} has no name"))?;
        let population = self
            .population
            .ok_or_else(|| format!("country {name} has no population"))?;
        let population = population.as_u64().ok_or_else(|| {
            format!("country {name} has population {population}; expected a non-negative integer")
        })?;
        let currencies = self
            .currencies
            .unwrap_or_default()
            .into_iter()
            .map(|currency| CurrencyDescriptor {
                code: currency.code,
                name: currency.name,
                symbol: currency.symbol,
            })
            .collect();
        Ok(RawCountry {
            name,
            capital: self.capital,
            region: self.region,
            population,
            currencies,
            flag_url: self.flag,
        })
    }
}

/// Decode and validate a country feed body.
pub(crate) fn parse_countries(body: &str) -> Result<Vec<RawCountry>, String> {
    let payload: Vec<CountryPayload> = serde_json::from_str(body)
        .map_err(|err| format!("expected a JSON array of countries: {err}"))?;
    payload
        .into_iter()
        .enumerate()
        .map(|(index, country)| country.into_raw(index))
        .collect()
}

/// Decode a rates body, dropping entries that cannot price anything.
pub(crate) fn parse_rates(body: &str) -> Result<ExchangeRateTable, String> {
    let payload: RatesPayload = serde_json::from_str(body)
        .map_err(|err| format!("expected a JSON object with a rates map: {err}"))?;
    let rates = payload
        .rates
        .ok_or_else(|| "response has no rates map".to_owned())?;

    let mut table = ExchangeRateTable::new();
    for (code, value) in rates {
        let Some(rate) = value.as_f64() else {
            warn!("dropping exchange rate for {code}: {value} is not a number");
            continue;
        };
        if let Err(err) = table.insert(code, rate) {
            warn!("dropping {err}");
        }
    }
    Ok(table)
}
