//! Merge the country feed with the exchange-rate table.
//!
//! Reconciliation is pure apart from the multiplier draw: given the same
//! inputs and the same multiplier sequence it always yields the same records.

use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{CountryRecord, ExchangeRateTable, RawCountry};

/// Inclusive bounds of the GDP multiplier.
pub const MULTIPLIER_RANGE: RangeInclusive<u32> = 1000..=2000;

/// Supplies one GDP multiplier per priced country.
///
/// Implementations must return values inside [`MULTIPLIER_RANGE`].
pub trait MultiplierSource {
    /// Draw the next multiplier.
    fn next_multiplier(&mut self) -> u32;
}

/// [`RngMultiplier`] seeded from operating-system entropy.
pub type EntropyMultiplier = RngMultiplier<StdRng>;

/// Draws multipliers uniformly from [`MULTIPLIER_RANGE`] using `R`.
///
/// # Examples
/// ```
/// use fxatlas_core::{MULTIPLIER_RANGE, MultiplierSource, RngMultiplier};
///
/// let mut multipliers = RngMultiplier::from_entropy();
/// assert!(MULTIPLIER_RANGE.contains(&multipliers.next_multiplier()));
/// ```
#[derive(Debug, Clone)]
pub struct RngMultiplier<R> {
    rng: R,
}

impl<R: Rng> RngMultiplier<R> {
    /// Draw from the supplied generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl EntropyMultiplier {
    /// Draw from a generator seeded by the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> MultiplierSource for RngMultiplier<R> {
    fn next_multiplier(&mut self) -> u32 {
        self.rng.gen_range(MULTIPLIER_RANGE)
    }
}

/// Turn one upstream country into a persistable record.
///
/// The outcome depends on the primary currency:
///
/// - no usable code: no rate and an estimated GDP of exactly `0.0`;
/// - a code missing from `rates`: no rate and no GDP estimate;
/// - a priced code: the rate plus `population * multiplier / rate`, drawing
///   exactly one multiplier.
///
/// Blank capital, region and flag values become `None`.
///
/// # Examples
/// ```
/// use fxatlas_core::{ExchangeRateTable, RawCountry, RngMultiplier, reconcile};
///
/// let chad = RawCountry::new("Chad", 16_425_859);
/// let record = reconcile(&chad, &ExchangeRateTable::new(), &mut RngMultiplier::from_entropy());
/// assert_eq!(record.estimated_gdp, Some(0.0));
/// ```
pub fn reconcile(
    country: &RawCountry,
    rates: &ExchangeRateTable,
    multipliers: &mut dyn MultiplierSource,
) -> CountryRecord {
    let currency_code = country.primary_currency().map(str::to_owned);
    let (exchange_rate, estimated_gdp) = match currency_code.as_deref() {
        None => (None, Some(0.0)),
        Some(code) => rates.rate(code).map_or((None, None), |rate| {
            let multiplier = multipliers.next_multiplier();
            (
                Some(rate),
                Some(estimate_gdp(country.population, multiplier, rate)),
            )
        }),
    };

    CountryRecord {
        name: country.name.clone(),
        capital: non_blank(country.capital.as_deref()),
        region: non_blank(country.region.as_deref()),
        population: country.population,
        currency_code,
        exchange_rate,
        estimated_gdp,
        flag_url: non_blank(country.flag_url.as_deref()),
    }
}

/// Reconcile a whole feed, preserving order.
///
/// Multipliers are drawn in feed order.
pub fn reconcile_all(
    countries: &[RawCountry],
    rates: &ExchangeRateTable,
    multipliers: &mut dyn MultiplierSource,
) -> Vec<CountryRecord> {
    countries
        .iter()
        .map(|country| reconcile(country, rates, multipliers))
        .collect()
}

// Populations stay far below 2^53, so the conversion is exact in practice.
fn estimate_gdp(population: u64, multiplier: u32, rate: f64) -> f64 {
    population as f64 * f64::from(multiplier) / rate
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedMultiplier;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::{fixture, rstest};

    #[fixture]
    fn rates() -> ExchangeRateTable {
        let mut table = ExchangeRateTable::new();
        table.insert("NGN", 1600.0).expect("valid rate");
        table.insert("GHS", 12.5).expect("valid rate");
        table
    }

    #[rstest]
    fn priced_country_gets_rate_and_estimate(rates: ExchangeRateTable) {
        let nigeria = RawCountry::new("Nigeria", 206_139_589)
            .with_capital("Abuja")
            .with_region("Africa")
            .with_currency("NGN")
            .with_flag_url("https://flagcdn.com/ng.svg");
        let mut multipliers = FixedMultiplier::new(1500);

        let record = reconcile(&nigeria, &rates, &mut multipliers);

        assert_eq!(record.currency_code.as_deref(), Some("NGN"));
        assert_eq!(record.exchange_rate, Some(1600.0));
        assert_eq!(
            record.estimated_gdp,
            Some(206_139_589.0 * 1500.0 / 1600.0)
        );
        assert_eq!(record.capital.as_deref(), Some("Abuja"));
        assert_eq!(multipliers.draws(), 1);
    }

    #[rstest]
    fn country_without_currency_gets_zero_estimate(rates: ExchangeRateTable) {
        let mut multipliers = FixedMultiplier::new(1500);
        let record = reconcile(&RawCountry::new("Antarctica", 1000), &rates, &mut multipliers);

        assert_eq!(record.currency_code, None);
        assert_eq!(record.exchange_rate, None);
        assert_eq!(record.estimated_gdp, Some(0.0));
        assert_eq!(multipliers.draws(), 0);
    }

    #[rstest]
    fn unknown_currency_leaves_estimate_empty(rates: ExchangeRateTable) {
        let country = RawCountry::new("Zimbabwe", 14_862_924).with_currency("ZWL");
        let mut multipliers = FixedMultiplier::new(1500);

        let record = reconcile(&country, &rates, &mut multipliers);

        assert_eq!(record.currency_code.as_deref(), Some("ZWL"));
        assert_eq!(record.exchange_rate, None);
        assert_eq!(record.estimated_gdp, None);
        assert_eq!(multipliers.draws(), 0);
    }

    #[rstest]
    fn blank_optional_fields_become_none(rates: ExchangeRateTable) {
        let country = RawCountry::new("Nowhere", 5)
            .with_capital("")
            .with_region("   ")
            .with_flag_url("");
        let record = reconcile(&country, &rates, &mut FixedMultiplier::new(1000));

        assert_eq!(record.capital, None);
        assert_eq!(record.region, None);
        assert_eq!(record.flag_url, None);
    }

    #[rstest]
    fn zero_population_estimates_zero(rates: ExchangeRateTable) {
        let country = RawCountry::new("Empty", 0).with_currency("GHS");
        let record = reconcile(&country, &rates, &mut FixedMultiplier::new(2000));
        assert_eq!(record.estimated_gdp, Some(0.0));
    }

    #[rstest]
    fn reconcile_all_preserves_feed_order(rates: ExchangeRateTable) {
        let feed = vec![
            RawCountry::new("Ghana", 31_072_940).with_currency("GHS"),
            RawCountry::new("Chad", 16_425_859),
            RawCountry::new("Nigeria", 206_139_589).with_currency("NGN"),
        ];
        let mut multipliers = FixedMultiplier::new(1200);

        let records = reconcile_all(&feed, &rates, &mut multipliers);

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Ghana", "Chad", "Nigeria"]);
        assert_eq!(multipliers.draws(), 2);
    }

    #[rstest]
    fn seeded_multipliers_stay_in_range_and_vary() {
        let mut multipliers = RngMultiplier::new(ChaCha8Rng::seed_from_u64(7));
        let draws: Vec<u32> = (0..64).map(|_| multipliers.next_multiplier()).collect();

        assert!(draws.iter().all(|m| MULTIPLIER_RANGE.contains(m)));
        assert!(draws.windows(2).any(|pair| pair.first() != pair.get(1)));
    }

    #[rstest]
    fn repeated_reconciliation_draws_fresh_multipliers(rates: ExchangeRateTable) {
        let country = RawCountry::new("Ghana", 31_072_940).with_currency("GHS");
        let mut multipliers = RngMultiplier::new(ChaCha8Rng::seed_from_u64(11));

        let estimates: Vec<_> = (0..16)
            .filter_map(|_| reconcile(&country, &rates, &mut multipliers).estimated_gdp)
            .collect();

        assert_eq!(estimates.len(), 16);
        assert!(estimates.windows(2).any(|pair| pair.first() != pair.get(1)));
    }
}
