//! Filters and ordering for country listings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::StoredCountry;

/// Ordering applied to a country listing.
///
/// GDP orders always place rows without an estimate last and break ties by
/// name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Alphabetical by name.
    #[default]
    NameAsc,
    /// Reverse alphabetical by name.
    NameDesc,
    /// Smallest GDP estimate first.
    GdpAsc,
    /// Largest GDP estimate first.
    GdpDesc,
}

impl SortOrder {
    /// Every supported order.
    pub const ALL: [Self; 4] = [Self::NameAsc, Self::NameDesc, Self::GdpAsc, Self::GdpDesc];

    /// Canonical lowercase token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
            Self::GdpAsc => "gdp_asc",
            Self::GdpDesc => "gdp_desc",
        }
    }

    pub(crate) fn compare(self, left: &StoredCountry, right: &StoredCountry) -> Ordering {
        let by_name = || fold_case(&left.record.name).cmp(&fold_case(&right.record.name));
        match self {
            Self::NameAsc => by_name(),
            Self::NameDesc => by_name().reverse(),
            Self::GdpAsc | Self::GdpDesc => {
                match (left.record.estimated_gdp, right.record.estimated_gdp) {
                    (Some(a), Some(b)) => {
                        let ord = a.total_cmp(&b);
                        let ord = if self == Self::GdpDesc { ord.reverse() } else { ord };
                        ord.then_with(by_name)
                    }
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => by_name(),
                }
            }
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported sort token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sort order {0}; expected one of name_asc, name_desc, gdp_asc, gdp_desc")]
pub struct UnknownSortOrder(pub String);

impl FromStr for SortOrder {
    type Err = UnknownSortOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSortOrder(s.to_owned()))
    }
}

/// Filters and ordering for [`crate::CountryStore::list`].
///
/// Region and currency filters compare case-insensitively and combine with
/// logical AND.
///
/// # Examples
/// ```
/// use fxatlas_core::{CountryQuery, SortOrder};
///
/// let query = CountryQuery::default()
///     .with_region("Africa")
///     .with_sort(SortOrder::GdpDesc);
/// assert_eq!(query.region.as_deref(), Some("Africa"));
/// assert!(query.currency.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryQuery {
    /// Only rows in this region.
    pub region: Option<String>,
    /// Only rows priced in this currency.
    pub currency: Option<String>,
    /// Result ordering.
    pub sort: SortOrder,
}

impl CountryQuery {
    /// Restrict to `region`.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Restrict to `currency`.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Order results by `sort`.
    #[must_use]
    pub const fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub(crate) fn matches(&self, country: &StoredCountry) -> bool {
        field_matches(self.region.as_deref(), country.record.region.as_deref())
            && field_matches(
                self.currency.as_deref(),
                country.record.currency_code.as_deref(),
            )
    }
}

fn field_matches(filter: Option<&str>, value: Option<&str>) -> bool {
    match (filter, value) {
        (None, _) => true,
        (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
        (Some(_), None) => false,
    }
}

/// Case-folded form of a country name, used as its natural key.
///
/// Folding is Unicode-aware, so names such as `Curaçao` and `CURAÇAO` share
/// a key.
///
/// # Examples
/// ```
/// use fxatlas_core::fold_case;
///
/// assert_eq!(fold_case("ÅLAND Islands"), fold_case("åland islands"));
/// ```
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}
