//! [`CountryStore`] over the `countries` table.

use fxatlas_core::{
    CountryQuery, CountryRecord, CountryStore, SortOrder, StoreError, StoredCountry, Timestamp,
    fold_case,
};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use super::SqliteStore;

const SELECT_COUNTRY: &str = "SELECT id, name, capital, region, population, currency_code,
        exchange_rate, estimated_gdp, flag_url, last_refreshed_at
    FROM countries";

/// A `countries` row before range checks.
struct CountryRow {
    id: i64,
    name: String,
    capital: Option<String>,
    region: Option<String>,
    population: i64,
    currency_code: Option<String>,
    exchange_rate: Option<f64>,
    estimated_gdp: Option<f64>,
    flag_url: Option<String>,
    last_refreshed_at: i64,
}

impl CountryRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            capital: row.get(2)?,
            region: row.get(3)?,
            population: row.get(4)?,
            currency_code: row.get(5)?,
            exchange_rate: row.get(6)?,
            estimated_gdp: row.get(7)?,
            flag_url: row.get(8)?,
            last_refreshed_at: row.get(9)?,
        })
    }

    fn into_stored(self) -> Result<StoredCountry, StoreError> {
        let population =
            u64::try_from(self.population).map_err(|_| StoreError::OutOfRange {
                field: "population",
                value: self.population.to_string(),
            })?;
        Ok(StoredCountry {
            id: self.id,
            record: CountryRecord {
                name: self.name,
                capital: self.capital,
                region: self.region,
                population,
                currency_code: self.currency_code,
                exchange_rate: self.exchange_rate,
                estimated_gdp: self.estimated_gdp,
                flag_url: self.flag_url,
            },
            last_refreshed_at: Timestamp::from_millis(self.last_refreshed_at),
        })
    }
}

fn population_param(record: &CountryRecord) -> Result<i64, StoreError> {
    i64::try_from(record.population).map_err(|_| StoreError::OutOfRange {
        field: "population",
        value: record.population.to_string(),
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

const fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::NameAsc => "ORDER BY name_key ASC",
        SortOrder::NameDesc => "ORDER BY name_key DESC",
        SortOrder::GdpAsc => "ORDER BY estimated_gdp IS NULL, estimated_gdp ASC, name_key ASC",
        SortOrder::GdpDesc => "ORDER BY estimated_gdp IS NULL, estimated_gdp DESC, name_key ASC",
    }
}

fn collect_rows(
    rows: impl Iterator<Item = rusqlite::Result<CountryRow>>,
    operation: &'static str,
) -> Result<Vec<StoredCountry>, StoreError> {
    rows.map(|row| {
        row.map_err(|source| StoreError::backend(operation, source))?
            .into_stored()
    })
    .collect()
}

impl CountryStore for SqliteStore {
    fn find_by_name(&self, name: &str) -> Result<Option<StoredCountry>, StoreError> {
        self.pool.with_connection(|conn| {
            let row = conn
                .query_row(
                    &format!("{SELECT_COUNTRY} WHERE name_key = ?1"),
                    [fold_case(name)],
                    CountryRow::read,
                )
                .optional()
                .map_err(|source| StoreError::backend("find country by name", source))?;
            row.map(CountryRow::into_stored).transpose()
        })
    }

    fn insert(&self, record: &CountryRecord, refreshed_at: Timestamp) -> Result<i64, StoreError> {
        let population = population_param(record)?;
        self.pool.with_connection(|conn| {
            conn.execute(
                "INSERT INTO countries (
                    name, capital, region, population, currency_code,
                    exchange_rate, estimated_gdp, flag_url, last_refreshed_at, name_key
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.name,
                    record.capital,
                    record.region,
                    population,
                    record.currency_code,
                    record.exchange_rate,
                    record.estimated_gdp,
                    record.flag_url,
                    refreshed_at.as_millis(),
                    fold_case(&record.name),
                ],
            )
            .map_err(|source| {
                if is_unique_violation(&source) {
                    StoreError::Duplicate {
                        name: record.name.clone(),
                    }
                } else {
                    StoreError::backend("insert country", source)
                }
            })?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update_by_name(
        &self,
        record: &CountryRecord,
        refreshed_at: Timestamp,
    ) -> Result<bool, StoreError> {
        let population = population_param(record)?;
        self.pool.with_connection(|conn| {
            let changed = conn
                .execute(
                    "UPDATE countries SET
                        capital = ?2,
                        region = ?3,
                        population = ?4,
                        currency_code = ?5,
                        exchange_rate = ?6,
                        estimated_gdp = ?7,
                        flag_url = ?8,
                        last_refreshed_at = ?9
                    WHERE name_key = ?1",
                    params![
                        fold_case(&record.name),
                        record.capital,
                        record.region,
                        population,
                        record.currency_code,
                        record.exchange_rate,
                        record.estimated_gdp,
                        record.flag_url,
                        refreshed_at.as_millis(),
                    ],
                )
                .map_err(|source| StoreError::backend("update country", source))?;
            Ok(changed > 0)
        })
    }

    fn delete_by_name(&self, name: &str) -> Result<bool, StoreError> {
        self.pool.with_connection(|conn| {
            let removed = conn
                .execute(
                    "DELETE FROM countries WHERE name_key = ?1",
                    [fold_case(name)],
                )
                .map_err(|source| StoreError::backend("delete country", source))?;
            Ok(removed > 0)
        })
    }

    fn list(&self, query: &CountryQuery) -> Result<Vec<StoredCountry>, StoreError> {
        let mut filters = Vec::new();
        let mut values: Vec<&str> = Vec::new();
        if let Some(region) = query.region.as_deref() {
            values.push(region);
            filters.push(format!("region = ?{} COLLATE NOCASE", values.len()));
        }
        if let Some(currency) = query.currency.as_deref() {
            values.push(currency);
            filters.push(format!("currency_code = ?{} COLLATE NOCASE", values.len()));
        }
        let where_clause = if filters.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", filters.join(" AND "))
        };
        let sql = format!("{SELECT_COUNTRY} {where_clause} {}", order_clause(query.sort));

        self.pool.with_connection(|conn| {
            let mut statement = conn
                .prepare_cached(&sql)
                .map_err(|source| StoreError::backend("prepare country listing", source))?;
            let rows = statement
                .query_map(params_from_iter(values.iter()), CountryRow::read)
                .map_err(|source| StoreError::backend("list countries", source))?;
            collect_rows(rows, "read country row")
        })
    }

    fn count(&self) -> Result<u64, StoreError> {
        let total: i64 = self.pool.with_connection(|conn| {
            conn.query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))
                .map_err(|source| StoreError::backend("count countries", source))
        })?;
        u64::try_from(total).map_err(|_| StoreError::OutOfRange {
            field: "count",
            value: total.to_string(),
        })
    }

    fn top_by_gdp(&self, limit: usize) -> Result<Vec<StoredCountry>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.pool.with_connection(|conn| {
            let mut statement = conn
                .prepare_cached(&format!(
                    "{SELECT_COUNTRY} WHERE estimated_gdp IS NOT NULL
                        ORDER BY estimated_gdp DESC, name_key ASC LIMIT ?1"
                ))
                .map_err(|source| StoreError::backend("prepare top countries", source))?;
            let rows = statement
                .query_map([limit], CountryRow::read)
                .map_err(|source| StoreError::backend("rank countries by GDP", source))?;
            collect_rows(rows, "read country row")
        })
    }
}
