//! Read and delete commands for the fxatlas CLI.
//!
//! Each command opens the database, runs one store operation and prints the
//! result as JSON. Unknown country names surface as `StoreError::NotFound`.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use fxatlas_core::{
    CountryQuery, CountryStore, SortOrder, StatusStore, remove_country, require_country,
};
use fxatlas_data::read_summary;
use fxatlas_data::store::DEFAULT_MAX_CONNECTIONS;
use fxatlas_data::summary::DEFAULT_SUMMARY_PATH;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_CURRENCY, ARG_DATABASE, ARG_NAME, ARG_REGION, ARG_SORT, ARG_SUMMARY_PATH, CliError,
    DEFAULT_DATABASE, ENV_COUNTRY_NAME, ENV_DELETE_NAME, open_store, write_json,
};

/// CLI arguments for the `countries` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "countries", about = "List stored countries")]
#[ortho_config(prefix = "FXATLAS")]
pub(crate) struct CountriesArgs {
    /// Path to the SQLite country database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Only list countries in this region (case-insensitive).
    #[arg(long = ARG_REGION, value_name = "region")]
    #[serde(default)]
    pub(crate) region: Option<String>,
    /// Only list countries using this currency code (case-insensitive).
    #[arg(long = ARG_CURRENCY, value_name = "code")]
    #[serde(default)]
    pub(crate) currency: Option<String>,
    /// One of `name_asc`, `name_desc`, `gdp_asc` or `gdp_desc`.
    #[arg(long = ARG_SORT, value_name = "order")]
    #[serde(default)]
    pub(crate) sort: Option<String>,
}

impl CountriesArgs {
    pub(crate) fn into_config(self) -> Result<CountriesConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CountriesConfig::try_from(merged)
    }
}

/// Resolved `countries` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CountriesConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) query: CountryQuery,
}

impl TryFrom<CountriesArgs> for CountriesConfig {
    type Error = CliError;

    fn try_from(args: CountriesArgs) -> Result<Self, Self::Error> {
        let sort = args
            .sort
            .as_deref()
            .map(str::parse::<SortOrder>)
            .transpose()?
            .unwrap_or_default();
        let mut query = CountryQuery::default().with_sort(sort);
        if let Some(region) = args.region {
            query = query.with_region(region);
        }
        if let Some(currency) = args.currency {
            query = query.with_currency(currency);
        }
        Ok(Self {
            database: database_or_default(args.database),
            query,
        })
    }
}

/// CLI arguments for the `country` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "country", about = "Show one stored country")]
#[ortho_config(prefix = "FXATLAS")]
pub(crate) struct CountryArgs {
    /// Country name (case-insensitive).
    #[arg(value_name = "name")]
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Path to the SQLite country database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl CountryArgs {
    pub(crate) fn into_config(self) -> Result<NamedCountryConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        NamedCountryConfig::try_from(merged)
    }
}

/// CLI arguments for the `delete` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "delete", about = "Delete one stored country")]
#[ortho_config(prefix = "FXATLAS")]
pub(crate) struct DeleteArgs {
    /// Country name (case-insensitive).
    #[arg(value_name = "name")]
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Path to the SQLite country database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl DeleteArgs {
    pub(crate) fn into_config(self) -> Result<NamedCountryConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        NamedCountryConfig::try_from(merged)
    }
}

/// Resolved configuration for commands addressing one country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NamedCountryConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) name: String,
}

impl NamedCountryConfig {
    fn resolve(
        name: Option<String>,
        database: Option<Utf8PathBuf>,
        env: &'static str,
    ) -> Result<Self, CliError> {
        let name = name
            .filter(|name| !name.trim().is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_NAME,
                env,
            })?;
        Ok(Self {
            database: database_or_default(database),
            name,
        })
    }
}

impl TryFrom<CountryArgs> for NamedCountryConfig {
    type Error = CliError;

    fn try_from(args: CountryArgs) -> Result<Self, Self::Error> {
        Self::resolve(args.name, args.database, ENV_COUNTRY_NAME)
    }
}

impl TryFrom<DeleteArgs> for NamedCountryConfig {
    type Error = CliError;

    fn try_from(args: DeleteArgs) -> Result<Self, Self::Error> {
        Self::resolve(args.name, args.database, ENV_DELETE_NAME)
    }
}

/// CLI arguments for the `status` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "status", about = "Show the refresh status")]
#[ortho_config(prefix = "FXATLAS")]
pub(crate) struct StatusArgs {
    /// Path to the SQLite country database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl StatusArgs {
    pub(crate) fn into_config(self) -> Result<Utf8PathBuf, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(database_or_default(merged.database))
    }
}

/// CLI arguments for the `summary` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "summary", about = "Show the summary written by the last refresh")]
#[ortho_config(prefix = "FXATLAS")]
pub(crate) struct SummaryArgs {
    /// Summary artefact location.
    #[arg(long = ARG_SUMMARY_PATH, value_name = "path")]
    #[serde(default)]
    pub(crate) summary_path: Option<Utf8PathBuf>,
}

impl SummaryArgs {
    pub(crate) fn into_config(self) -> Result<Utf8PathBuf, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(merged
            .summary_path
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_SUMMARY_PATH)))
    }
}

fn database_or_default(database: Option<Utf8PathBuf>) -> Utf8PathBuf {
    database.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE))
}

pub(crate) fn list_countries(
    config: &CountriesConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let store = open_store(&config.database, DEFAULT_MAX_CONNECTIONS)?;
    let rows = store.list(&config.query)?;
    write_json(writer, &rows)
}

pub(crate) fn show_country(
    config: &NamedCountryConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let store = open_store(&config.database, DEFAULT_MAX_CONNECTIONS)?;
    let country = require_country(&store, &config.name)?;
    write_json(writer, &country)
}

#[derive(Debug, Serialize)]
struct Deleted<'a> {
    deleted: &'a str,
}

pub(crate) fn delete_country(
    config: &NamedCountryConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let store = open_store(&config.database, DEFAULT_MAX_CONNECTIONS)?;
    remove_country(&store, &config.name)?;
    info!("deleted {} from {}", config.name, config.database);
    write_json(
        writer,
        &Deleted {
            deleted: &config.name,
        },
    )
}

pub(crate) fn show_status(database: &Utf8Path, writer: &mut dyn Write) -> Result<(), CliError> {
    let store = open_store(database, DEFAULT_MAX_CONNECTIONS)?;
    write_json(writer, &store.status()?)
}

pub(crate) fn show_summary(path: &Utf8Path, writer: &mut dyn Write) -> Result<(), CliError> {
    write_json(writer, &read_summary(path)?)
}
