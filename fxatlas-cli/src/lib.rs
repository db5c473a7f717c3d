//! Command-line interface for the fxatlas country catalogue.
#![forbid(unsafe_code)]

use std::io::Write;
use std::num::NonZeroUsize;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use fxatlas_data::SqliteStore;
use fxatlas_data::sources::HttpSources;
use log::debug;
use serde::Serialize;

mod error;
mod query;
mod refresh;

pub use error::CliError;

use query::{CountriesArgs, CountryArgs, DeleteArgs, StatusArgs, SummaryArgs};
use refresh::RefreshArgs;

pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_MAX_CONNECTIONS: &str = "max-connections";
pub(crate) const ARG_SUMMARY_PATH: &str = "summary-path";
pub(crate) const ARG_COUNTRIES_URL: &str = "countries-url";
pub(crate) const ARG_RATES_URL: &str = "rates-url";
pub(crate) const ARG_COUNTRIES_TIMEOUT: &str = "countries-timeout-secs";
pub(crate) const ARG_RATES_TIMEOUT: &str = "rates-timeout-secs";
pub(crate) const ARG_USER_AGENT: &str = "user-agent";
pub(crate) const ARG_REGION: &str = "region";
pub(crate) const ARG_CURRENCY: &str = "currency";
pub(crate) const ARG_SORT: &str = "sort";
pub(crate) const ARG_NAME: &str = "name";
pub(crate) const ENV_COUNTRY_NAME: &str = "FXATLAS_CMDS_COUNTRY_NAME";
pub(crate) const ENV_DELETE_NAME: &str = "FXATLAS_CMDS_DELETE_NAME";

/// Database used when no `--database` is configured.
pub const DEFAULT_DATABASE: &str = "fxatlas.db";

/// Run the fxatlas CLI with the current process arguments and environment.
///
/// Command output is written to standard output as JSON.
pub async fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, &mut stdout).await
}

async fn run_command(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Refresh(args) => {
            let config = args.into_config()?;
            let sources = HttpSources::with_config(config.sources.clone())?;
            refresh::run_refresh_with(&config, sources, writer).await
        }
        Command::Countries(args) => query::list_countries(&args.into_config()?, writer),
        Command::Country(args) => query::show_country(&args.into_config()?, writer),
        Command::Delete(args) => query::delete_country(&args.into_config()?, writer),
        Command::Status(args) => query::show_status(&args.into_config()?, writer),
        Command::Summary(args) => query::show_summary(&args.into_config()?, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "fxatlas",
    about = "Country catalogue priced against live exchange rates",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch both feeds, reconcile them and update the catalogue.
    Refresh(RefreshArgs),
    /// List stored countries.
    Countries(CountriesArgs),
    /// Show one stored country.
    Country(CountryArgs),
    /// Delete one stored country.
    Delete(DeleteArgs),
    /// Show the refresh status.
    Status(StatusArgs),
    /// Show the summary written by the last refresh.
    Summary(SummaryArgs),
}

pub(crate) fn open_store(
    path: &Utf8Path,
    max_connections: NonZeroUsize,
) -> Result<SqliteStore, CliError> {
    fxatlas_fs::ensure_parent_dir(path).map_err(|source| CliError::PrepareDatabase {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("opening country database at {path}");
    SqliteStore::open(path.as_std_path(), max_connections).map_err(|source| {
        CliError::OpenStore {
            path: path.to_path_buf(),
            source,
        }
    })
}

pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
