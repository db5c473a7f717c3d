//! Refresh command implementation for the fxatlas CLI.

use std::io::Write;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use fxatlas_data::sources::{ExternalSources, HttpSourcesConfig};
use fxatlas_data::store::DEFAULT_MAX_CONNECTIONS;
use fxatlas_data::summary::DEFAULT_SUMMARY_PATH;
use fxatlas_data::{JsonSummaryArtefact, Refresher};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_COUNTRIES_TIMEOUT, ARG_COUNTRIES_URL, ARG_DATABASE, ARG_MAX_CONNECTIONS, ARG_RATES_TIMEOUT,
    ARG_RATES_URL, ARG_SUMMARY_PATH, ARG_USER_AGENT, CliError, DEFAULT_DATABASE, open_store,
    write_json,
};

/// CLI arguments for the `refresh` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "refresh",
    long_about = "Fetch the country feed and the exchange-rate table, \
                 reconcile them into priced records, upsert every record \
                 into the database, regenerate the summary and record the \
                 refresh status. Values can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Refresh the country catalogue"
)]
#[ortho_config(prefix = "FXATLAS")]
pub(crate) struct RefreshArgs {
    /// Path to the SQLite country database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Ceiling on simultaneously open database connections.
    #[arg(long = ARG_MAX_CONNECTIONS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_connections: Option<usize>,
    /// Where to write the summary artefact.
    #[arg(long = ARG_SUMMARY_PATH, value_name = "path")]
    #[serde(default)]
    pub(crate) summary_path: Option<Utf8PathBuf>,
    /// Country feed endpoint.
    #[arg(long = ARG_COUNTRIES_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) countries_url: Option<String>,
    /// Exchange-rate feed endpoint.
    #[arg(long = ARG_RATES_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) rates_url: Option<String>,
    /// Deadline for the country request, in seconds.
    #[arg(long = ARG_COUNTRIES_TIMEOUT, value_name = "secs")]
    #[serde(default)]
    pub(crate) countries_timeout_secs: Option<u64>,
    /// Deadline for the exchange-rate request, in seconds.
    #[arg(long = ARG_RATES_TIMEOUT, value_name = "secs")]
    #[serde(default)]
    pub(crate) rates_timeout_secs: Option<u64>,
    /// User agent sent to both feeds.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
}

impl RefreshArgs {
    pub(crate) fn into_config(self) -> Result<AppConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AppConfig::try_from(merged)
    }
}

/// Resolved `refresh` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppConfig {
    /// Path to the SQLite country database.
    pub(crate) database: Utf8PathBuf,
    /// Connection ceiling for the database pool.
    pub(crate) max_connections: NonZeroUsize,
    /// Summary artefact location.
    pub(crate) summary_path: Utf8PathBuf,
    /// Upstream feed settings.
    pub(crate) sources: HttpSourcesConfig,
}

impl TryFrom<RefreshArgs> for AppConfig {
    type Error = CliError;

    fn try_from(args: RefreshArgs) -> Result<Self, Self::Error> {
        let max_connections = match args.max_connections {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(count) => NonZeroUsize::new(count).ok_or(CliError::InvalidArgument {
                field: ARG_MAX_CONNECTIONS,
                reason: "must be at least 1",
            })?,
        };

        let mut sources = HttpSourcesConfig::default();
        if let Some(url) = args.countries_url {
            sources = sources.with_countries_url(url);
        }
        if let Some(url) = args.rates_url {
            sources = sources.with_rates_url(url);
        }
        if let Some(secs) = args.countries_timeout_secs {
            sources = sources.with_countries_timeout(timeout(secs, ARG_COUNTRIES_TIMEOUT)?);
        }
        if let Some(secs) = args.rates_timeout_secs {
            sources = sources.with_rates_timeout(timeout(secs, ARG_RATES_TIMEOUT)?);
        }
        if let Some(agent) = args.user_agent {
            sources = sources.with_user_agent(agent);
        }

        Ok(Self {
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            max_connections,
            summary_path: args
                .summary_path
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_SUMMARY_PATH)),
            sources,
        })
    }
}

fn timeout(secs: u64, field: &'static str) -> Result<Duration, CliError> {
    if secs == 0 {
        return Err(CliError::InvalidArgument {
            field,
            reason: "must be at least one second",
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Run one refresh against `sources` and print the report.
pub(crate) async fn run_refresh_with<S: ExternalSources>(
    config: &AppConfig,
    sources: S,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let store = Arc::new(open_store(&config.database, config.max_connections)?);
    let artefact = JsonSummaryArtefact::new(Arc::clone(&store), config.summary_path.clone());
    let report = Refresher::new(sources, store, artefact).refresh().await?;
    info!(
        "refreshed {} countries into {}",
        report.countries_processed, config.database
    );
    write_json(writer, &report)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<AppConfig, CliError> {
    let merged = RefreshArgs::merge_from_layers(layers).map_err(CliError::from)?;
    AppConfig::try_from(merged)
}
