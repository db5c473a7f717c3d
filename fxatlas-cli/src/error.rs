//! Error types emitted by the fxatlas CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use fxatlas_core::{StoreError, UnknownSortOrder};
use fxatlas_data::{ArtefactError, RefreshError, SourceBuildError, SqliteStoreError};
use thiserror::Error;

/// Errors emitted by the fxatlas CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option was present but unusable.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: &'static str,
    },
    /// The requested sort order is not recognised.
    #[error(transparent)]
    InvalidSort(#[from] UnknownSortOrder),
    /// The upstream feed clients could not be built.
    #[error("failed to configure upstream feeds: {0}")]
    BuildSources(#[from] SourceBuildError),
    /// The database directory could not be created.
    #[error("failed to prepare database directory for {path:?}: {source}")]
    PrepareDatabase {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the country database failed.
    #[error("failed to open country database at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: SqliteStoreError,
    },
    /// A refresh cycle failed.
    #[error("refresh failed: {0}")]
    Refresh(#[from] RefreshError),
    /// A query or delete against the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Reading the summary artefact failed.
    #[error(transparent)]
    Summary(#[from] ArtefactError),
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
