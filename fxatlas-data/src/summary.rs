//! The summary artefact regenerated after every refresh.
//!
//! The artefact is a small JSON document listing the country total and the
//! five largest economies by estimated GDP. It is written atomically so a
//! reader never sees a half-written file.

use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use fxatlas_core::{CountryStore, StoreError, Timestamp};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of countries listed in the summary.
pub const TOP_COUNTRIES: usize = 5;

/// Default artefact location, relative to the working directory.
pub const DEFAULT_SUMMARY_PATH: &str = "cache/summary.json";

/// One ranked country in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    /// Country name.
    pub name: String,
    /// Estimated GDP in US dollars.
    pub estimated_gdp: f64,
}

/// Contents of the summary artefact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Countries stored when the summary was generated.
    pub total_countries: u64,
    /// Largest economies, biggest first.
    pub top_countries: Vec<SummaryEntry>,
    /// When the summary was generated.
    pub generated_at: Timestamp,
}

/// Errors raised while producing or reading the summary artefact.
#[derive(Debug, Error)]
pub enum ArtefactError {
    /// The store could not supply the summary data.
    #[error("failed to read summary data: {source}")]
    Store {
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// The summary could not be encoded or decoded.
    #[error("failed to {operation} summary at {path}: {source}")]
    Json {
        /// Encode or decode.
        operation: &'static str,
        /// Artefact location.
        path: Utf8PathBuf,
        /// Serde failure.
        #[source]
        source: serde_json::Error,
    },
    /// Reading or writing the artefact file failed.
    #[error("failed to {operation} summary at {path}: {source}")]
    Io {
        /// Read or write.
        operation: &'static str,
        /// Artefact location.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// No artefact has been generated yet.
    #[error("no summary found at {path}; run a refresh first")]
    Missing {
        /// Expected artefact location.
        path: Utf8PathBuf,
    },
}

/// Regenerates the summary artefact from current store contents.
pub trait SummaryArtefact: Send + Sync {
    /// Rebuild the artefact and return where it was written.
    fn generate(&self) -> Result<Utf8PathBuf, ArtefactError>;
}

/// Writes [`Summary`] as pretty-printed JSON to a fixed path.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use camino::Utf8PathBuf;
/// use fxatlas_core::{CountryRecord, CountryStore, Timestamp};
/// use fxatlas_data::{JsonSummaryArtefact, SqliteStore, SummaryArtefact, read_summary};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let path = Utf8PathBuf::from_path_buf(dir.path().join("summary.json")).expect("utf-8 path");
/// let store = Arc::new(SqliteStore::open_in_memory()?);
/// store.insert(&CountryRecord::new("Chad", 1), Timestamp::now())?;
///
/// let artefact = JsonSummaryArtefact::new(store, path.clone());
/// assert_eq!(artefact.generate()?, path);
/// assert_eq!(read_summary(&path)?.total_countries, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct JsonSummaryArtefact<S: ?Sized> {
    store: Arc<S>,
    path: Utf8PathBuf,
}

impl<S: CountryStore + ?Sized> JsonSummaryArtefact<S> {
    /// Summarise `store` into `path`.
    pub fn new(store: Arc<S>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    /// Artefact location.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Build the summary without writing it.
    pub fn build(&self) -> Result<Summary, ArtefactError> {
        let total_countries = self
            .store
            .count()
            .map_err(|source| ArtefactError::Store { source })?;
        let top_countries = self
            .store
            .top_by_gdp(TOP_COUNTRIES)
            .map_err(|source| ArtefactError::Store { source })?
            .into_iter()
            .filter_map(|row| {
                row.record.estimated_gdp.map(|estimated_gdp| SummaryEntry {
                    name: row.record.name,
                    estimated_gdp,
                })
            })
            .collect();
        Ok(Summary {
            total_countries,
            top_countries,
            generated_at: Timestamp::now(),
        })
    }
}

impl<S: CountryStore + ?Sized> SummaryArtefact for JsonSummaryArtefact<S> {
    fn generate(&self) -> Result<Utf8PathBuf, ArtefactError> {
        let summary = self.build()?;
        let encoded =
            serde_json::to_vec_pretty(&summary).map_err(|source| ArtefactError::Json {
                operation: "encode",
                path: self.path.clone(),
                source,
            })?;
        fxatlas_fs::write_file_atomically(&self.path, &encoded).map_err(|source| {
            ArtefactError::Io {
                operation: "write",
                path: self.path.clone(),
                source,
            }
        })?;
        info!(
            "wrote summary of {} countries to {}",
            summary.total_countries, self.path
        );
        Ok(self.path.clone())
    }
}

/// Load a previously generated summary.
pub fn read_summary(path: &Utf8Path) -> Result<Summary, ArtefactError> {
    let io_error = |source| ArtefactError::Io {
        operation: "read",
        path: path.to_owned(),
        source,
    };
    if !fxatlas_fs::file_is_file(path).map_err(io_error)? {
        return Err(ArtefactError::Missing {
            path: path.to_owned(),
        });
    }
    let text = fxatlas_fs::read_to_string(path).map_err(io_error)?;
    serde_json::from_str(&text).map_err(|source| ArtefactError::Json {
        operation: "decode",
        path: path.to_owned(),
        source,
    })
}
