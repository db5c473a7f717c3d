//! Errors shared by every store implementation.

use std::error::Error as StdError;

use thiserror::Error;

/// Failure reported by a [`crate::CountryStore`] or [`crate::StatusStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No country matched the requested name.
    #[error("country {name} not found")]
    NotFound {
        /// Name that was looked up.
        name: String,
    },
    /// An insert collided with an existing name.
    #[error("country {name} already exists")]
    Duplicate {
        /// Colliding name.
        name: String,
    },
    /// A stored value does not fit the domain type.
    #[error("stored {field} value {value} is out of range")]
    OutOfRange {
        /// Column or field that held the value.
        field: &'static str,
        /// Offending value rendered as text.
        value: String,
    },
    /// The backing store failed.
    #[error("store failed to {operation}: {source}")]
    Backend {
        /// Operation that was being attempted.
        operation: &'static str,
        /// Error raised by the backend.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl StoreError {
    /// Wrap a backend failure raised while performing `operation`.
    ///
    /// # Examples
    /// ```
    /// use fxatlas_core::StoreError;
    ///
    /// let err = StoreError::backend("count countries", "disk on fire");
    /// assert_eq!(err.to_string(), "store failed to count countries: disk on fire");
    /// ```
    pub fn backend(
        operation: &'static str,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }
}
