//! Error types for rental-lens.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! [`LensError`]. Boundaries that must never unwind (per-file parsing, per-query
//! execution) convert a `LensError` into a reported outcome instead of
//! propagating it; see [`crate::executor::QueryOutcome`] and
//! [`crate::sources::LoadReport`].

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The main error type for rental-lens.
#[derive(Error, Debug)]
pub enum LensError {
    /// The folder handed to a load action does not exist or is not a directory.
    #[error("Folder not found: {path}")]
    PathNotFound { path: String },

    /// The folder exists but yielded no loadable CSV file.
    #[error("No CSV files found in folder: {path}")]
    EmptyInput { path: String },

    /// A CSV file could not be parsed by either the strict or the permissive reader.
    #[error("Failed to parse '{file}': {message}")]
    Parse {
        /// File that failed
        file: String,
        /// Detailed error message
        message: String,
    },

    /// SQL failed to plan or execute against the analytical store.
    #[error("SQL execution error: {message}")]
    Query {
        /// The SQL text that was submitted
        sql: String,
        /// Engine error message
        message: String,
    },

    /// An operation that needs a loaded session was invoked in another state.
    #[error("No dataset loaded (current state: {state})")]
    NotReady { state: String },

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Writing exported tables failed.
    #[error("Export to '{path}' failed: {message}")]
    Export { path: String, message: String },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from the permissive CSV reader.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`LensError`], handed to the presentation layer
/// alongside the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Path,
    EmptyInput,
    Parse,
    Query,
    Resolution,
    State,
    Configuration,
    Export,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Path => "path",
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::Parse => "parse",
            ErrorKind::Query => "query",
            ErrorKind::Resolution => "resolution",
            ErrorKind::State => "state",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Export => "export",
            ErrorKind::Internal => "internal",
        };
        f.write_str(label)
    }
}

/// A type alias for `Result<T, LensError>`.
pub type Result<T> = std::result::Result<T, LensError>;

impl LensError {
    /// Creates a new parse error for the given file.
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Creates a new query error carrying the submitted SQL.
    pub fn query(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Creates a new export error.
    pub fn export(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Export {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LensError::PathNotFound { .. } => ErrorKind::Path,
            LensError::EmptyInput { .. } => ErrorKind::EmptyInput,
            LensError::Parse { .. } | LensError::Csv(_) => ErrorKind::Parse,
            LensError::Query { .. } | LensError::DataFusion(_) | LensError::Arrow(_) => {
                ErrorKind::Query
            }
            LensError::NotReady { .. } => ErrorKind::State,
            LensError::Configuration(_) | LensError::Json(_) => ErrorKind::Configuration,
            LensError::Export { .. } => ErrorKind::Export,
            LensError::Io(_) | LensError::Internal(_) => ErrorKind::Internal,
        }
    }
}
