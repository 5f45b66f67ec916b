//! Configuration for a load action and the session it produces.
//!
//! [`LensConfig`] carries the options the dashboard exposes: where to read CSV
//! files from, whether to run date coercion and with which sampling parameters,
//! and how many rows a preview shows. It can be built in code, deserialized from
//! a (partial) JSON document, or assembled by the CLI from flags.

use crate::logging::LogConfig;
use crate::prelude::*;
use crate::store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Smallest accepted `max_rows_preview`.
pub const MIN_PREVIEW_ROWS: usize = 10;
/// Largest accepted `max_rows_preview`.
pub const MAX_PREVIEW_ROWS: usize = 5000;

/// Options recognized by a load action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LensConfig {
    /// Folder scanned (non-recursively) for `*.csv` files
    pub folder_path: PathBuf,
    /// Whether likely date columns are promoted to timestamps after loading
    pub auto_coerce_dates: bool,
    /// Number of non-null values sampled per candidate column
    pub sample_size: usize,
    /// Minimum fraction of parseable samples required for promotion
    pub threshold: f64,
    /// Rows shown by previews
    pub max_rows_preview: usize,
    /// Rows read by the strict CSV reader to infer a schema
    pub schema_infer_max_records: usize,
    /// Settings for the embedded SQL engine
    pub store: StoreConfig,
    /// Logging toggles; not part of the serialized form
    #[serde(skip)]
    pub log: LogConfig,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            folder_path: PathBuf::from("./data"),
            auto_coerce_dates: true,
            sample_size: 2000,
            threshold: 0.6,
            max_rows_preview: 200,
            schema_infer_max_records: 1000,
            store: StoreConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl LensConfig {
    /// Creates a default configuration reading from `folder`.
    pub fn for_folder(folder: impl Into<PathBuf>) -> Self {
        Self::default().with_folder(folder)
    }

    /// Reads a JSON configuration file. Keys that are absent keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LensError::Configuration(format!(
                "Cannot read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&text)
    }

    /// Parses a JSON configuration document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the folder to load.
    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder_path = folder.into();
        self
    }

    /// Enables or disables date coercion.
    pub fn with_auto_coerce_dates(mut self, enabled: bool) -> Self {
        self.auto_coerce_dates = enabled;
        self
    }

    /// Sets the coercion sample size.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Sets the coercion success threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the number of rows shown by previews.
    pub fn with_max_rows_preview(mut self, rows: usize) -> Self {
        self.max_rows_preview = rows;
        self
    }

    /// Sets the engine configuration.
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Sets the logging toggles.
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Checks every option against its accepted range.
    pub fn validate(&self) -> Result<()> {
        if self.folder_path.as_os_str().is_empty() {
            return Err(LensError::Configuration(
                "folder_path cannot be empty".to_string(),
            ));
        }
        if self.sample_size == 0 {
            return Err(LensError::Configuration(
                "sample_size must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(LensError::Configuration(format!(
                "threshold must be between 0 and 1, got {}",
                self.threshold
            )));
        }
        if !(MIN_PREVIEW_ROWS..=MAX_PREVIEW_ROWS).contains(&self.max_rows_preview) {
            return Err(LensError::Configuration(format!(
                "max_rows_preview must be between {MIN_PREVIEW_ROWS} and {MAX_PREVIEW_ROWS}, got {}",
                self.max_rows_preview
            )));
        }
        if self.schema_infer_max_records == 0 {
            return Err(LensError::Configuration(
                "schema_infer_max_records must be greater than zero".to_string(),
            ));
        }
        self.store.validate()
    }

    /// Directory that [`crate::export::export_tables`] writes into.
    pub fn export_dir(&self) -> PathBuf {
        self.folder_path.join(crate::export::EXPORT_DIR_NAME)
    }
}
