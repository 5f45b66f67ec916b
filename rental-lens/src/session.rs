//! Session state for one load action.
//!
//! A [`Session`] owns the loaded tables and the analytical store built from
//! them. It is created only by a successful load and is never mutated: the
//! next load builds a new one and the old one is dropped in full.
//!
//! [`Workbench`] wraps the load state machine
//! `Idle -> Loading -> {Ready | EmptyFolder | PathInvalid}`.

use crate::catalog::QueryCatalog;
use crate::coercion::{coerce_date_columns, CoercionConfig, CoercionReport};
use crate::config::LensConfig;
use crate::executor::{QueryExecutor, QueryOutcome};
use crate::export::export_tables;
use crate::overview::{correlation_matrix, DatasetOverview};
use crate::prelude::*;
use crate::result::QueryResult;
use crate::sources::{load_with_config, LoadReport};
use crate::store::AnalyticalStore;
use crate::table::TableSet;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// The tables, store and reports produced by one successful load.
#[derive(Debug)]
pub struct Session {
    config: LensConfig,
    tables: TableSet,
    store: AnalyticalStore,
    load_report: LoadReport,
    coercion_report: CoercionReport,
    catalog: QueryCatalog,
}

impl Session {
    /// Loads the configured folder, applies date coercion when enabled and
    /// registers every table in a fresh store.
    ///
    /// # Errors
    ///
    /// [`LensError::PathNotFound`] and [`LensError::EmptyInput`] as returned by
    /// the loader, [`LensError::Configuration`] for invalid options.
    #[instrument(skip(config), fields(folder = %config.folder_path.display()))]
    pub async fn load(config: LensConfig) -> Result<Self> {
        config.validate()?;

        let (tables, load_report) = load_with_config(&config).await?;

        let (tables, coercion_report) = if config.auto_coerce_dates {
            coerce_date_columns(tables, &CoercionConfig::from(&config))
        } else {
            (tables, CoercionReport::default())
        };

        let store = AnalyticalStore::from_tables(&tables, config.store.clone())?
            .with_log_config(config.log.clone());

        info!(
            tables = tables.len(),
            rows = tables.total_rows(),
            skipped = load_report.skipped.len(),
            promoted = coercion_report.promoted.len(),
            "Session ready"
        );

        Ok(Self {
            config,
            tables,
            store,
            load_report,
            coercion_report,
            catalog: QueryCatalog::standard(),
        })
    }

    pub fn config(&self) -> &LensConfig {
        &self.config
    }

    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub fn store(&self) -> &AnalyticalStore {
        &self.store
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn coercion_report(&self) -> &CoercionReport {
        &self.coercion_report
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    pub fn executor(&self) -> QueryExecutor<'_> {
        QueryExecutor::new(&self.store)
    }

    /// Runs a catalog query by name.
    ///
    /// Returns an error only for an unknown name; execution failures come back
    /// as [`QueryOutcome::Failed`].
    pub async fn run_query(&self, name: &str) -> Result<QueryOutcome> {
        let query = self.catalog.find(name).ok_or_else(|| {
            LensError::Configuration(format!("Unknown query '{name}'"))
        })?;
        Ok(self.executor().run_definition(query).await)
    }

    /// Runs operator-entered SQL.
    pub async fn run_sql(&self, sql: &str) -> QueryOutcome {
        self.executor().run_adhoc(sql).await
    }

    /// Truncates a result to the configured preview size.
    pub fn preview(&self, result: &QueryResult) -> QueryResult {
        result.head(self.config.max_rows_preview)
    }

    pub fn overview(&self) -> DatasetOverview {
        DatasetOverview::from_tables(&self.tables)
    }

    /// Correlation matrix of the table with the most numeric columns.
    pub async fn correlation(&self) -> Result<Option<(String, QueryResult)>> {
        let Some(name) = self.overview().correlation_table else {
            return Ok(None);
        };
        let Some(table) = self.tables.get(&name) else {
            return Ok(None);
        };
        Ok(correlation_matrix(&self.store, table)
            .await?
            .map(|matrix| (name, matrix)))
    }

    /// Writes every table to `<folder>/exported_tables/<key>.csv`.
    pub fn export(&self) -> Result<Vec<PathBuf>> {
        export_tables(&self.tables, &self.config.export_dir())
    }
}

/// Where the most recent load action left the workbench.
#[derive(Debug, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready(Box<Session>),
    EmptyFolder {
        path: String,
    },
    PathInvalid {
        path: String,
    },
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Idle => f.write_str("idle"),
            LoadState::Loading => f.write_str("loading"),
            LoadState::Ready(_) => f.write_str("ready"),
            LoadState::EmptyFolder { path } => write!(f, "empty folder ({path})"),
            LoadState::PathInvalid { path } => write!(f, "invalid path ({path})"),
        }
    }
}

/// Holds at most one live [`Session`] and drives the load state machine.
#[derive(Debug, Default)]
pub struct Workbench {
    state: LoadState,
}

impl Workbench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Runs a load action.
    ///
    /// Always restarts from `Idle`, dropping any previous session first. A
    /// missing folder or a folder without loadable CSV files is a terminal
    /// state, not an error. Any other failure returns the workbench to `Idle`
    /// and is propagated.
    pub async fn load(&mut self, config: LensConfig) -> Result<&LoadState> {
        self.reset();
        self.state = LoadState::Loading;

        self.state = match Session::load(config).await {
            Ok(session) => LoadState::Ready(Box::new(session)),
            Err(LensError::PathNotFound { path }) => {
                warn!(path = %path, "Folder not found");
                LoadState::PathInvalid { path }
            }
            Err(LensError::EmptyInput { path }) => {
                warn!(path = %path, "No CSV files found in folder");
                LoadState::EmptyFolder { path }
            }
            Err(e) => {
                self.state = LoadState::Idle;
                return Err(e);
            }
        };
        Ok(&self.state)
    }

    /// The live session; fails outside the `Ready` state.
    pub fn session(&self) -> Result<&Session> {
        match &self.state {
            LoadState::Ready(session) => Ok(&**session),
            other => Err(LensError::NotReady {
                state: other.to_string(),
            }),
        }
    }

    /// Drops the live session, if any.
    pub fn reset(&mut self) {
        self.state = LoadState::Idle;
    }
}
