//! Failure-isolating query execution.
//!
//! Every entry point returns a [`QueryOutcome`] instead of a `Result`: a
//! failed statement is logged, turned into [`QueryOutcome::Failed`], and leaves
//! the store untouched for the next query. A dashboard query whose tables
//! cannot be resolved is [`QueryOutcome::Skipped`] and never reaches the engine.

use crate::catalog::{QueryCatalog, QueryDefinition, TemplateBinding};
use crate::error::ErrorKind;
use crate::prelude::*;
use crate::resolver::{Binding, LogicalRole, TableResolver};
use crate::result::QueryResult;
use crate::security::SqlSecurity;
use crate::store::AnalyticalStore;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Why a statement produced no rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub sql: String,
}

impl QueryFailure {
    fn from_error(sql: &str, error: &LensError) -> Self {
        let message = match error {
            LensError::Query { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            kind: error.kind(),
            message,
            sql: sql.to_string(),
        }
    }
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

/// The result contract handed to the presentation layer.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// A well-formed result, possibly with zero rows.
    Rows(QueryResult),
    /// Planning or execution failed.
    Failed(QueryFailure),
    /// A required logical role had no matching table.
    Skipped {
        query: String,
        missing: Vec<LogicalRole>,
    },
}

impl QueryOutcome {
    /// The rows, or an empty result for failed and skipped queries.
    pub fn result(&self) -> QueryResult {
        match self {
            QueryOutcome::Rows(result) => result.clone(),
            _ => QueryResult::empty(),
        }
    }

    pub fn into_result(self) -> QueryResult {
        match self {
            QueryOutcome::Rows(result) => result,
            _ => QueryResult::empty(),
        }
    }

    /// Operator-facing notice for anything but a successful run.
    pub fn message(&self) -> Option<String> {
        match self {
            QueryOutcome::Rows(_) => None,
            QueryOutcome::Failed(failure) => Some(failure.to_string()),
            QueryOutcome::Skipped { query, missing } => {
                let roles: Vec<&str> = missing.iter().map(|r| r.as_str()).collect();
                Some(format!(
                    "'{query}' skipped: no table found for {}. Rename or add CSV files with those names.",
                    roles.join(", ")
                ))
            }
        }
    }

    pub fn is_rows(&self) -> bool {
        matches!(self, QueryOutcome::Rows(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, QueryOutcome::Skipped { .. })
    }
}

/// Runs SQL against one store, resolving dashboard templates against its tables.
#[derive(Debug)]
pub struct QueryExecutor<'a> {
    store: &'a AnalyticalStore,
    resolver: TableResolver,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a AnalyticalStore) -> Self {
        Self {
            store,
            resolver: TableResolver::new(store.table_names().iter().cloned()),
        }
    }

    pub fn resolver(&self) -> &TableResolver {
        &self.resolver
    }

    /// Executes SQL text and isolates any failure.
    pub async fn execute_sql(&self, sql: &str) -> QueryOutcome {
        match self.store.execute(sql).await {
            Ok(result) => {
                debug!(rows = result.num_rows(), "Query succeeded");
                QueryOutcome::Rows(result)
            }
            Err(e) => {
                warn!(error = %e, error.kind = %e.kind(), "Query failed");
                QueryOutcome::Failed(QueryFailure::from_error(sql, &e))
            }
        }
    }

    /// Executes operator-entered SQL. Blank text is reported without touching the engine.
    #[instrument(skip(self, sql))]
    pub async fn run_adhoc(&self, sql: &str) -> QueryOutcome {
        if let Err(e) = SqlSecurity::validate_adhoc_sql(sql) {
            warn!(error = %e, "Rejected ad-hoc SQL");
            return QueryOutcome::Failed(QueryFailure::from_error(sql, &e));
        }
        self.execute_sql(sql).await
    }

    /// Binds and runs one catalog entry.
    #[instrument(skip(self, query), fields(query.name = %query.name))]
    pub async fn run_definition(&self, query: &QueryDefinition) -> QueryOutcome {
        match query.binding {
            TemplateBinding::Canonical => self.execute_sql(query.sql_template).await,
            TemplateBinding::Resolved(roles) => match self.resolver.bind(roles) {
                Binding::Complete(bound) => {
                    let sql = query.render(&bound);
                    self.execute_sql(&sql).await
                }
                Binding::Missing(missing) => {
                    info!(missing = ?missing, "Required tables not loaded, query skipped");
                    QueryOutcome::Skipped {
                        query: query.name.to_string(),
                        missing,
                    }
                }
            },
        }
    }

    /// Runs every catalog entry in order.
    pub async fn run_catalog(
        &self,
        catalog: &QueryCatalog,
    ) -> Vec<(&'static QueryDefinition, QueryOutcome)> {
        let mut outcomes = Vec::with_capacity(catalog.len());
        for query in catalog.iter() {
            outcomes.push((query, self.run_definition(query).await));
        }
        outcomes
    }
}
