//! The embedded SQL engine holding one load's tables.
//!
//! [`AnalyticalStore`] wraps a DataFusion [`SessionContext`] created fresh for
//! each load action. Tables are registered as in-memory `MemTable`s under
//! their normalized names and are never modified afterwards.

use crate::logging::{truncate_field, LogConfig};
use crate::prelude::*;
use crate::result::QueryResult;
use crate::table::{LoadedTable, TableSet};
use datafusion::common::TableReference;
use datafusion::datasource::MemTable;
use datafusion::execution::context::{SessionConfig, SessionContext};
use datafusion::execution::memory_pool::{FairSpillPool, MemoryPool};
use datafusion::execution::runtime_env::RuntimeEnvBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Engine settings for an [`AnalyticalStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Batch size for query execution
    pub batch_size: usize,
    /// Target number of partitions for parallel execution
    pub target_partitions: usize,
    /// Maximum memory for query execution (in bytes)
    pub max_memory: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            target_partitions: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4),
            max_memory: 2 * 1024 * 1024 * 1024, // 2GB
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.target_partitions == 0 || self.max_memory == 0 {
            return Err(LensError::Configuration(
                "store batch_size, target_partitions and max_memory must be greater than zero"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// An isolated, in-memory SQL context over the tables of one load.
pub struct AnalyticalStore {
    inner: SessionContext,
    tables: Vec<String>,
    config: StoreConfig,
    log: LogConfig,
}

impl std::fmt::Debug for AnalyticalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticalStore")
            .field("tables", &self.tables)
            .field("config", &self.config)
            .finish()
    }
}

impl AnalyticalStore {
    /// Creates an empty store with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store with custom settings.
    #[instrument(skip(config))]
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let session_config = SessionConfig::new()
            .with_batch_size(config.batch_size)
            .with_target_partitions(config.target_partitions)
            .with_information_schema(true);

        let memory_pool = Arc::new(FairSpillPool::new(config.max_memory)) as Arc<dyn MemoryPool>;

        let runtime_env = RuntimeEnvBuilder::new()
            .with_memory_pool(memory_pool)
            .build()
            .map(Arc::new)?;

        let inner = SessionContext::new_with_config_rt(session_config, runtime_env);

        Ok(Self {
            inner,
            tables: Vec::new(),
            config,
            log: LogConfig::default(),
        })
    }

    /// Creates a store and registers every table of the set.
    #[instrument(skip(tables, config), fields(tables = tables.len()))]
    pub fn from_tables(tables: &TableSet, config: StoreConfig) -> Result<Self> {
        let mut store = Self::with_config(config)?;
        for table in tables {
            store.register_table(table)?;
        }
        Ok(store)
    }

    /// Sets the logging toggles used by [`AnalyticalStore::execute`].
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Registers a table under its normalized name.
    pub fn register_table(&mut self, table: &LoadedTable) -> Result<()> {
        let provider = MemTable::try_new(table.schema().clone(), vec![table.batches().to_vec()])?;
        // bare reference: names such as `film-category` must not be parsed as SQL
        self.inner
            .register_table(TableReference::bare(table.name()), Arc::new(provider))?;
        if !self.tables.iter().any(|t| t == table.name()) {
            self.tables.push(table.name().to_string());
        }
        debug!(table.name = %table.name(), rows = table.num_rows(), "Registered table");
        Ok(())
    }

    /// Returns the underlying DataFusion context.
    pub fn inner(&self) -> &SessionContext {
        &self.inner
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Registered table names in registration order.
    pub fn table_names(&self) -> &[String] {
        &self.tables
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t == name)
    }

    /// Plans and runs one SQL statement, collecting the full result.
    #[instrument(skip(self, sql))]
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        if self.log.log_sql {
            debug!(sql = %truncate_field(sql, self.log.max_field_length), "Executing SQL");
        }
        let df = self
            .inner
            .sql(sql)
            .await
            .map_err(|e| LensError::query(sql, e.to_string()))?;
        let schema = df.schema().inner().clone();
        let batches = df
            .collect()
            .await
            .map_err(|e| LensError::query(sql, e.to_string()))?;
        Ok(QueryResult::new(schema, batches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;

    fn customers() -> LoadedTable {
        let schema = Arc::new(Schema::new(vec![
            Field::new("customer_id", DataType::Int64, true),
            Field::new("first_name", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec!["Mary", "Patricia", "Linda"])),
            ],
        )
        .unwrap();
        LoadedTable::new("Customer", schema, vec![batch])
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.batch_size, 8192);
        assert_eq!(config.max_memory, 2 * 1024 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = StoreConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(AnalyticalStore::with_config(config).is_err());
    }

    #[tokio::test]
    async fn test_register_and_query() {
        let tables: TableSet = std::iter::once(customers()).collect();
        let store = AnalyticalStore::from_tables(&tables, StoreConfig::default()).unwrap();

        assert!(store.has_table("customer"));
        assert_eq!(store.table_names(), ["customer".to_string()]);

        let result = store
            .execute("SELECT COUNT(*) AS n FROM customer")
            .await
            .unwrap();
        assert_eq!(result.num_rows(), 1);
        assert_eq!(result.column_as_f64("n").unwrap(), vec![Some(3.0)]);
    }

    #[tokio::test]
    async fn test_missing_table_is_query_error() {
        let store = AnalyticalStore::new().unwrap();
        let err = store.execute("SELECT * FROM payment").await.unwrap_err();
        assert!(matches!(err, LensError::Query { .. }));
    }

    #[tokio::test]
    async fn test_information_schema_enabled() {
        let tables: TableSet = std::iter::once(customers()).collect();
        let store = AnalyticalStore::from_tables(&tables, StoreConfig::default()).unwrap();
        let result = store
            .execute("SELECT table_name FROM information_schema.tables WHERE table_name = 'customer'")
            .await
            .unwrap();
        assert_eq!(result.num_rows(), 1);
    }
}
