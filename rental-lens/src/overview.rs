//! Dataset health summary shown before any query runs.

use crate::prelude::*;
use crate::result::QueryResult;
use crate::security::SqlSecurity;
use crate::store::AnalyticalStore;
use crate::table::{LoadedTable, TableSet};
use serde::Serialize;
use tracing::debug;

/// Row count of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRowCount {
    pub table: String,
    pub rows: usize,
}

/// Totals and per-table counts for a loaded table set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub tables_loaded: usize,
    pub total_rows: usize,
    pub total_columns: usize,
    /// Sorted by rows, descending; ties keep load order
    pub row_counts: Vec<TableRowCount>,
    /// Table with the most numeric columns, if any has at least two
    pub correlation_table: Option<String>,
}

impl DatasetOverview {
    pub fn from_tables(tables: &TableSet) -> Self {
        let mut row_counts: Vec<TableRowCount> = tables
            .iter()
            .map(|t| TableRowCount {
                table: t.name().to_string(),
                rows: t.num_rows(),
            })
            .collect();
        // stable sort keeps load order among equal counts
        row_counts.sort_by(|a, b| b.rows.cmp(&a.rows));

        let mut correlation_table = None;
        let mut best = 1;
        for table in tables {
            let numeric = numeric_columns(table).len();
            if numeric > best {
                best = numeric;
                correlation_table = Some(table.name().to_string());
            }
        }

        Self {
            tables_loaded: tables.len(),
            total_rows: tables.total_rows(),
            total_columns: tables.iter().map(|t| t.num_columns()).sum(),
            row_counts,
            correlation_table,
        }
    }
}

/// Names of the integer and float columns of a table, in schema order.
pub fn numeric_columns(table: &LoadedTable) -> Vec<String> {
    table
        .columns()
        .into_iter()
        .filter(|c| c.kind.is_numeric())
        .map(|c| c.name)
        .collect()
}

/// Pearson correlation between every pair of numeric columns of `table`.
///
/// The result has a leading `column` label followed by one column per numeric
/// column, one row per numeric column. Returns `None` when the table has fewer
/// than two numeric columns.
pub async fn correlation_matrix(
    store: &AnalyticalStore,
    table: &LoadedTable,
) -> Result<Option<QueryResult>> {
    let columns = numeric_columns(table);
    if columns.len() < 2 {
        return Ok(None);
    }

    let relation = SqlSecurity::quote_identifier(table.name());
    let rows: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(ordinal, row)| {
            let cells: Vec<String> = columns
                .iter()
                .map(|col| {
                    format!(
                        "corr(CAST({} AS DOUBLE), CAST({} AS DOUBLE)) AS {}",
                        SqlSecurity::quote_identifier(row),
                        SqlSecurity::quote_identifier(col),
                        SqlSecurity::quote_identifier(col)
                    )
                })
                .collect();
            format!(
                "SELECT {ordinal} AS ordinal, '{}' AS \"column\", {} FROM {relation}",
                row.replace('\'', "''"),
                cells.join(", ")
            )
        })
        .collect();

    let projection: Vec<String> = columns
        .iter()
        .map(|c| SqlSecurity::quote_identifier(c))
        .collect();
    let sql = format!(
        "SELECT \"column\", {} FROM ({}) m ORDER BY ordinal",
        projection.join(", "),
        rows.join(" UNION ALL ")
    );

    debug!(table.name = %table.name(), columns = columns.len(), "Computing correlation matrix");
    store.execute(&sql).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn numbers() -> LoadedTable {
        let schema = Arc::new(Schema::new(vec![
            Field::new("x", DataType::Int64, true),
            Field::new("label", DataType::Utf8, true),
            Field::new("y", DataType::Float64, true),
            Field::new("z", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3, 4])),
                Arc::new(StringArray::from(vec!["a", "b", "c", "d"])),
                Arc::new(Float64Array::from(vec![2.0, 4.0, 6.0, 8.0])),
                Arc::new(Float64Array::from(vec![8.0, 6.0, 4.0, 2.0])),
            ],
        )
        .unwrap();
        LoadedTable::new("numbers", schema, vec![batch])
    }

    fn names() -> LoadedTable {
        let schema = Arc::new(Schema::new(vec![Field::new("name", DataType::Utf8, true)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["a", "b", "c", "d"]))],
        )
        .unwrap();
        LoadedTable::new("names", schema, vec![batch])
    }

    #[test]
    fn test_overview_totals() {
        let tables: TableSet = vec![names(), numbers()].into_iter().collect();
        let overview = DatasetOverview::from_tables(&tables);

        assert_eq!(overview.tables_loaded, 2);
        assert_eq!(overview.total_rows, 8);
        assert_eq!(overview.total_columns, 5);
        // equal row counts keep load order
        assert_eq!(overview.row_counts[0].table, "names");
        assert_eq!(overview.correlation_table.as_deref(), Some("numbers"));
    }

    #[test]
    fn test_no_correlation_table_below_two_numeric_columns() {
        let tables: TableSet = std::iter::once(names()).collect();
        assert_eq!(DatasetOverview::from_tables(&tables).correlation_table, None);
    }

    #[tokio::test]
    async fn test_correlation_matrix() {
        let table = numbers();
        let tables: TableSet = std::iter::once(table.clone()).collect();
        let store = AnalyticalStore::from_tables(&tables, StoreConfig::default()).unwrap();

        let matrix = correlation_matrix(&store, &table).await.unwrap().unwrap();
        assert_eq!(matrix.column_names(), vec!["column", "x", "y", "z"]);
        assert_eq!(matrix.num_rows(), 3);

        let labels = matrix.column_as_strings("column").unwrap();
        assert_eq!(labels[0].as_deref(), Some("x"));

        let y = matrix.column_as_f64("y").unwrap();
        let z = matrix.column_as_f64("z").unwrap();
        assert!((y[0].unwrap() - 1.0).abs() < 1e-9);
        assert!((z[0].unwrap() + 1.0).abs() < 1e-9);

        assert!(correlation_matrix(&store, &names()).await.unwrap().is_none());
    }
}
