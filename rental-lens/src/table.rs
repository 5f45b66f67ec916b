//! In-memory tables produced by a load action.
//!
//! A [`LoadedTable`] is the Arrow form of one CSV file. A [`TableSet`] keeps the
//! tables of one load in load order, keyed by their normalized name.

use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::fmt;

/// Normalizes a file stem into a table name: lowercase, spaces replaced by underscores.
pub fn normalize_table_name(key: &str) -> String {
    key.to_lowercase().replace(' ', "_")
}

/// Storage type of a column as seen by the coercion heuristic and the overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnKind {
    String,
    Integer,
    Float,
    Boolean,
    Temporal,
    Other,
}

impl ColumnKind {
    /// Classifies an Arrow data type.
    pub fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => ColumnKind::String,
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnKind::Integer,
            DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => ColumnKind::Float,
            DataType::Boolean => ColumnKind::Boolean,
            DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
                ColumnKind::Temporal
            }
            _ => ColumnKind::Other,
        }
    }

    /// Whether the column holds numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnKind::String => "string",
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Temporal => "temporal",
            ColumnKind::Other => "other",
        };
        f.pad(label)
    }
}

/// Name and storage type of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    pub data_type: String,
}

/// One CSV file held as Arrow record batches.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    key: String,
    name: String,
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl LoadedTable {
    /// Creates a table from the file stem `key` and its data.
    pub fn new(key: impl Into<String>, schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        let key = key.into();
        Self {
            name: normalize_table_name(&key),
            key,
            schema,
            batches,
        }
    }

    /// File stem the table was loaded from; used as the export file name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Name the table is registered under in the analytical store.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Number of rows across all batches.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// Ordered column names and their storage types.
    pub fn columns(&self) -> Vec<ColumnInfo> {
        self.schema
            .fields()
            .iter()
            .map(|field| ColumnInfo {
                name: field.name().clone(),
                kind: ColumnKind::from_data_type(field.data_type()),
                data_type: field.data_type().to_string(),
            })
            .collect()
    }

    /// Storage type of the named column, if present.
    pub fn column_kind(&self, column: &str) -> Option<ColumnKind> {
        self.schema
            .field_with_name(column)
            .ok()
            .map(|field| ColumnKind::from_data_type(field.data_type()))
    }

    /// Replaces schema and data, keeping key and name.
    pub(crate) fn with_data(self, schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self {
            schema,
            batches,
            ..self
        }
    }
}

/// The tables of one load action, in load order.
///
/// Inserting a table whose normalized name is already present replaces the
/// existing entry in place, so `A.csv` followed by `a.CSV` leaves one table at
/// the position of the first file holding the data of the second.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    tables: Vec<LoadedTable>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a table, returning the one it replaced.
    pub fn insert(&mut self, table: LoadedTable) -> Option<LoadedTable> {
        match self.tables.iter().position(|t| t.name == table.name) {
            Some(index) => Some(std::mem::replace(&mut self.tables[index], table)),
            None => {
                self.tables.push(table);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&LoadedTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LoadedTable> {
        self.tables.iter()
    }

    /// Registered names in load order.
    pub fn names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    /// Total rows across every table.
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.num_rows()).sum()
    }
}

impl IntoIterator for TableSet {
    type Item = LoadedTable;
    type IntoIter = std::vec::IntoIter<LoadedTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

impl<'a> IntoIterator for &'a TableSet {
    type Item = &'a LoadedTable;
    type IntoIter = std::slice::Iter<'a, LoadedTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

impl FromIterator<LoadedTable> for TableSet {
    fn from_iter<I: IntoIterator<Item = LoadedTable>>(iter: I) -> Self {
        let mut set = TableSet::new();
        for table in iter {
            set.insert(table);
        }
        set
    }
}
