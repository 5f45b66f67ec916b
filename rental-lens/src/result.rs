//! Tabular query results handed to the presentation layer.

use crate::prelude::*;
use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use arrow::util::pretty::pretty_format_batches;
use std::sync::Arc;

/// Ordered columns plus rows, as produced by one SQL execution.
///
/// Results are display-only: they are never registered back into the store.
#[derive(Debug, Clone)]
pub struct QueryResult {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl QueryResult {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// A result with no columns and no rows, returned when a query fails or is skipped.
    pub fn empty() -> Self {
        Self::new(Arc::new(Schema::empty()), Vec::new())
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> QueryResult {
        let mut remaining = n;
        let mut batches = Vec::new();
        for batch in &self.batches {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(batch.num_rows());
            batches.push(batch.slice(0, take));
            remaining -= take;
        }
        QueryResult::new(self.schema.clone(), batches)
    }

    /// Values of a numeric column cast to `f64`.
    pub fn column_as_f64(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let index = self.schema.index_of(name)?;
        let mut values = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            let casted = cast(batch.column(index), &DataType::Float64)?;
            let floats = casted
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| LensError::Internal(format!("column '{name}' is not numeric")))?;
            values.extend(floats.iter());
        }
        Ok(values)
    }

    /// Values of any column rendered as text; nulls stay `None`.
    pub fn column_as_strings(&self, name: &str) -> Result<Vec<Option<String>>> {
        let index = self.schema.index_of(name)?;
        let options = FormatOptions::default();
        let mut values = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            let array = batch.column(index);
            let formatter = ArrayFormatter::try_new(array.as_ref(), &options)?;
            for row in 0..array.len() {
                if array.is_null(row) {
                    values.push(None);
                } else {
                    values.push(Some(formatter.value(row).to_string()));
                }
            }
        }
        Ok(values)
    }

    /// ASCII table rendering.
    pub fn to_pretty_string(&self) -> Result<String> {
        if self.batches.is_empty() {
            let header = RecordBatch::new_empty(self.schema.clone());
            return Ok(pretty_format_batches(&[header])?.to_string());
        }
        Ok(pretty_format_batches(&self.batches)?.to_string())
    }

    /// Rows as a JSON array of objects keyed by column name.
    pub fn to_json_rows(&self) -> Result<serde_json::Value> {
        let mut writer = arrow::json::ArrayWriter::new(Vec::new());
        let refs: Vec<&RecordBatch> = self.batches.iter().collect();
        writer.write_batches(&refs)?;
        writer.finish()?;
        let bytes = writer.into_inner();
        if bytes.is_empty() {
            return Ok(serde_json::Value::Array(Vec::new()));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Default for QueryResult {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::Field;

    fn sample() -> QueryResult {
        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("total", DataType::Int64, true),
        ]));
        let first = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("a"), Some("b")])),
                Arc::new(Int64Array::from(vec![Some(1), None])),
            ],
        )
        .unwrap();
        let second = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("c")])),
                Arc::new(Int64Array::from(vec![Some(3)])),
            ],
        )
        .unwrap();
        QueryResult::new(schema, vec![first, second])
    }

    #[test]
    fn test_shape() {
        let result = sample();
        assert_eq!(result.num_rows(), 3);
        assert_eq!(result.column_names(), vec!["name", "total"]);
        assert!(!result.is_empty());
        assert!(QueryResult::empty().is_empty());
        assert_eq!(QueryResult::empty().num_columns(), 0);
    }

    #[test]
    fn test_head_spans_batches() {
        let result = sample();
        assert_eq!(result.head(0).num_rows(), 0);
        assert_eq!(result.head(2).num_rows(), 2);
        assert_eq!(result.head(3).num_rows(), 3);
        assert_eq!(result.head(100).num_rows(), 3);
        assert_eq!(
            result.head(3).column_as_strings("name").unwrap(),
            vec![Some("a".to_string()), Some("b".to_string()), Some("c".to_string())]
        );
    }

    #[test]
    fn test_column_accessors() {
        let result = sample();
        assert_eq!(
            result.column_as_f64("total").unwrap(),
            vec![Some(1.0), None, Some(3.0)]
        );
        assert!(result.column_as_f64("missing").is_err());
    }

    #[test]
    fn test_json_rows() {
        let rows = sample().to_json_rows().unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["name"], "a");
        assert_eq!(rows[0]["total"], 1);
        assert!(rows[1].get("total").is_none());
        assert_eq!(QueryResult::empty().to_json_rows().unwrap(), serde_json::json!([]));
    }

    #[test]
    fn test_pretty_string_has_header() {
        let text = sample().to_pretty_string().unwrap();
        assert!(text.contains("name"));
        assert!(text.contains("total"));
        let empty = QueryResult::new(sample().schema().clone(), Vec::new());
        assert!(empty.to_pretty_string().unwrap().contains("total"));
    }
}
