//! Date-column promotion.
//!
//! A column is a candidate when its name contains `date` (any case) or its
//! storage type is a string type, and it is not temporal already. For each
//! candidate the first `sample_size` non-null values in stored order are
//! stringified and parsed with [`temporal::parse_datetime`]. When the share of
//! parsed samples reaches `threshold`, every value of the column is re-parsed
//! into a `Timestamp(Nanosecond)` array and unparsable values become null.
//! Otherwise the column is left exactly as it was.
//!
//! Decisions are independent per column and per table, and deterministic for a
//! given input and configuration.

pub mod temporal;

use crate::config::LensConfig;
use crate::prelude::*;
use crate::sources::is_string_type;
use crate::table::{ColumnKind, LoadedTable, TableSet};
use arrow::array::{Array, ArrayRef, TimestampNanosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Sampling parameters of the heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoercionConfig {
    pub sample_size: usize,
    pub threshold: f64,
    /// Log the sampled success rate of every candidate column
    pub log_details: bool,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            sample_size: 2000,
            threshold: 0.6,
            log_details: false,
        }
    }
}

impl From<&LensConfig> for CoercionConfig {
    fn from(config: &LensConfig) -> Self {
        Self {
            sample_size: config.sample_size,
            threshold: config.threshold,
            log_details: config.log.log_coercion_details,
        }
    }
}

/// A column that was retyped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotedColumn {
    pub table: String,
    pub column: String,
    pub success_rate: f64,
    pub sampled: usize,
}

/// Columns promoted by one coercion pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoercionReport {
    pub promoted: Vec<PromotedColumn>,
}

impl CoercionReport {
    pub fn is_promoted(&self, table: &str, column: &str) -> bool {
        self.promoted
            .iter()
            .any(|p| p.table == table && p.column == column)
    }
}

/// Whether a column is eligible for sampling.
pub fn is_candidate(field: &Field) -> bool {
    if ColumnKind::from_data_type(field.data_type()) == ColumnKind::Temporal {
        return false;
    }
    field.name().to_lowercase().contains("date") || is_string_type(field.data_type())
}

/// Collects up to `limit` non-null values of column `index`, stringified, in stored order.
pub fn sample_values(batches: &[RecordBatch], index: usize, limit: usize) -> Result<Vec<String>> {
    let options = FormatOptions::default();
    let mut samples = Vec::with_capacity(limit.min(1024));

    for batch in batches {
        if samples.len() >= limit {
            break;
        }
        let array = batch.column(index);
        let formatter = ArrayFormatter::try_new(array.as_ref(), &options)?;
        for row in 0..array.len() {
            if samples.len() >= limit {
                break;
            }
            if array.is_null(row) {
                continue;
            }
            samples.push(formatter.value(row).to_string());
        }
    }
    Ok(samples)
}

/// Fraction of samples that parse as a date or datetime. `None` for an empty sample.
pub fn success_rate(samples: &[String]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let parsed = samples
        .iter()
        .filter(|s| temporal::parse_timestamp_nanos(s).is_some())
        .count();
    Some(parsed as f64 / samples.len() as f64)
}

/// Promotes likely date columns across every table of the set.
///
/// Never fails: a column whose values cannot be stringified or rebuilt is
/// logged and left untouched.
#[instrument(skip(tables), fields(tables = tables.len()))]
pub fn coerce_date_columns(tables: TableSet, config: &CoercionConfig) -> (TableSet, CoercionReport) {
    let mut report = CoercionReport::default();
    let coerced: TableSet = tables
        .into_iter()
        .map(|table| coerce_table(table, config, &mut report))
        .collect();

    info!(
        promoted = report.promoted.len(),
        sample_size = config.sample_size,
        threshold = config.threshold,
        "Date coercion finished"
    );
    (coerced, report)
}

fn coerce_table(table: LoadedTable, config: &CoercionConfig, report: &mut CoercionReport) -> LoadedTable {
    let mut promote = Vec::new();

    for (index, field) in table.schema().fields().iter().enumerate() {
        if !is_candidate(field) {
            continue;
        }
        let samples = match sample_values(table.batches(), index, config.sample_size) {
            Ok(samples) => samples,
            Err(e) => {
                warn!(table.name = %table.name(), column = %field.name(), error = %e, "Cannot sample column");
                continue;
            }
        };
        let Some(rate) = success_rate(&samples) else {
            debug!(table.name = %table.name(), column = %field.name(), "All-null column, skipped");
            continue;
        };
        if config.log_details {
            debug!(
                table.name = %table.name(),
                column = %field.name(),
                success_rate = rate,
                sampled = samples.len(),
                "Sampled candidate column"
            );
        }
        if rate >= config.threshold {
            promote.push(index);
            report.promoted.push(PromotedColumn {
                table: table.name().to_string(),
                column: field.name().clone(),
                success_rate: rate,
                sampled: samples.len(),
            });
        }
    }

    if promote.is_empty() {
        return table;
    }

    match promote_columns(&table, &promote) {
        Ok((schema, batches)) => {
            info!(table.name = %table.name(), columns = promote.len(), "Promoted columns to timestamp");
            table.with_data(schema, batches)
        }
        Err(e) => {
            warn!(table.name = %table.name(), error = %e, "Column promotion failed, table left unchanged");
            report.promoted.retain(|p| p.table != table.name());
            table
        }
    }
}

fn promote_columns(
    table: &LoadedTable,
    indices: &[usize],
) -> Result<(Arc<Schema>, Vec<RecordBatch>)> {
    let timestamp = DataType::Timestamp(TimeUnit::Nanosecond, None);
    let old_schema = table.schema();

    let fields: Vec<Field> = old_schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| {
            if indices.contains(&i) {
                Field::new(f.name(), timestamp.clone(), true)
            } else {
                (**f).clone()
            }
        })
        .collect();
    let schema = Arc::new(Schema::new_with_metadata(
        fields,
        old_schema.metadata().clone(),
    ));

    let options = FormatOptions::default();
    let mut batches = Vec::with_capacity(table.batches().len());
    for batch in table.batches() {
        let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
        for &i in indices {
            let array = batch.column(i);
            let formatter = ArrayFormatter::try_new(array.as_ref(), &options)?;
            let values: Vec<Option<i64>> = (0..array.len())
                .map(|row| {
                    if array.is_null(row) {
                        None
                    } else {
                        temporal::parse_timestamp_nanos(&formatter.value(row).to_string())
                    }
                })
                .collect();
            columns[i] = Arc::new(TimestampNanosecondArray::from(values));
        }
        batches.push(RecordBatch::try_new(schema.clone(), columns)?);
    }
    Ok((schema, batches))
}
