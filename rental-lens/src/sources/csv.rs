//! Reading a single CSV file into Arrow record batches.
//!
//! Two strategies are tried in order. The strict one uses DataFusion's CSV
//! reader with schema inference, which yields typed columns (integers, floats,
//! booleans) but rejects ragged rows, invalid UTF-8 and values that contradict
//! the inferred type. Columns the inference would type as dates or timestamps
//! are read as text instead; temporal typing is left to the coercion pass.
//!
//! The permissive one uses the `csv` crate in flexible mode, pads or truncates
//! rows to the header width and narrows each column to Int64, Float64 or Utf8
//! on its own.

use crate::prelude::*;
use crate::table::LoadedTable;
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use datafusion::prelude::{CsvReadOptions, SessionConfig, SessionContext};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Options for configuring CSV file reading.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV file has a header row
    pub has_header: bool,
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Maximum records the strict reader reads for schema inference
    pub schema_infer_max_records: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            quote: b'"',
            schema_infer_max_records: 1000,
        }
    }
}

/// Which reader produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseStrategy {
    /// DataFusion's typed CSV reader
    Strict,
    /// Flexible `csv` crate reader with per-column narrowing
    Permissive,
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseStrategy::Strict => f.write_str("strict"),
            ParseStrategy::Permissive => f.write_str("permissive"),
        }
    }
}

/// One CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
    options: CsvOptions,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>, options: CsvOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem, which becomes the table key.
    pub fn key(&self) -> Result<String> {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                LensError::parse(
                    self.path.display().to_string(),
                    "file name is not valid UTF-8",
                )
            })
    }

    /// Reads the file, falling back to the permissive reader when the strict one fails.
    ///
    /// Fails only when both strategies fail; the error then carries both messages.
    #[instrument(skip(self, ctx), fields(file = %self.path.display()))]
    pub async fn read(&self, ctx: &SessionContext) -> Result<(LoadedTable, ParseStrategy)> {
        let key = self.key()?;

        let strict_err = match self.read_strict(ctx).await {
            Ok((schema, batches)) => {
                return Ok((LoadedTable::new(key, schema, batches), ParseStrategy::Strict));
            }
            Err(e) => e,
        };

        warn!(
            file = %self.path.display(),
            error = %strict_err,
            "Strict CSV read failed, retrying with permissive reader"
        );

        match self.read_permissive() {
            Ok((schema, batches)) => Ok((
                LoadedTable::new(key, schema, batches),
                ParseStrategy::Permissive,
            )),
            Err(permissive_err) => Err(LensError::parse(
                self.path.display().to_string(),
                format!("strict reader: {strict_err}; permissive reader: {permissive_err}"),
            )),
        }
    }

    /// Typed read through DataFusion.
    pub async fn read_strict(
        &self,
        ctx: &SessionContext,
    ) -> Result<(SchemaRef, Vec<RecordBatch>)> {
        let path = self.path.to_str().ok_or_else(|| {
            LensError::Configuration("Path contains invalid UTF-8".to_string())
        })?;
        // DataFusion filters listed files by extension, and `*.CSV` must still match
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_else(|| ".csv".to_string());

        let options = CsvReadOptions::new()
            .has_header(self.options.has_header)
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .schema_infer_max_records(self.options.schema_infer_max_records)
            .file_extension(&extension);

        let ctx = ordered_context(ctx);
        let df = ctx.read_csv(path, options.clone()).await?;
        let inferred = df.schema().inner().clone();
        if inferred.fields().is_empty() {
            return Err(LensError::parse(
                self.path.display().to_string(),
                "missing header row",
            ));
        }

        let (schema, batches) = match temporal_as_text(&inferred) {
            Some(text_schema) => {
                let df = ctx.read_csv(path, options.schema(&text_schema)).await?;
                let schema = df.schema().inner().clone();
                (schema, df.collect().await?)
            }
            None => (inferred, df.collect().await?),
        };

        debug!(
            file = %self.path.display(),
            csv.strategy = "strict",
            columns = schema.fields().len(),
            batches = batches.len(),
            "CSV read"
        );
        Ok((schema, batches))
    }

    /// Untyped, ragged-row tolerant read through the `csv` crate.
    pub fn read_permissive(&self) -> Result<(SchemaRef, Vec<RecordBatch>)> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.options.has_header)
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .flexible(true)
            .from_path(&self.path)?;

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(LensError::parse(
                self.path.display().to_string(),
                "missing header row",
            ));
        }

        let width = headers.len();
        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
        for record in reader.byte_records() {
            let record = record?;
            for (index, column) in cells.iter_mut().enumerate() {
                let value = record
                    .get(index)
                    .map(|raw| String::from_utf8_lossy(raw).into_owned())
                    .filter(|v| !v.is_empty());
                column.push(value);
            }
        }

        let mut fields = Vec::with_capacity(width);
        let mut arrays = Vec::with_capacity(width);
        for (name, values) in headers.into_iter().zip(cells) {
            let array = narrow_column(values);
            fields.push(Field::new(name, array.data_type().clone(), true));
            arrays.push(array);
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays)?;
        debug!(
            file = %self.path.display(),
            csv.strategy = "permissive",
            rows = batch.num_rows(),
            "CSV read"
        );
        Ok((schema, vec![batch]))
    }
}

/// Picks the narrowest of Int64, Float64 and Utf8 that holds every non-null value.
fn narrow_column(values: Vec<Option<String>>) -> ArrayRef {
    let non_null = || values.iter().flatten();
    let has_values = non_null().next().is_some();

    if has_values && non_null().all(|v| v.trim().parse::<i64>().is_ok()) {
        let ints: Vec<Option<i64>> = values
            .iter()
            .map(|v| v.as_ref().and_then(|s| s.trim().parse().ok()))
            .collect();
        return Arc::new(Int64Array::from(ints));
    }

    if has_values && non_null().all(|v| v.trim().parse::<f64>().is_ok()) {
        let floats: Vec<Option<f64>> = values
            .iter()
            .map(|v| v.as_ref().and_then(|s| s.trim().parse().ok()))
            .collect();
        return Arc::new(Float64Array::from(floats));
    }

    Arc::new(StringArray::from(values))
}

/// Returns true for the string types the coercion heuristic treats as generic.
pub(crate) fn is_string_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

/// Settings under which a CSV scan yields its rows in file order.
pub(crate) fn ordered_scan_config(config: SessionConfig) -> SessionConfig {
    config
        .with_target_partitions(1)
        .with_repartition_file_scans(false)
}

/// Single-partition view of `ctx` sharing its runtime. Large files are
/// otherwise split into byte ranges that come back in completion order.
fn ordered_context(ctx: &SessionContext) -> SessionContext {
    let config = ordered_scan_config(ctx.copied_config());
    SessionContext::new_with_config_rt(config, ctx.runtime_env())
}

/// The inferred schema with every date or timestamp field retyped to Utf8,
/// or `None` when there is nothing to retype.
fn temporal_as_text(schema: &Schema) -> Option<Schema> {
    let mut changed = false;
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| match f.data_type() {
            DataType::Date32
            | DataType::Date64
            | DataType::Timestamp(_, _)
            | DataType::Time32(_)
            | DataType::Time64(_) => {
                changed = true;
                Field::new(f.name(), DataType::Utf8, true)
            }
            _ => (**f).clone(),
        })
        .collect();
    changed.then(|| Schema::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnKind;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        path
    }

    #[tokio::test]
    async fn test_strict_read_infers_types() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "customer.csv",
            "customer_id,first_name,score\n1,Mary,1.5\n2,Patricia,2.5\n",
        );
        let ctx = SessionContext::new();
        let (table, strategy) = CsvFile::new(path, CsvOptions::default())
            .read(&ctx)
            .await
            .unwrap();

        assert_eq!(strategy, ParseStrategy::Strict);
        assert_eq!(table.name(), "customer");
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column_kind("customer_id"), Some(ColumnKind::Integer));
        assert_eq!(table.column_kind("first_name"), Some(ColumnKind::String));
        assert_eq!(table.column_kind("score"), Some(ColumnKind::Float));
    }

    #[tokio::test]
    async fn test_strict_read_keeps_dates_as_text() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "rental.csv",
            "rental_id,rental_date,due\n1,2005-05-24 22:53:30,2005-05-27\n2,2005-05-24 22:54:33,2005-05-28\n",
        );
        let ctx = SessionContext::new();
        let (table, strategy) = CsvFile::new(path, CsvOptions::default())
            .read(&ctx)
            .await
            .unwrap();

        assert_eq!(strategy, ParseStrategy::Strict);
        assert_eq!(table.column_kind("rental_id"), Some(ColumnKind::Integer));
        assert_eq!(table.column_kind("rental_date"), Some(ColumnKind::String));
        assert_eq!(table.column_kind("due"), Some(ColumnKind::String));
        assert_eq!(table.num_rows(), 2);
    }

    #[tokio::test]
    async fn test_large_file_keeps_row_order_on_partitioned_context() {
        // past DataFusion's 10 MiB file-scan repartition threshold
        let dir = TempDir::new().unwrap();
        let filler = "x".repeat(48);
        let mut content = String::with_capacity(16 * 1024 * 1024);
        content.push_str("payment_id,memo\n");
        for id in 0..250_000i64 {
            content.push_str(&format!("{id},{filler}\n"));
        }
        assert!(content.len() > 10 * 1024 * 1024);
        let path = write_file(&dir, "payment.csv", &content);

        let ctx = SessionContext::new_with_config(SessionConfig::new().with_target_partitions(4));
        let (_, batches) = CsvFile::new(path, CsvOptions::default())
            .read_strict(&ctx)
            .await
            .unwrap();

        let ids: Vec<i64> = batches
            .iter()
            .flat_map(|batch| {
                let column = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
                column.values().to_vec()
            })
            .collect();
        assert_eq!(ids.len(), 250_000);
        assert!(ids.windows(2).all(|w| w[0] + 1 == w[1]), "rows out of file order");
        assert_eq!(ids[0], 0);
    }

    #[tokio::test]
    async fn test_ragged_rows_fall_back_to_permissive() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "ragged.csv",
            "id,name,amount\n1,Alice,2.5\n2,Bob\n3,Carol,4.0,extra\n",
        );
        let ctx = SessionContext::new();
        let (table, strategy) = CsvFile::new(path, CsvOptions::default())
            .read(&ctx)
            .await
            .unwrap();

        assert_eq!(strategy, ParseStrategy::Permissive);
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.num_columns(), 3);
        assert_eq!(table.column_kind("id"), Some(ColumnKind::Integer));
        assert_eq!(table.column_kind("amount"), Some(ColumnKind::Float));
        assert_eq!(table.batches()[0].column(2).null_count(), 1);
    }

    #[test]
    fn test_permissive_read_narrows_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "mixed.csv", "a,b,c\n1,x,1.5\n,y,2\n3,,\n");
        let (schema, batches) = CsvFile::new(path, CsvOptions::default())
            .read_permissive()
            .unwrap();

        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        assert_eq!(batches[0].num_rows(), 3);
        assert_eq!(batches[0].column(0).null_count(), 1);
        assert_eq!(batches[0].column(1).null_count(), 1);
    }

    #[test]
    fn test_permissive_read_rejects_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.csv", "");
        let result = CsvFile::new(path, CsvOptions::default()).read_permissive();
        assert!(matches!(result, Err(LensError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_both_strategies_failing_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "broken.csv", "");
        let ctx = SessionContext::new();
        let result = CsvFile::new(path, CsvOptions::default()).read(&ctx).await;
        assert!(matches!(result, Err(LensError::Parse { .. })));
    }

    #[test]
    fn test_key_is_file_stem() {
        let file = CsvFile::new("/data/Film Category.csv", CsvOptions::default());
        assert_eq!(file.key().unwrap(), "Film Category");
    }
}
