//! Snapshot of the loaded tables back to CSV.

use crate::prelude::*;
use crate::table::{LoadedTable, TableSet};
use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Subdirectory of the input folder that receives exported files.
pub const EXPORT_DIR_NAME: &str = "exported_tables";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Writes every table to `<dir>/<key>.csv` with a header row and no index column.
///
/// The directory is created if missing and existing files are overwritten.
/// Returns the written paths in load order.
#[instrument(skip(tables), fields(tables = tables.len(), dir = %dir.display()))]
pub fn export_tables(tables: &TableSet, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| LensError::export(dir.display().to_string(), e.to_string()))?;

    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("{}.csv", table.key()));
        write_table(table, &path)
            .map_err(|e| LensError::export(path.display().to_string(), e.to_string()))?;
        written.push(path);
    }

    info!(files = written.len(), "Exported tables");
    Ok(written)
}

fn write_table(table: &LoadedTable, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .with_timestamp_format(TIMESTAMP_FORMAT.to_string())
        .build(BufWriter::new(file));

    if table.batches().is_empty() {
        // header only
        writer.write(&RecordBatch::new_empty(table.schema().clone()))?;
    }
    for batch in table.batches() {
        writer.write(batch)?;
    }
    Ok(())
}
