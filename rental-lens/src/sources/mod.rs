//! CSV folder loading.
//!
//! [`load_folder`] enumerates the `*.csv` files of one directory
//! (non-recursive, extension matched case-insensitively, sorted by file name)
//! and reads each into a [`crate::table::LoadedTable`]. A file that neither reader can parse
//! is dropped with a warning and listed in [`LoadReport::skipped`]; it never
//! aborts the rest of the load.
//!
//! Tables are keyed by normalized name, so two files whose stems differ only in
//! case (`A.csv`, `a.CSV`) collide. The later file in enumeration order wins.

use crate::prelude::*;
use crate::table::TableSet;
use datafusion::prelude::{SessionConfig, SessionContext};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

mod csv;

pub use self::csv::{CsvFile, CsvOptions, ParseStrategy};
pub(crate) use self::csv::is_string_type;

/// A file dropped from a load because both readers rejected it.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub message: String,
}

/// What happened to each file during a load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Folder that was scanned
    pub folder: String,
    /// Number of `*.csv` files enumerated
    pub files_found: usize,
    /// `(table name, strategy)` per file read, in enumeration order
    pub loaded: Vec<(String, ParseStrategy)>,
    /// Files dropped after both readers failed
    pub skipped: Vec<SkippedFile>,
    /// Table names whose earlier file was overwritten by a later one
    pub replaced: Vec<String>,
}

impl LoadReport {
    /// Number of files read by the permissive fallback.
    pub fn permissive_count(&self) -> usize {
        self.loaded
            .iter()
            .filter(|(_, s)| *s == ParseStrategy::Permissive)
            .count()
    }
}

/// Lists the `*.csv` files directly inside `folder`, sorted by file name.
/// Hidden files such as `._payment.csv` sidecars are not listed.
pub fn enumerate_csv_files(folder: &Path) -> Result<Vec<PathBuf>> {
    use glob::{glob_with, MatchOptions, Pattern};

    let folder_str = folder.to_str().ok_or_else(|| {
        LensError::Configuration("Folder path contains invalid UTF-8".to_string())
    })?;
    let pattern = format!("{}/*.csv", Pattern::escape(folder_str));
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let matches = glob_with(&pattern, options).map_err(|e| {
        LensError::Configuration(format!("Invalid glob pattern '{pattern}': {e}"))
    })?;

    let mut files = Vec::new();
    for entry in matches {
        let path = entry.map_err(|e| LensError::Io(e.into()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Loads every CSV file of `folder` into a [`TableSet`].
///
/// # Errors
///
/// * [`LensError::PathNotFound`] when `folder` is not a directory.
/// * [`LensError::EmptyInput`] when no file could be loaded, either because
///   none matched or because every match was skipped.
#[instrument(skip(options), fields(folder = %folder.display()))]
pub async fn load_folder(folder: &Path, options: &CsvOptions) -> Result<(TableSet, LoadReport)> {
    if !folder.is_dir() {
        return Err(LensError::PathNotFound {
            path: folder.display().to_string(),
        });
    }

    let files = enumerate_csv_files(folder)?;
    let mut report = LoadReport {
        folder: folder.display().to_string(),
        files_found: files.len(),
        ..Default::default()
    };
    if files.is_empty() {
        return Err(LensError::EmptyInput {
            path: folder.display().to_string(),
        });
    }

    // scratch context for the strict reader; tables are re-registered in the store later
    let config = self::csv::ordered_scan_config(SessionConfig::new());
    let ctx = SessionContext::new_with_config(config);
    let mut tables = TableSet::new();

    for path in files {
        let file = CsvFile::new(path, options.clone());
        match file.read(&ctx).await {
            Ok((table, strategy)) => {
                info!(
                    table.name = %table.name(),
                    csv.strategy = %strategy,
                    rows = table.num_rows(),
                    columns = table.num_columns(),
                    "Loaded CSV file"
                );
                report.loaded.push((table.name().to_string(), strategy));
                if let Some(previous) = tables.insert(table) {
                    warn!(
                        table.name = %previous.name(),
                        replaced_key = %previous.key(),
                        "Table name collision, later file replaces earlier one"
                    );
                    report.replaced.push(previous.name().to_string());
                }
            }
            Err(e) => {
                warn!(file = %file.path().display(), error = %e, "Skipping unreadable CSV file");
                report.skipped.push(SkippedFile {
                    file: file.path().display().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    if tables.is_empty() {
        return Err(LensError::EmptyInput {
            path: folder.display().to_string(),
        });
    }

    Ok((tables, report))
}

/// Convenience wrapper building [`CsvOptions`] from a [`crate::config::LensConfig`].
pub async fn load_with_config(config: &crate::config::LensConfig) -> Result<(TableSet, LoadReport)> {
    let options = CsvOptions {
        schema_infer_max_records: config.schema_infer_max_records,
        ..CsvOptions::default()
    };
    load_folder(&config.folder_path, &options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{LogicalRole, TableResolver};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_enumeration_is_sorted_and_non_recursive() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "payment.csv", "a\n1\n");
        write_file(dir.path(), "actor.csv", "a\n1\n");
        write_file(dir.path(), "notes.txt", "ignored");
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_file(&dir.path().join("nested"), "film.csv", "a\n1\n");

        let files = enumerate_csv_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["actor.csv", "payment.csv"]);
    }

    #[test]
    fn test_hidden_files_are_not_enumerated() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "payment.csv", "payment_id\n1\n");
        write_file(dir.path(), ".backup.csv", "payment_id\n2\n");

        let files = enumerate_csv_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("payment.csv"));
    }

    #[tokio::test]
    async fn test_macos_sidecar_does_not_shadow_real_file() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "payment.csv",
            "payment_id,customer_id,amount\n1,1,2.99\n2,2,0.99\n",
        );
        let mut sidecar = std::fs::File::create(dir.path().join("._payment.csv")).unwrap();
        sidecar
            .write_all(&[0x00, 0x05, 0x16, 0x07, 0x00, 0x02, 0x00, 0x00, 0xff, 0xfe, 0x0a])
            .unwrap();

        let (tables, report) = load_folder(dir.path(), &CsvOptions::default())
            .await
            .unwrap();
        assert_eq!(tables.names(), vec!["payment"]);
        assert_eq!(report.files_found, 1);
        assert!(report.skipped.is_empty());
        let resolver = TableResolver::new(tables.names());
        assert_eq!(resolver.resolve_role(LogicalRole::Payment), Some("payment"));
    }

    #[tokio::test]
    async fn test_missing_folder() {
        let result = load_folder(Path::new("/definitely/not/here"), &CsvOptions::default()).await;
        assert!(matches!(result, Err(LensError::PathNotFound { .. })));
    }

    #[tokio::test]
    async fn test_empty_folder() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "readme.md", "# nothing");
        let result = load_folder(dir.path(), &CsvOptions::default()).await;
        assert!(matches!(result, Err(LensError::EmptyInput { .. })));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "customer.csv", "customer_id,first_name\n1,Mary\n");
        write_file(dir.path(), "broken.csv", "");

        let (tables, report) = load_folder(dir.path(), &CsvOptions::default())
            .await
            .unwrap();
        assert_eq!(tables.names(), vec!["customer"]);
        assert_eq!(report.files_found, 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].file.ends_with("broken.csv"));
    }

    #[tokio::test]
    async fn test_spaces_in_file_name_are_normalized() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "Film Category.csv", "film_id,category_id\n1,6\n");

        let (tables, _) = load_folder(dir.path(), &CsvOptions::default())
            .await
            .unwrap();
        let table = tables.get("film_category").unwrap();
        assert_eq!(table.key(), "Film Category");
    }
}
