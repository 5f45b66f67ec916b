//! rental-lens command line front-end
//!
//! Loads a CSV folder and prints tables, catalog queries, ad-hoc SQL results,
//! or exports the loaded tables. Every subcommand except `init-sample` runs a
//! fresh load action first.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rental_lens::catalog::QueryDefinition;
use rental_lens::config::LensConfig;
use rental_lens::executor::QueryOutcome;
use rental_lens::logging::setup::{init_logging, LoggingConfig};
use rental_lens::logging::LogConfig;
use rental_lens::overview::numeric_columns;
use rental_lens::resolver::Binding;
use rental_lens::sample_data::write_sample_dataset;
use rental_lens::session::{LoadState, Session, Workbench};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder containing the CSV files [default: ./data]
    #[arg(long, short, env = "RENTAL_LENS_FOLDER", global = true)]
    folder: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip promotion of date-like columns to timestamps
    #[arg(long, global = true)]
    no_coerce_dates: bool,

    /// Non-null values sampled per candidate date column
    #[arg(long, global = true)]
    sample_size: Option<usize>,

    /// Minimum share of parseable samples for promotion (0..1)
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Rows shown per result (10..5000)
    #[arg(long, global = true)]
    max_rows: Option<usize>,

    /// Print results as JSON rows instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Debug-level logging for rental-lens
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dataset overview: tables, columns, row counts, promoted columns
    Tables,
    /// List catalog queries and whether their tables are present
    Catalog,
    /// Run one catalog query by name
    Run { name: String },
    /// Run every dashboard query and summarize the outcomes
    Dashboard,
    /// Run ad-hoc SQL
    Sql { sql: String },
    /// Export every loaded table to <folder>/exported_tables
    Export,
    /// Write the miniature DVD-rental dataset into a folder
    InitSample { dir: PathBuf },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let logging = if args.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default().with_lens_level(Level::WARN)
    };
    init_logging(logging.with_json_format(args.json_logs))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<ExitCode> {
    if let Command::InitSample { dir } = &args.command {
        let written = write_sample_dataset(dir)?;
        println!("Wrote {} files to {}", written.len(), dir.display());
        return Ok(ExitCode::SUCCESS);
    }

    let config = build_config(&args)?;
    let mut workbench = Workbench::new();
    match workbench.load(config).await? {
        LoadState::Ready(_) => {}
        LoadState::PathInvalid { path } => {
            eprintln!("Folder not found: {path}");
            return Ok(ExitCode::from(2));
        }
        LoadState::EmptyFolder { path } => {
            eprintln!("No CSV files found in folder: {path}");
            return Ok(ExitCode::from(3));
        }
        other => anyhow::bail!("unexpected load state: {other}"),
    }
    let session = workbench.session()?;

    match &args.command {
        Command::Tables => print_tables(session).await?,
        Command::Catalog => print_catalog(session),
        Command::Run { name } => {
            let outcome = session.run_query(name).await?;
            return print_outcome(session, &outcome, args.json);
        }
        Command::Dashboard => print_dashboard(session).await,
        Command::Sql { sql } => {
            let outcome = session.run_sql(sql).await;
            return print_outcome(session, &outcome, args.json);
        }
        Command::Export => {
            let written = session.export()?;
            println!(
                "Exported {} tables to {}",
                written.len(),
                session.config().export_dir().display()
            );
        }
        Command::InitSample { .. } => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn build_config(args: &Args) -> Result<LensConfig> {
    let mut config = match &args.config {
        Some(path) => LensConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => LensConfig::default(),
    };
    if let Some(folder) = &args.folder {
        config = config.with_folder(folder);
    }
    if args.no_coerce_dates {
        config = config.with_auto_coerce_dates(false);
    }
    if let Some(sample_size) = args.sample_size {
        config = config.with_sample_size(sample_size);
    }
    if let Some(threshold) = args.threshold {
        config = config.with_threshold(threshold);
    }
    if let Some(rows) = args.max_rows {
        config = config.with_max_rows_preview(rows);
    }
    if args.verbose {
        config = config.with_log(LogConfig::verbose());
    }
    Ok(config)
}

fn print_outcome(session: &Session, outcome: &QueryOutcome, json: bool) -> Result<ExitCode> {
    match outcome {
        QueryOutcome::Rows(result) => {
            let preview = session.preview(result);
            if json {
                println!("{}", serde_json::to_string_pretty(&preview.to_json_rows()?)?);
            } else {
                println!("{}", preview.to_pretty_string()?);
                if preview.num_rows() < result.num_rows() {
                    println!("({} of {} rows shown)", preview.num_rows(), result.num_rows());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        other => {
            eprintln!("{}", other.message().unwrap_or_default());
            Ok(ExitCode::from(1))
        }
    }
}

async fn print_tables(session: &Session) -> Result<()> {
    let overview = session.overview();
    println!(
        "Tables loaded: {}  Total rows: {}  Total columns: {}",
        overview.tables_loaded, overview.total_rows, overview.total_columns
    );
    println!();
    for count in &overview.row_counts {
        println!("{:>10}  {}", count.rows, count.table);
    }

    for table in session.tables() {
        println!();
        println!("{} ({})", table.name(), table.key());
        for column in table.columns() {
            let promoted = if session.coercion_report().is_promoted(table.name(), &column.name) {
                "  [promoted]"
            } else {
                ""
            };
            println!("  {:<24} {:<10} {}{promoted}", column.name, column.kind, column.data_type);
        }
    }

    let report = session.load_report();
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.file, skipped.message);
    }
    for name in &report.replaced {
        eprintln!("table '{name}' was loaded from more than one file; the last one was kept");
    }

    if let Some((name, matrix)) = session.correlation().await? {
        let table = session.tables().get(&name).map(numeric_columns).unwrap_or_default();
        println!();
        println!("Correlation ({name}: {})", table.join(", "));
        println!("{}", matrix.to_pretty_string()?);
    }
    Ok(())
}

fn print_catalog(session: &Session) {
    let executor = session.executor();
    let describe = |query: &QueryDefinition| match executor.resolver().bind(query.roles()) {
        Binding::Complete(bound) => {
            let tables: Vec<String> = bound
                .iter()
                .filter(|(role, table)| role.as_str() != table.as_str())
                .map(|(role, table)| format!("{role}={table}"))
                .collect();
            if tables.is_empty() {
                "ready".to_string()
            } else {
                format!("ready ({})", tables.join(", "))
            }
        }
        Binding::Missing(missing) => {
            let roles: Vec<&str> = missing.iter().map(|r| r.as_str()).collect();
            format!("missing {}", roles.join(", "))
        }
    };

    println!("Dashboard queries:");
    for query in session.catalog().dashboard() {
        println!("  {:<36} {}", query.name, describe(query));
    }
    println!();
    println!("Saved queries (canonical table names):");
    for query in session.catalog().saved() {
        println!("  {}", query.name);
    }
}

async fn print_dashboard(session: &Session) {
    let executor = session.executor();
    for query in session.catalog().dashboard() {
        let outcome = executor.run_definition(query).await;
        match &outcome {
            QueryOutcome::Rows(result) => println!("{:<36} {} rows", query.name, result.num_rows()),
            other => println!("{:<36} {}", query.name, other.message().unwrap_or_default()),
        }
    }
}
