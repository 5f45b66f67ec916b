//! Integration tests running the query catalog against the miniature
//! DVD-rental dataset and against folders with non-canonical file names.

use rental_lens::catalog::QueryCatalog;
use rental_lens::config::LensConfig;
use rental_lens::error::ErrorKind;
use rental_lens::executor::QueryOutcome;
use rental_lens::resolver::LogicalRole;
use rental_lens::result::QueryResult;
use rental_lens::sample_data::write_sample_dataset;
use rental_lens::session::Session;
use std::fs;
use tempfile::TempDir;

async fn sample_session() -> (TempDir, Session) {
    let dir = TempDir::new().unwrap();
    write_sample_dataset(dir.path()).unwrap();
    let session = Session::load(LensConfig::for_folder(dir.path())).await.unwrap();
    (dir, session)
}

async fn rows(session: &Session, name: &str) -> QueryResult {
    match session.run_query(name).await.unwrap() {
        QueryOutcome::Rows(result) => result,
        other => panic!("{name}: {}", other.message().unwrap_or_default()),
    }
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap();
    assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

#[tokio::test]
async fn test_every_catalog_query_returns_rows_on_sample_data() {
    let (_dir, session) = sample_session().await;
    let outcomes = session.executor().run_catalog(session.catalog()).await;
    assert_eq!(outcomes.len(), QueryCatalog::standard().len());

    for (query, outcome) in &outcomes {
        assert!(
            outcome.is_rows(),
            "{}: {}",
            query.name,
            outcome.message().unwrap_or_default()
        );
        assert!(!outcome.result().is_empty(), "{} returned no rows", query.name);
    }
}

#[tokio::test]
async fn test_sample_dates_are_promoted() {
    let (_dir, session) = sample_session().await;
    let report = session.coercion_report();
    for (table, column) in [
        ("rental", "rental_date"),
        ("rental", "return_date"),
        ("payment", "payment_date"),
        ("customer", "create_date"),
    ] {
        assert!(report.is_promoted(table, column), "{table}.{column}");
    }
    assert!(!report.is_promoted("customer", "email"));
    assert!(!report.is_promoted("film", "title"));
}

#[tokio::test]
async fn test_top_three_spenders() {
    let (_dir, session) = sample_session().await;
    let result = rows(&session, "Top 3 spenders").await;

    assert_eq!(result.num_rows(), 3);
    let ids = result.column_as_f64("customer_id").unwrap();
    assert_eq!(ids, vec![Some(1.0), Some(2.0), Some(3.0)]);

    let totals = result.column_as_f64("total_spent").unwrap();
    assert_close(totals[0], 16.96);
    assert_close(totals[1], 15.96);
    assert_close(totals[2], 15.96);

    let names = result.column_as_strings("fullname").unwrap();
    assert_eq!(names[0].as_deref(), Some("Mary Smith"));
}

#[tokio::test]
async fn test_customers_without_rentals() {
    let (_dir, session) = sample_session().await;
    let result = rows(&session, "Customers without rentals").await;

    assert_eq!(result.num_rows(), 1);
    assert_eq!(result.column_as_f64("customer_id").unwrap(), vec![Some(4.0)]);
}

#[tokio::test]
async fn test_monthly_revenue() {
    let (_dir, session) = sample_session().await;
    let result = rows(&session, "Monthly revenue").await;

    let months = result.column_as_strings("ym").unwrap();
    assert_eq!(
        months,
        vec![
            Some("2007-02".to_string()),
            Some("2007-03".to_string()),
            Some("2007-04".to_string()),
        ]
    );
    let revenue = result.column_as_f64("revenue").unwrap();
    assert_close(revenue[0], 9.97);
    assert_close(revenue[1], 18.96);
    assert_close(revenue[2], 19.95);
}

#[tokio::test]
async fn test_late_returns_use_calendar_days() {
    let (_dir, session) = sample_session().await;
    let result = rows(&session, "Payments by return status").await;

    // one row per payment; the rental without a return date counts as on time
    assert_eq!(result.num_rows(), 12);
    let statuses = result.column_as_strings("return_status").unwrap();
    let late = statuses
        .iter()
        .filter(|s| s.as_deref() == Some("Late"))
        .count();
    assert_eq!(late, 3);
}

#[tokio::test]
async fn test_rentals_by_year_and_month() {
    let (_dir, session) = sample_session().await;
    let result = rows(&session, "Rentals by year and month").await;

    let years = result.column_as_f64("rental_year").unwrap();
    let months = result.column_as_f64("rental_month").unwrap();
    let counts = result.column_as_f64("rentals").unwrap();
    let buckets: Vec<(f64, f64, f64)> = years
        .into_iter()
        .zip(months)
        .zip(counts)
        .map(|((y, m), c)| (y.unwrap(), m.unwrap(), c.unwrap()))
        .collect();

    assert_eq!(
        buckets,
        vec![
            (2005.0, 5.0, 4.0),
            (2005.0, 6.0, 3.0),
            (2005.0, 7.0, 3.0),
            (2005.0, 8.0, 1.0),
            (2006.0, 2.0, 1.0),
        ]
    );
}

#[tokio::test]
async fn test_pareto_reaches_one() {
    let (_dir, session) = sample_session().await;
    let result = rows(&session, "Customer spend Pareto").await;

    let cumulative = result.column_as_f64("cum_pct").unwrap();
    assert_close(cumulative.last().copied().flatten(), 1.0);
    assert!(cumulative.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_dashboard_resolves_non_canonical_names() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("payment_2007.csv"),
        "payment_id,customer_id,amount,payment_date\n1,1,2.99,2007-02-15 22:25:46\n2,2,0.99,2007-02-16 17:23:14\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("Customer List.csv"),
        "customer_id,first_name,last_name\n1,Mary,Smith\n2,Patricia,Johnson\n",
    )
    .unwrap();
    let session = Session::load(LensConfig::for_folder(dir.path())).await.unwrap();

    let result = rows(&session, "Top customers by spend").await;
    assert_eq!(result.num_rows(), 2);
    let totals = result.column_as_f64("total_spent").unwrap();
    assert_close(totals[0], 2.99);

    // saved queries keep the canonical names and fail cleanly
    match session.run_query("Top 3 spenders").await.unwrap() {
        QueryOutcome::Failed(failure) => {
            assert_eq!(failure.kind, ErrorKind::Query);
            assert!(failure.sql.contains("FROM customer c"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_role_skips_query() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("payment.csv"),
        "payment_id,customer_id,amount,payment_date\n1,1,2.99,2007-02-15 22:25:46\n",
    )
    .unwrap();
    let session = Session::load(LensConfig::for_folder(dir.path())).await.unwrap();

    match session.run_query("Top customers by spend").await.unwrap() {
        QueryOutcome::Skipped { query, missing } => {
            assert_eq!(query, "Top customers by spend");
            assert_eq!(missing, vec![LogicalRole::Customer]);
        }
        other => panic!("expected skip, got {other:?}"),
    }

    // payment alone is enough for the revenue view
    assert!(session.run_query("Monthly revenue").await.unwrap().is_rows());
}

#[tokio::test]
async fn test_failed_query_does_not_poison_session() {
    let (_dir, session) = sample_session().await;

    let failed = session.run_sql("SELECT * FROM no_such_table").await;
    assert!(failed.is_failed());
    assert!(failed.result().is_empty());
    assert!(failed.message().unwrap().contains("error"));

    let blank = session.run_sql("   ").await;
    assert!(blank.is_failed());

    let ok = session.run_sql("SELECT COUNT(*) AS n FROM rental").await;
    assert_eq!(ok.into_result().column_as_f64("n").unwrap(), vec![Some(12.0)]);
}

#[tokio::test]
async fn test_correlation_on_sample_data() {
    let (_dir, session) = sample_session().await;
    let (table, matrix) = session.correlation().await.unwrap().unwrap();

    assert_eq!(
        Some(table.as_str()),
        session.overview().correlation_table.as_deref()
    );
    assert_eq!(matrix.num_rows(), matrix.num_columns() - 1);
}
