//! # rental-lens - CSV folder analytics for the DVD-rental dataset
//!
//! rental-lens loads every CSV file of a folder into an embedded DataFusion
//! engine and runs curated or ad-hoc SQL against it. It is built for
//! exploratory, single-user analytics over the DVD-rental sample schema
//! (customer, payment, rental, film, category, actor, ...), but accepts
//! whatever file names it is given.
//!
//! ## Pipeline
//!
//! 1. [`sources`] reads each `*.csv` file into a table, with a strict typed
//!    reader and a permissive fallback. Unreadable files are skipped.
//! 2. [`coercion`] promotes string columns that look like dates to
//!    timestamps, based on the first N non-null values of each column.
//! 3. [`store`] registers the tables in a fresh DataFusion context.
//! 4. [`resolver`] binds logical roles ("the payment table") to loaded table
//!    names by substring match, and [`catalog`] holds the canned queries.
//! 5. [`executor`] runs SQL and turns every failure into a reported outcome.
//!
//! [`session::Session`] ties these together for one load action, and
//! [`session::Workbench`] drives the load state machine.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rental_lens::prelude::*;
//!
//! # async fn example() -> rental_lens::error::Result<()> {
//! let session = Session::load(LensConfig::for_folder("./data")).await?;
//!
//! let outcome = session.run_query("Top customers by spend").await?;
//! match &outcome {
//!     QueryOutcome::Rows(result) => println!("{}", session.preview(result).to_pretty_string()?),
//!     other => eprintln!("{}", other.message().unwrap_or_default()),
//! }
//!
//! let adhoc = session.run_sql("SELECT COUNT(*) FROM rental").await;
//! println!("{} rows", adhoc.result().num_rows());
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure isolation
//!
//! Only the load itself can fail with a [`error::LensError`]. Once a session
//! exists, a broken query yields [`executor::QueryOutcome::Failed`] with an
//! empty result and the store stays usable; a query whose tables are missing
//! yields [`executor::QueryOutcome::Skipped`] and is never executed.

pub mod catalog;
pub mod coercion;
pub mod config;
pub mod error;
pub mod executor;
pub mod export;
pub mod logging;
pub mod overview;
pub mod prelude;
pub mod resolver;
pub mod result;
pub mod sample_data;
pub mod security;
pub mod session;
pub mod sources;
pub mod store;
pub mod table;
