//! Prelude for commonly used types and traits in rental-lens.

pub use crate::config::LensConfig;
pub use crate::error::{LensError, Result};
pub use crate::executor::QueryOutcome;
pub use crate::logging::LogConfig;
pub use crate::result::QueryResult;
pub use crate::session::{Session, Workbench};
