//! SQL text hygiene at the query boundary.
//!
//! This tool is single-user and local: ad-hoc SQL is executed as typed and
//! injection is out of scope. The only guarantees are that resolved table
//! names are always quoted when substituted into a template, and that blank
//! or NUL-containing statements never reach the engine.

use crate::prelude::*;

/// Identifier quoting and statement checks.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Quotes an identifier for substitution into SQL text.
    ///
    /// The identifier is wrapped in double quotes and embedded double quotes
    /// are doubled, so any table name produced by the loader is addressable.
    ///
    /// ```rust
    /// use rental_lens::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::quote_identifier("payment"), "\"payment\"");
    /// assert_eq!(SqlSecurity::quote_identifier("a\"b"), "\"a\"\"b\"");
    /// ```
    pub fn quote_identifier(identifier: &str) -> String {
        let escaped = identifier.replace('"', "\"\"");
        format!("\"{escaped}\"")
    }

    /// Checks operator-entered SQL before execution.
    ///
    /// Rejects blank text and text containing NUL bytes; everything else is
    /// passed to the engine unchanged.
    pub fn validate_adhoc_sql(sql: &str) -> Result<()> {
        if sql.trim().is_empty() {
            return Err(LensError::query(sql, "Please enter SQL"));
        }
        if sql.contains('\0') {
            return Err(LensError::query(
                sql.replace('\0', "\\0"),
                "SQL text cannot contain null bytes",
            ));
        }
        Ok(())
    }
}
