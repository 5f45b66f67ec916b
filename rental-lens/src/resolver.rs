//! Binding logical roles to whichever tables were actually loaded.
//!
//! File names are not guaranteed to follow the canonical DVD-rental schema, so
//! a role such as "the payment table" is matched by substring against the
//! loaded table names. Resolution is first-match-wins on two levels: the
//! candidate list is tried in priority order, and for each candidate the
//! tables are scanned in load order. Candidate priority outranks table order.
//!
//! Matching is deliberately loose: `old_customer_backup` satisfies the
//! `customer` role. A miss is `None`, never an error; callers skip whatever
//! depended on the role.

use serde::Serialize;
use std::fmt;

/// Returns the first table whose lowercased name contains a candidate.
///
/// ```rust
/// use rental_lens::resolver::resolve;
///
/// let tables = ["customer_old", "customer_new"];
/// assert_eq!(resolve(&["customer"], &tables), Some("customer_old"));
/// assert_eq!(resolve(&["staff"], &tables), None);
/// ```
pub fn resolve<'a, C, T>(candidates: &[C], tables: &'a [T]) -> Option<&'a str>
where
    C: AsRef<str>,
    T: AsRef<str>,
{
    let lowered: Vec<String> = tables.iter().map(|t| t.as_ref().to_lowercase()).collect();
    for candidate in candidates {
        let candidate = candidate.as_ref().to_lowercase();
        if let Some(index) = lowered.iter().position(|name| name.contains(&candidate)) {
            return Some(tables[index].as_ref());
        }
    }
    None
}

/// Abstract table identities referenced by the dashboard queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalRole {
    Customer,
    Payment,
    Rental,
    Staff,
    Store,
    Film,
    FilmCategory,
    Category,
    Inventory,
    Actor,
    FilmActor,
    City,
    Address,
}

impl LogicalRole {
    pub const ALL: [LogicalRole; 13] = [
        LogicalRole::Customer,
        LogicalRole::Payment,
        LogicalRole::Rental,
        LogicalRole::Staff,
        LogicalRole::Store,
        LogicalRole::Film,
        LogicalRole::FilmCategory,
        LogicalRole::Category,
        LogicalRole::Inventory,
        LogicalRole::Actor,
        LogicalRole::FilmActor,
        LogicalRole::City,
        LogicalRole::Address,
    ];

    /// Canonical lowercase table name, also used as the `{placeholder}` in query templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalRole::Customer => "customer",
            LogicalRole::Payment => "payment",
            LogicalRole::Rental => "rental",
            LogicalRole::Staff => "staff",
            LogicalRole::Store => "store",
            LogicalRole::Film => "film",
            LogicalRole::FilmCategory => "film_category",
            LogicalRole::Category => "category",
            LogicalRole::Inventory => "inventory",
            LogicalRole::Actor => "actor",
            LogicalRole::FilmActor => "film_actor",
            LogicalRole::City => "city",
            LogicalRole::Address => "address",
        }
    }

    /// Substrings tried, in priority order, when resolving this role.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            LogicalRole::Customer => &["customer"],
            LogicalRole::Payment => &["payment"],
            LogicalRole::Rental => &["rental"],
            LogicalRole::Staff => &["staff"],
            LogicalRole::Store => &["store"],
            LogicalRole::Film => &["film"],
            LogicalRole::FilmCategory => &["film_category", "filmcategory", "film-category"],
            LogicalRole::Category => &["category"],
            LogicalRole::Inventory => &["inventory"],
            LogicalRole::Actor => &["actor"],
            LogicalRole::FilmActor => &["film_actor", "filmactor"],
            LogicalRole::City => &["city"],
            LogicalRole::Address => &["address"],
        }
    }

    /// Template placeholder, e.g. `{payment}`.
    pub fn placeholder(&self) -> String {
        format!("{{{}}}", self.as_str())
    }
}

impl fmt::Display for LogicalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of loaded table names, in load order, with role lookup on top.
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    tables: Vec<String>,
}

/// Outcome of resolving several roles at once.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Every role matched; pairs are in the order requested.
    Complete(Vec<(LogicalRole, String)>),
    /// At least one role had no match.
    Missing(Vec<LogicalRole>),
}

impl TableResolver {
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Resolves an arbitrary candidate list.
    pub fn resolve<C: AsRef<str>>(&self, candidates: &[C]) -> Option<&str> {
        resolve(candidates, &self.tables)
    }

    pub fn resolve_role(&self, role: LogicalRole) -> Option<&str> {
        resolve(role.candidates(), &self.tables)
    }

    /// Resolves every role, collecting all misses rather than stopping at the first.
    pub fn bind(&self, roles: &[LogicalRole]) -> Binding {
        let mut bound = Vec::with_capacity(roles.len());
        let mut missing = Vec::new();
        for &role in roles {
            match self.resolve_role(role) {
                Some(name) => bound.push((role, name.to_string())),
                None => missing.push(role),
            }
        }
        if missing.is_empty() {
            Binding::Complete(bound)
        } else {
            Binding::Missing(missing)
        }
    }
}
