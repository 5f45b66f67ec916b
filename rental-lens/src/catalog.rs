//! The fixed, ordered set of canned queries.
//!
//! Dashboard queries are templates with one `{role}` placeholder per logical
//! role; the executor substitutes the quoted name of the table each role
//! resolves to. Saved queries reference canonical table names directly and
//! run only when those exact tables were loaded.
//!
//! Month buckets use `to_char(CAST(col AS TIMESTAMP), '%Y-%m')` so the
//! queries work whether or not date coercion promoted the column.

use crate::resolver::LogicalRole::{self, *};
use crate::security::SqlSecurity;
use serde::Serialize;

/// How a template's table references are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemplateBinding {
    /// The SQL names canonical tables and runs unchanged.
    Canonical,
    /// Each listed role appears as a `{role}` placeholder and is resolved first.
    Resolved(&'static [LogicalRole]),
}

/// One named query. Immutable and independent of what was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryDefinition {
    pub name: &'static str,
    pub sql_template: &'static str,
    pub binding: TemplateBinding,
}

impl QueryDefinition {
    const fn resolved(
        name: &'static str,
        roles: &'static [LogicalRole],
        sql_template: &'static str,
    ) -> Self {
        Self {
            name,
            sql_template,
            binding: TemplateBinding::Resolved(roles),
        }
    }

    const fn canonical(name: &'static str, sql_template: &'static str) -> Self {
        Self {
            name,
            sql_template,
            binding: TemplateBinding::Canonical,
        }
    }

    /// Roles that must resolve before this query may run. Empty for saved queries.
    pub fn roles(&self) -> &'static [LogicalRole] {
        match self.binding {
            TemplateBinding::Canonical => &[],
            TemplateBinding::Resolved(roles) => roles,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self.binding, TemplateBinding::Canonical)
    }

    /// Substitutes resolved table names into the template.
    pub fn render(&self, bound: &[(LogicalRole, String)]) -> String {
        let mut sql = self.sql_template.to_string();
        for (role, table) in bound {
            sql = sql.replace(&role.placeholder(), &SqlSecurity::quote_identifier(table));
        }
        sql
    }
}

/// Queries behind the dashboard views, in display order.
pub const DASHBOARD_QUERIES: &[QueryDefinition] = &[
    QueryDefinition::resolved(
        "Top customers by spend",
        &[Customer, Payment],
        "SELECT (c.first_name || ' ' || c.last_name) AS fullname, p.customer_id, SUM(p.amount) AS total_spent \
         FROM {payment} p JOIN {customer} c ON p.customer_id = c.customer_id \
         GROUP BY p.customer_id, c.first_name, c.last_name \
         ORDER BY total_spent DESC, p.customer_id LIMIT 250",
    ),
    QueryDefinition::resolved(
        "Customer spend Pareto",
        &[Customer, Payment],
        "WITH spend AS (\
           SELECT (c.first_name || ' ' || c.last_name) AS fullname, p.customer_id, SUM(p.amount) AS total_spent \
           FROM {payment} p JOIN {customer} c ON p.customer_id = c.customer_id \
           GROUP BY p.customer_id, c.first_name, c.last_name \
           ORDER BY total_spent DESC, p.customer_id LIMIT 250) \
         SELECT fullname, customer_id, total_spent, \
           SUM(total_spent) OVER (ORDER BY total_spent DESC, customer_id ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) \
             / SUM(total_spent) OVER () AS cum_pct \
         FROM spend ORDER BY total_spent DESC, customer_id",
    ),
    QueryDefinition::resolved(
        "Monthly rentals by store",
        &[Rental, Staff, Store],
        "SELECT store_id, ym, COUNT(rental_id) AS rentals FROM (\
           SELECT s.store_id, to_char(CAST(r.rental_date AS TIMESTAMP), '%Y-%m') AS ym, r.rental_id \
           FROM {rental} r JOIN {staff} st ON r.staff_id = st.staff_id JOIN {store} s ON st.store_id = s.store_id) t \
         GROUP BY store_id, ym ORDER BY ym, store_id",
    ),
    QueryDefinition::resolved(
        "Film rental duration quartiles",
        &[Film, FilmCategory, Category],
        "WITH t1 AS (\
           SELECT f.title AS film_title, c.name AS category_name, \
             ntile(4) OVER (ORDER BY COALESCE(f.rental_duration, 0)) AS quart \
           FROM {film} f JOIN {film_category} fc ON f.film_id = fc.film_id \
           JOIN {category} c ON fc.category_id = c.category_id) \
         SELECT category_name, quart AS standard_quartile, COUNT(film_title) AS film_count FROM t1 \
         WHERE category_name IN ('Animation', 'Children', 'Classics', 'Comedy', 'Family', 'Music') \
         GROUP BY category_name, quart ORDER BY category_name, standard_quartile",
    ),
    QueryDefinition::resolved(
        "Family category film rentals",
        &[Film, FilmCategory, Category, Inventory, Rental],
        "WITH t1 AS (\
           SELECT f.title AS film_title, c.name AS category_name, r.rental_id \
           FROM {film} f JOIN {film_category} fc ON f.film_id = fc.film_id \
           JOIN {category} c ON fc.category_id = c.category_id \
           JOIN {inventory} i ON f.film_id = i.film_id \
           JOIN {rental} r ON i.inventory_id = r.inventory_id) \
         SELECT category_name, film_title, COUNT(rental_id) AS rentals FROM t1 \
         WHERE category_name IN ('Animation', 'Children', 'Classics', 'Comedy', 'Family', 'Music') \
         GROUP BY category_name, film_title ORDER BY rentals DESC, category_name, film_title LIMIT 500",
    ),
    QueryDefinition::resolved(
        "Monthly revenue",
        &[Payment],
        "SELECT ym, SUM(amount) AS revenue FROM (\
           SELECT to_char(CAST(payment_date AS TIMESTAMP), '%Y-%m') AS ym, amount FROM {payment}) t \
         GROUP BY ym ORDER BY ym",
    ),
    QueryDefinition::resolved(
        "Revenue moving averages",
        &[Payment],
        "WITH monthly AS (\
           SELECT ym, SUM(amount) AS revenue FROM (\
             SELECT to_char(CAST(payment_date AS TIMESTAMP), '%Y-%m') AS ym, amount FROM {payment}) t \
           GROUP BY ym) \
         SELECT ym, revenue, \
           AVG(revenue) OVER (ORDER BY ym ROWS BETWEEN 2 PRECEDING AND CURRENT ROW) AS ma_3, \
           AVG(revenue) OVER (ORDER BY ym ROWS BETWEEN 5 PRECEDING AND CURRENT ROW) AS ma_6 \
         FROM monthly ORDER BY ym",
    ),
    QueryDefinition::resolved(
        "Revenue by category",
        &[Category, FilmCategory, Film, Inventory, Rental, Payment],
        "SELECT c.name AS category_name, SUM(p.amount) AS total_revenue \
         FROM {category} c JOIN {film_category} fc ON c.category_id = fc.category_id \
         JOIN {film} f ON fc.film_id = f.film_id \
         JOIN {inventory} i ON f.film_id = i.film_id \
         JOIN {rental} r ON i.inventory_id = r.inventory_id \
         JOIN {payment} p ON r.rental_id = p.rental_id \
         GROUP BY c.name ORDER BY total_revenue DESC, category_name",
    ),
    QueryDefinition::resolved(
        "Payments by return status",
        &[Rental, Payment, Inventory, Film],
        "SELECT CASE \
           WHEN (date_part('epoch', date_trunc('day', CAST(r.return_date AS TIMESTAMP))) \
                 - date_part('epoch', date_trunc('day', CAST(r.rental_date AS TIMESTAMP)))) / 86400 > f.rental_duration \
           THEN 'Late' ELSE 'On Time' END AS return_status, \
           p.amount AS amount \
         FROM {rental} r JOIN {payment} p ON r.rental_id = p.rental_id \
         JOIN {inventory} i ON r.inventory_id = i.inventory_id \
         JOIN {film} f ON i.film_id = f.film_id",
    ),
    QueryDefinition::resolved(
        "Top actors by revenue",
        &[Actor, FilmActor, Film, Inventory, Rental, Payment],
        "SELECT a.actor_id, a.first_name, a.last_name, SUM(p.amount) AS total_revenue \
         FROM {actor} a JOIN {film_actor} fa ON a.actor_id = fa.actor_id \
         JOIN {film} f ON fa.film_id = f.film_id \
         JOIN {inventory} i ON f.film_id = i.film_id \
         JOIN {rental} r ON i.inventory_id = r.inventory_id \
         JOIN {payment} p ON r.rental_id = p.rental_id \
         GROUP BY a.actor_id, a.first_name, a.last_name \
         ORDER BY total_revenue DESC, a.actor_id LIMIT 200",
    ),
    QueryDefinition::resolved(
        "Actor to category revenue flow",
        &[Actor, FilmActor, Film, FilmCategory, Category, Inventory, Rental, Payment],
        "SELECT actor_name, category_name, SUM(amount) AS revenue FROM (\
           SELECT (a.first_name || ' ' || a.last_name) AS actor_name, c.name AS category_name, p.amount \
           FROM {actor} a JOIN {film_actor} fa ON a.actor_id = fa.actor_id \
           JOIN {film} f ON fa.film_id = f.film_id \
           JOIN {film_category} fc ON f.film_id = fc.film_id \
           JOIN {category} c ON fc.category_id = c.category_id \
           JOIN {inventory} i ON f.film_id = i.film_id \
           JOIN {rental} r ON i.inventory_id = r.inventory_id \
           JOIN {payment} p ON r.rental_id = p.rental_id) t \
         GROUP BY actor_name, category_name ORDER BY revenue DESC, actor_name, category_name LIMIT 500",
    ),
    QueryDefinition::resolved(
        "Film availability vs demand",
        &[Film, Inventory, Rental],
        "SELECT f.title AS film_title, COUNT(i.inventory_id) AS available_copies, COUNT(r.rental_id) AS rental_count \
         FROM {film} f LEFT JOIN {inventory} i ON f.film_id = i.film_id \
         LEFT JOIN {rental} r ON i.inventory_id = r.inventory_id \
         GROUP BY f.title ORDER BY rental_count DESC, available_copies DESC, film_title LIMIT 500",
    ),
    QueryDefinition::resolved(
        "Rentals by year and month",
        &[Rental],
        "SELECT rental_year, rental_month, COUNT(*) AS rentals FROM (\
           SELECT date_part('year', CAST(rental_date AS TIMESTAMP)) AS rental_year, \
                  date_part('month', CAST(rental_date AS TIMESTAMP)) AS rental_month \
           FROM {rental} WHERE rental_date IS NOT NULL) t \
         GROUP BY rental_year, rental_month ORDER BY rental_year, rental_month",
    ),
];

/// Saved exercises against the canonical DVD-rental table names.
pub const SAVED_QUERIES: &[QueryDefinition] = &[
    QueryDefinition::canonical(
        "Top 3 spenders",
        "SELECT fullname, customer_id, total_spent FROM (\
           SELECT (c.first_name || ' ' || c.last_name) AS fullname, p.customer_id, SUM(p.amount) AS total_spent \
           FROM customer c JOIN payment p ON c.customer_id = p.customer_id \
           GROUP BY p.customer_id, c.first_name, c.last_name \
           ORDER BY total_spent DESC, p.customer_id LIMIT 3) AS derived_table",
    ),
    QueryDefinition::canonical(
        "Top 10 films by rentals",
        "SELECT f.title, COUNT(r.rental_id) AS rentals \
         FROM film f JOIN inventory i ON f.film_id = i.film_id \
         JOIN rental r ON i.inventory_id = r.inventory_id \
         GROUP BY f.film_id, f.title ORDER BY rentals DESC, f.title LIMIT 10",
    ),
    QueryDefinition::canonical(
        "Rentals per category",
        "SELECT c.name AS category_name, COUNT(r.rental_id) AS rentals \
         FROM category c JOIN film_category fc ON c.category_id = fc.category_id \
         JOIN inventory i ON fc.film_id = i.film_id \
         JOIN rental r ON i.inventory_id = r.inventory_id \
         GROUP BY c.name ORDER BY rentals DESC, category_name",
    ),
    QueryDefinition::canonical(
        "Customers per city",
        "SELECT ci.city, COUNT(c.customer_id) AS customers \
         FROM customer c JOIN address a ON c.address_id = a.address_id \
         JOIN city ci ON a.city_id = ci.city_id \
         GROUP BY ci.city ORDER BY customers DESC, ci.city",
    ),
    QueryDefinition::canonical(
        "Revenue per store",
        "SELECT st.store_id, SUM(p.amount) AS revenue \
         FROM payment p JOIN staff st ON p.staff_id = st.staff_id \
         GROUP BY st.store_id ORDER BY st.store_id",
    ),
    QueryDefinition::canonical(
        "Average rental duration per category",
        "SELECT c.name AS category_name, AVG(f.rental_duration) AS avg_rental_duration \
         FROM film f JOIN film_category fc ON f.film_id = fc.film_id \
         JOIN category c ON fc.category_id = c.category_id \
         GROUP BY c.name ORDER BY avg_rental_duration DESC, category_name",
    ),
    QueryDefinition::canonical(
        "Actors with most films",
        "SELECT a.actor_id, a.first_name, a.last_name, COUNT(fa.film_id) AS film_count \
         FROM actor a JOIN film_actor fa ON a.actor_id = fa.actor_id \
         GROUP BY a.actor_id, a.first_name, a.last_name \
         ORDER BY film_count DESC, a.actor_id LIMIT 10",
    ),
    QueryDefinition::canonical(
        "Inventory per store",
        "SELECT store_id, COUNT(inventory_id) AS copies FROM inventory GROUP BY store_id ORDER BY store_id",
    ),
    QueryDefinition::canonical(
        "Customers without rentals",
        "SELECT c.customer_id, c.first_name, c.last_name \
         FROM customer c LEFT JOIN rental r ON c.customer_id = r.customer_id \
         WHERE r.rental_id IS NULL ORDER BY c.customer_id",
    ),
    QueryDefinition::canonical(
        "Monthly payment count",
        "SELECT ym, COUNT(payment_id) AS payments FROM (\
           SELECT to_char(CAST(payment_date AS TIMESTAMP), '%Y-%m') AS ym, payment_id FROM payment) t \
         GROUP BY ym ORDER BY ym",
    ),
    QueryDefinition::canonical(
        "Staff rental counts",
        "SELECT s.staff_id, s.first_name, s.last_name, COUNT(r.rental_id) AS rentals \
         FROM staff s JOIN rental r ON s.staff_id = r.staff_id \
         GROUP BY s.staff_id, s.first_name, s.last_name ORDER BY rentals DESC, s.staff_id",
    ),
    QueryDefinition::canonical(
        "Average payment per customer",
        "SELECT c.customer_id, c.first_name, c.last_name, AVG(p.amount) AS avg_payment, COUNT(p.payment_id) AS payments \
         FROM customer c JOIN payment p ON c.customer_id = p.customer_id \
         GROUP BY c.customer_id, c.first_name, c.last_name ORDER BY avg_payment DESC, c.customer_id",
    ),
];

/// Ordered lookup over every canned query.
#[derive(Debug, Clone, Copy)]
pub struct QueryCatalog {
    dashboard: &'static [QueryDefinition],
    saved: &'static [QueryDefinition],
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl QueryCatalog {
    /// The built-in DVD-rental catalog.
    pub const fn standard() -> Self {
        Self {
            dashboard: DASHBOARD_QUERIES,
            saved: SAVED_QUERIES,
        }
    }

    pub fn dashboard(&self) -> &'static [QueryDefinition] {
        self.dashboard
    }

    pub fn saved(&self) -> &'static [QueryDefinition] {
        self.saved
    }

    /// Dashboard queries first, then saved queries.
    pub fn iter(&self) -> impl Iterator<Item = &'static QueryDefinition> {
        self.dashboard.iter().chain(self.saved.iter())
    }

    pub fn len(&self) -> usize {
        self.dashboard.len() + self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds a query by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<&'static QueryDefinition> {
        self.iter().find(|q| q.name.eq_ignore_ascii_case(name.trim()))
    }
}
