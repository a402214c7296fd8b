//! Fluent query builder with read/write routing.
//!
//! A [`QueryBuilder`] accumulates query-fragment state (columns, joins,
//! predicates, ordering, grouping, limit/offset) together with an ordered list
//! of parameter [`Value`]s, one per `?` placeholder in the assembled SQL. A
//! terminal method ([`get`](QueryBuilder::get), [`first`](QueryBuilder::first),
//! [`insert`](QueryBuilder::insert), ...) freezes that state into SQL text,
//! resolves the read or write pool through the [`ConnectionRouter`], executes,
//! and consumes the builder.
//!
//! # Usage
//!
//! ```ignore
//! use rwsql::{table, Value};
//!
//! // SELECT
//! let rows = table(&router, "users")
//!     .and_where_eq("status", "active")
//!     .order_by("created_at", "desc")
//!     .limit(10)
//!     .get()
//!     .await?;
//!
//! // INSERT (always routed to the primary)
//! let id = table(&router, "users")
//!     .insert(&[("username", "alice".into()), ("email", "alice@example.com".into())])
//!     .await?;
//!
//! // UPDATE
//! let changed = table(&router, "users")
//!     .and_where_eq("id", id)
//!     .update(&[("status", "inactive".into())])
//!     .await?;
//!
//! // Read-your-own-write: force the next SELECT onto the primary
//! let row = table(&router, "users")
//!     .use_write_connection()
//!     .find(id)
//!     .await?;
//! ```

mod exec;

use crate::router::ConnectionRouter;
use crate::value::Value;

/// Boolean connector joining a predicate to the one before it.
///
/// The connector stored on predicate *i* is rendered between predicates
/// *i-1* and *i*; the first predicate's connector is never rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connector {
    And,
    Or,
}

impl Connector {
    fn as_sql(self) -> &'static str {
        match self {
            Connector::And => " AND ",
            Connector::Or => " OR ",
        }
    }
}

/// One WHERE condition: pre-rendered clause text (placeholders included)
/// plus the connector to the previous predicate.
#[derive(Debug, Clone)]
struct Predicate {
    clause: String,
    connector: Connector,
}

#[derive(Debug, Clone, Copy)]
enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
        }
    }
}

/// Chainable query builder bound to one table and one [`ConnectionRouter`].
///
/// Fragment methods consume and return the builder; a terminal method consumes
/// it for good, so a finished query can never be re-executed with stale
/// bindings. One builder instance is single-threaded by construction.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    router: &'a ConnectionRouter,
    table: String,
    columns: Vec<String>,
    joins: Vec<String>,
    predicates: Vec<Predicate>,
    order_by: Vec<String>,
    group_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    bindings: Vec<Value>,
    force_write: bool,
}

impl<'a> QueryBuilder<'a> {
    /// Create a builder for the given table. All fragment collections start
    /// empty and the column list defaults to `*`.
    pub fn table(router: &'a ConnectionRouter, table: impl Into<String>) -> Self {
        Self {
            router,
            table: table.into(),
            columns: vec!["*".to_string()],
            joins: Vec::new(),
            predicates: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            limit: None,
            offset: None,
            bindings: Vec::new(),
            force_write: false,
        }
    }

    // ==================== SELECT columns ====================

    /// Replace the column list wholesale. The last call wins.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    // ==================== WHERE ====================

    fn push_where(mut self, column: &str, op: &str, value: Value, connector: Connector) -> Self {
        self.predicates.push(Predicate {
            clause: format!("{column} {op} ?"),
            connector,
        });
        self.bindings.push(value);
        self
    }

    /// Add a predicate joined with AND: `column op ?`.
    pub fn and_where(self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        self.push_where(column, op, value.into(), Connector::And)
    }

    /// Add an equality predicate joined with AND: `column = ?`.
    pub fn and_where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.and_where(column, "=", value)
    }

    /// Add a predicate joined with OR: `column op ?`.
    pub fn or_where(self, column: &str, op: &str, value: impl Into<Value>) -> Self {
        self.push_where(column, op, value.into(), Connector::Or)
    }

    /// Add an equality predicate joined with OR: `column = ?`.
    pub fn or_where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.or_where(column, "=", value)
    }

    fn push_where_in(
        mut self,
        column: &str,
        values: Vec<Value>,
        connector: Connector,
        negated: bool,
    ) -> Self {
        // An empty list is a no-op: the filter behaves as if it were never
        // added. Note this differs from a strict SQL `IN ()`, which would
        // match nothing.
        if values.is_empty() {
            return self;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        let op = if negated { "NOT IN" } else { "IN" };
        self.predicates.push(Predicate {
            clause: format!("{column} {op} ({placeholders})"),
            connector,
        });
        self.bindings.extend(values);
        self
    }

    /// Add `column IN (?, ...)` joined with AND, one placeholder per value.
    ///
    /// An empty `values` leaves the query untouched: SQL text and bindings
    /// are exactly as before the call.
    pub fn where_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_where_in(column, values, Connector::And, false)
    }

    /// Add `column NOT IN (?, ...)` joined with AND. Empty `values` is a no-op.
    pub fn where_not_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_where_in(column, values, Connector::And, true)
    }

    /// Add `column IN (?, ...)` joined with OR. Empty `values` is a no-op.
    pub fn or_where_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_where_in(column, values, Connector::Or, false)
    }

    /// Add `column NOT IN (?, ...)` joined with OR. Empty `values` is a no-op.
    pub fn or_where_not_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_where_in(column, values, Connector::Or, true)
    }

    // ==================== JOIN ====================

    fn push_join(
        mut self,
        kind: JoinKind,
        table: &str,
        left: &str,
        op: &str,
        right: &str,
    ) -> Self {
        self.joins.push(format!(
            "{} JOIN {table} ON {left} {op} {right}",
            kind.as_sql()
        ));
        self
    }

    /// Add an INNER JOIN. The condition operands are column identifiers and
    /// are rendered verbatim, never parameterized, so do not pass untrusted
    /// input here.
    pub fn join(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.push_join(JoinKind::Inner, table, left, op, right)
    }

    /// Add a LEFT JOIN. Same identifier caveat as [`join`](Self::join).
    pub fn left_join(self, table: &str, left: &str, op: &str, right: &str) -> Self {
        self.push_join(JoinKind::Left, table, left, op, right)
    }

    // ==================== Ordering & Grouping ====================

    /// Add an ORDER BY key. Any direction other than a case-insensitive
    /// `"DESC"` normalizes to `ASC`. Multiple calls accumulate into a
    /// multi-key sort.
    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        let dir = if direction.eq_ignore_ascii_case("desc") {
            "DESC"
        } else {
            "ASC"
        };
        self.order_by.push(format!("{column} {dir}"));
        self
    }

    /// Add an ascending ORDER BY key.
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, "asc")
    }

    /// Add a descending ORDER BY key.
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, "desc")
    }

    /// Append columns to the GROUP BY list. Accumulates across calls.
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    // ==================== Pagination ====================

    /// Set (or overwrite) LIMIT.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set (or overwrite) OFFSET.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    // ==================== Routing ====================

    /// Force the terminal call onto the write pool even for a SELECT.
    ///
    /// Use this right after a write to avoid reading stale data from a
    /// lagging replica. Writes (`insert`/`update`/`delete`) target the
    /// primary unconditionally and ignore this flag.
    pub fn use_write_connection(mut self) -> Self {
        self.force_write = true;
        self
    }

    // ==================== SQL assembly ====================

    fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }
        let mut sql = String::from(" WHERE ");
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                sql.push_str(predicate.connector.as_sql());
            }
            sql.push_str(&predicate.clause);
        }
        sql
    }

    fn build_select(&self, columns: &str) -> String {
        let mut sql = format!("SELECT {columns} FROM {}", self.table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        sql.push_str(&self.where_clause());

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }

    /// Assemble the SELECT statement for the current state. Deterministic and
    /// side-effect-free: the same chain always yields the same text, and
    /// [`bindings`](Self::bindings) aligns with its placeholders in order.
    pub fn to_sql(&self) -> String {
        self.build_select(&self.columns.join(", "))
    }

    /// Assemble the SELECT with the column list replaced by
    /// `FUNC(column) AS aggregate`, as executed by the aggregate terminals.
    pub fn to_aggregate_sql(&self, func: &str, column: &str) -> String {
        self.build_select(&format!("{func}({column}) AS aggregate"))
    }

    /// Assemble the INSERT statement and its bindings. Columns and
    /// placeholders follow `data` order.
    pub fn to_insert_sql(&self, data: &[(&str, Value)]) -> (String, Vec<Value>) {
        let columns = data
            .iter()
            .map(|(column, _)| *column)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; data.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            self.table
        );
        let values = data.iter().map(|(_, value)| value.clone()).collect();
        (sql, values)
    }

    /// Assemble the UPDATE statement and its bindings: SET values in `data`
    /// order, then the accumulated WHERE bindings. With no predicates the
    /// statement updates every row, mirroring unrestricted SQL UPDATE.
    pub fn to_update_sql(&self, data: &[(&str, Value)]) -> (String, Vec<Value>) {
        let sets = data
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {} SET {sets}{}", self.table, self.where_clause());
        let mut values: Vec<Value> = data.iter().map(|(_, value)| value.clone()).collect();
        values.extend(self.bindings.iter().cloned());
        (sql, values)
    }

    /// Assemble the DELETE statement and its bindings. With no predicates the
    /// statement deletes every row.
    pub fn to_delete_sql(&self) -> (String, Vec<Value>) {
        let sql = format!("DELETE FROM {}{}", self.table, self.where_clause());
        (sql, self.bindings.clone())
    }

    /// The accumulated parameter values, positionally aligned with the `?`
    /// placeholders in [`to_sql`](Self::to_sql).
    pub fn bindings(&self) -> &[Value] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests;
