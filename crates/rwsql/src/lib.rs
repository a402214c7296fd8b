//! # rwsql
//!
//! A fluent MySQL query builder with read/write connection splitting.
//!
//! ## Features
//!
//! - **Chainable builder**: accumulate columns, joins, predicates, ordering,
//!   grouping and pagination, then fire one terminal method
//! - **Parameters, never interpolation**: every value travels as a `?`
//!   placeholder binding, positionally aligned with the assembled SQL
//! - **Read/write split**: SELECTs route to the replica pool, writes to the
//!   primary, with a per-query override for read-your-own-write
//! - **Driver delegation**: transport, pooling and execution belong to the
//!   driver (`sqlx`); failures propagate to the caller unmodified
//! - **Lazy cursors**: stream large result sets row by row instead of
//!   materializing them
//!
//! ## Usage
//!
//! ```ignore
//! use rwsql::{table, ConnectionRouter, DatabaseConfig};
//!
//! let config = DatabaseConfig::from_toml_str(&std::fs::read_to_string("db.toml")?)?;
//! let router = ConnectionRouter::connect(config).await?;
//!
//! // SELECT, routed to the replica
//! let users = table(&router, "users")
//!     .and_where_eq("status", "active")
//!     .order_by("created_at", "desc")
//!     .limit(10)
//!     .get()
//!     .await?;
//!
//! // INSERT, routed to the primary
//! let id = table(&router, "users")
//!     .insert(&[("username", "alice".into()), ("email", "alice@example.com".into())])
//!     .await?;
//!
//! // DELETE with an IN list
//! table(&router, "sessions")
//!     .where_in("user_id", vec![1i64, 2, 3])
//!     .delete()
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod qb;
pub mod router;
pub mod transaction;
pub mod value;

pub use config::{ConnectionParams, DatabaseConfig};
pub use error::{DbError, DbResult};
pub use qb::QueryBuilder;
pub use router::{ConnectionRouter, Target};
pub use value::Value;

/// Create a [`QueryBuilder`] bound to the given table.
///
/// # Example
/// ```ignore
/// let qb = rwsql::table(&router, "users").and_where_eq("id", 1);
/// ```
pub fn table<'a>(router: &'a ConnectionRouter, name: &str) -> QueryBuilder<'a> {
    QueryBuilder::table(router, name)
}
