//! Transaction helper macro.
//!
//! Transactions are a thin pass-through to the write pool's begin/commit/
//! rollback primitives: always the primary, never the replica. The core does
//! not manage nesting or savepoints, and each builder terminal executed
//! outside a transaction auto-commits individually. Inside the block, run
//! statements on `&mut tx` via the driver, using a builder's
//! `to_sql()`/`bindings()` or raw SQL.
//!
//! # Example
//!
//! ```ignore
//! use rwsql::{table, DbResult};
//!
//! # async fn demo(router: &rwsql::ConnectionRouter) -> DbResult<()> {
//! rwsql::transaction!(router, tx, {
//!     sqlx::query("UPDATE accounts SET balance = balance - ? WHERE id = ?")
//!         .bind(100_i64)
//!         .bind(1_i64)
//!         .execute(&mut *tx)
//!         .await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

/// Runs the given block inside a transaction on the write pool.
///
/// - Begins via [`ConnectionRouter::begin`](crate::ConnectionRouter::begin).
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
///
/// The block must evaluate to `rwsql::DbResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($router:expr, $tx:ident, $body:block) => {{
        let mut $tx = ($router).begin().await?;

        let __rwsql_tx_body_result = async { $body }.await;
        match __rwsql_tx_body_result {
            Ok(value) => {
                $tx.commit().await.map_err($crate::DbError::from)?;
                Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::DbError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}
