//! Terminal methods: freeze the builder state into SQL, resolve a pool, and
//! delegate execution to the driver. Every driver failure propagates to the
//! caller unmodified; there is no local retry or recovery.

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::TryStreamExt;
use sqlx::mysql::{MySql, MySqlRow};
use sqlx::{FromRow, Row};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::router::Target;
use crate::value::{bind_values, Value};

use super::QueryBuilder;

impl<'a> QueryBuilder<'a> {
    pub(crate) fn route(&self, is_write: bool) -> Target {
        Target::for_query(is_write, self.force_write)
    }

    fn validate(&self) -> DbResult<()> {
        if self.table.trim().is_empty() {
            return Err(DbError::config("query builder requires a table name"));
        }
        Ok(())
    }

    // ==================== Reads ====================

    /// Execute the SELECT and return all rows.
    pub async fn get(self) -> DbResult<Vec<MySqlRow>> {
        self.validate()?;
        let target = self.route(false);
        let sql = self.to_sql();
        debug!(sql = %sql, route = ?target, "executing select");
        let pool = self.router.resolve(target);
        Ok(bind_values(sqlx::query(&sql), &self.bindings)
            .fetch_all(pool)
            .await?)
    }

    /// Execute the SELECT and map each row into `T`.
    pub async fn get_as<T>(self) -> DbResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, MySqlRow>,
    {
        let rows = self.get().await?;
        rows.iter()
            .map(|row| T::from_row(row).map_err(DbError::from))
            .collect()
    }

    pub(crate) fn first_query(mut self) -> Self {
        self.limit = Some(1);
        self
    }

    pub(crate) fn find_query(self, id: impl Into<Value>) -> Self {
        self.and_where_eq("id", id).first_query()
    }

    /// Force `LIMIT 1` and return the single row, if any.
    pub async fn first(self) -> DbResult<Option<MySqlRow>> {
        let this = self.first_query();
        this.validate()?;
        let target = this.route(false);
        let sql = this.to_sql();
        debug!(sql = %sql, route = ?target, "executing select");
        let pool = this.router.resolve(target);
        Ok(bind_values(sqlx::query(&sql), &this.bindings)
            .fetch_optional(pool)
            .await?)
    }

    /// Like [`first`](Self::first), mapped into `T`.
    pub async fn first_as<T>(self) -> DbResult<Option<T>>
    where
        T: for<'r> FromRow<'r, MySqlRow>,
    {
        let row = self.first().await?;
        row.as_ref()
            .map(|r| T::from_row(r).map_err(DbError::from))
            .transpose()
    }

    /// Shorthand for `and_where_eq("id", id).first()`.
    pub async fn find(self, id: impl Into<Value>) -> DbResult<Option<MySqlRow>> {
        self.find_query(id).first().await
    }

    /// Lazy, forward-only row stream: one row per advance, fetched
    /// incrementally from the driver instead of materialized at once. Not
    /// restartable; dropping it early is fine.
    pub fn cursor(self) -> impl Stream<Item = DbResult<MySqlRow>> + 'a {
        try_stream! {
            self.validate()?;
            let target = self.route(false);
            let sql = self.to_sql();
            debug!(sql = %sql, route = ?target, "opening row cursor");
            let pool = self.router.resolve(target);
            let mut rows = bind_values(sqlx::query(&sql), &self.bindings).fetch(pool);
            while let Some(row) = rows.try_next().await? {
                yield row;
            }
        }
    }

    // ==================== Aggregates ====================

    async fn aggregate_row(&self, func: &str, column: &str) -> DbResult<Option<MySqlRow>> {
        self.validate()?;
        let target = self.route(false);
        let sql = self.to_aggregate_sql(func, column);
        debug!(sql = %sql, route = ?target, "executing aggregate");
        let pool = self.router.resolve(target);
        Ok(bind_values(sqlx::query(&sql), &self.bindings)
            .fetch_optional(pool)
            .await?)
    }

    async fn aggregate<T>(self, func: &str, column: &str) -> DbResult<Option<T>>
    where
        T: for<'r> sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
    {
        match self.aggregate_row(func, column).await? {
            Some(row) => Ok(row.try_get::<Option<T>, _>(0)?),
            None => Ok(None),
        }
    }

    /// `COUNT(*)` over the current query. Never NULL.
    pub async fn count(self) -> DbResult<i64> {
        self.count_column("*").await
    }

    /// `COUNT(column)` over the current query.
    pub async fn count_column(self, column: &str) -> DbResult<i64> {
        match self.aggregate_row("COUNT", column).await? {
            Some(row) => Ok(row.try_get::<i64, _>(0)?),
            None => Ok(0),
        }
    }

    /// `SUM(column)`. `None` when no rows match, per SQL aggregate semantics.
    pub async fn sum<T>(self, column: &str) -> DbResult<Option<T>>
    where
        T: for<'r> sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
    {
        self.aggregate("SUM", column).await
    }

    /// `AVG(column)`. `None` when no rows match.
    pub async fn avg<T>(self, column: &str) -> DbResult<Option<T>>
    where
        T: for<'r> sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
    {
        self.aggregate("AVG", column).await
    }

    /// `MIN(column)`. `None` when no rows match.
    pub async fn min<T>(self, column: &str) -> DbResult<Option<T>>
    where
        T: for<'r> sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
    {
        self.aggregate("MIN", column).await
    }

    /// `MAX(column)`. `None` when no rows match.
    pub async fn max<T>(self, column: &str) -> DbResult<Option<T>>
    where
        T: for<'r> sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
    {
        self.aggregate("MAX", column).await
    }

    // ==================== Writes (always routed to the primary) ====================

    /// Execute an INSERT built from `data` in slice order and return the
    /// driver's last-insert id. Rejects an empty mapping.
    pub async fn insert(self, data: &[(&str, Value)]) -> DbResult<u64> {
        self.validate()?;
        if data.is_empty() {
            return Err(DbError::validation("insert requires at least one column"));
        }
        let (sql, values) = self.to_insert_sql(data);
        let target = self.route(true);
        debug!(sql = %sql, route = ?target, "executing insert");
        let pool = self.router.resolve(target);
        let result = bind_values(sqlx::query(&sql), &values).execute(pool).await?;
        Ok(result.last_insert_id())
    }

    /// Execute an UPDATE: SET pairs in `data` order, then the accumulated
    /// WHERE clause. Returns the affected-row count. With zero predicates
    /// this updates the whole table, intentionally unguarded, matching raw
    /// SQL semantics. Rejects an empty SET list.
    pub async fn update(self, data: &[(&str, Value)]) -> DbResult<u64> {
        self.validate()?;
        if data.is_empty() {
            return Err(DbError::validation("update requires a non-empty SET list"));
        }
        let (sql, values) = self.to_update_sql(data);
        let target = self.route(true);
        debug!(sql = %sql, route = ?target, "executing update");
        let pool = self.router.resolve(target);
        let result = bind_values(sqlx::query(&sql), &values).execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Execute a DELETE with the accumulated WHERE clause, returning the
    /// affected-row count. Zero predicates deletes every row, unguarded.
    pub async fn delete(self) -> DbResult<u64> {
        self.validate()?;
        let (sql, values) = self.to_delete_sql();
        let target = self.route(true);
        debug!(sql = %sql, route = ?target, "executing delete");
        let pool = self.router.resolve(target);
        let result = bind_values(sqlx::query(&sql), &values).execute(pool).await?;
        Ok(result.rows_affected())
    }
}
