//! Routing between a primary (write) pool and a replica (read) pool.
//!
//! The router is an explicitly constructed value passed by reference to every
//! [`QueryBuilder`](crate::QueryBuilder); there is no process-global connection
//! state. When no replica is configured the read handle aliases the write
//! handle, so both sides are always present once the router exists.

use std::time::Duration;

use sqlx::mysql::{MySql, MySqlPool, MySqlPoolOptions};
use sqlx::Transaction;
use tracing::info;

use crate::config::{ConnectionParams, DatabaseConfig};
use crate::error::{DbError, DbResult};

/// Which side of the split an operation must use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Read,
    Write,
}

impl Target {
    /// Resolve the target for one operation.
    ///
    /// Writes always go to the primary. Reads go to the replica unless the
    /// caller forced the write connection (to dodge replication lag right
    /// after a write).
    pub fn for_query(is_write: bool, force_write: bool) -> Self {
        if is_write || force_write {
            Target::Write
        } else {
            Target::Read
        }
    }
}

/// Holds the write and read pools and resolves which one an operation uses.
#[derive(Clone)]
pub struct ConnectionRouter {
    write: MySqlPool,
    read: MySqlPool,
    split: bool,
}

impl std::fmt::Debug for ConnectionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRouter")
            .field("split", &self.split)
            .field("write_size", &self.write.size())
            .field("read_size", &self.read.size())
            .finish()
    }
}

impl ConnectionRouter {
    /// Connect eagerly: each configured side is connected and verified with a
    /// ping before this returns. A failure surfaces immediately as
    /// [`DbError::Connection`] and is never retried here.
    pub async fn connect(config: DatabaseConfig) -> DbResult<Self> {
        let (write_params, read_params) = config.resolve();
        let split = read_params.is_some();

        let write = connect_pool(&write_params).await?;
        let read = match read_params {
            Some(params) => connect_pool(&params).await?,
            None => write.clone(),
        };

        info!(replica = split, "database router connected");
        Ok(Self { write, read, split })
    }

    /// Build the pools without touching the network. Connections are opened on
    /// first use, and connect failures surface from the first operation that
    /// needs one. Useful for tests and for processes that must construct their
    /// wiring before the database is reachable.
    pub fn connect_lazy(config: DatabaseConfig) -> Self {
        let (write_params, read_params) = config.resolve();
        let split = read_params.is_some();

        let write = pool_options().connect_lazy_with(write_params.connect_options());
        let read = match read_params {
            Some(params) => pool_options().connect_lazy_with(params.connect_options()),
            None => write.clone(),
        };

        Self { write, read, split }
    }

    /// Return the pool for the given target. Infallible: both handles exist
    /// for the lifetime of the router.
    pub fn resolve(&self, target: Target) -> &MySqlPool {
        match target {
            Target::Write => &self.write,
            Target::Read => &self.read,
        }
    }

    /// The primary pool.
    pub fn write_pool(&self) -> &MySqlPool {
        &self.write
    }

    /// The replica pool (aliases the primary when no replica is configured).
    pub fn read_pool(&self) -> &MySqlPool {
        &self.read
    }

    /// Whether reads and writes go to distinct pools.
    pub fn is_split(&self) -> bool {
        self.split
    }

    /// Begin a transaction. Always targets the write pool; commit and rollback
    /// are the driver's own primitives, and the caller must roll back
    /// explicitly on error (or use the [`transaction!`](crate::transaction!)
    /// macro).
    pub async fn begin(&self) -> DbResult<Transaction<'static, MySql>> {
        Ok(self.write.begin().await?)
    }

    /// Verify both sides are reachable.
    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.write)
            .await
            .map_err(|e| DbError::connection(format!("write ping failed: {e}")))?;
        if self.split {
            sqlx::query("SELECT 1")
                .execute(&self.read)
                .await
                .map_err(|e| DbError::connection(format!("read ping failed: {e}")))?;
        }
        Ok(())
    }

    /// Close both pools.
    pub async fn close(&self) {
        self.read.close().await;
        self.write.close().await;
    }
}

fn pool_options() -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30))
}

async fn connect_pool(params: &ConnectionParams) -> DbResult<MySqlPool> {
    let pool = pool_options()
        .connect_with(params.connect_options())
        .await
        .map_err(|e| DbError::connection(e.to_string()))?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| DbError::connection(format!("failed to verify connection: {e}")))?;

    Ok(pool)
}
