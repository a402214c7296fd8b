//! Connection configuration for the primary and replica databases.

use serde::Deserialize;
use sqlx::mysql::MySqlConnectOptions;

use crate::error::{DbError, DbResult};

fn default_port() -> u16 {
    3306
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

/// Parameters for one MySQL connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionParams {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub dbname: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_charset")]
    pub charset: String,
}

impl ConnectionParams {
    /// Create parameters with the default port (3306) and charset (utf8mb4).
    pub fn new(
        host: impl Into<String>,
        dbname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            dbname: dbname.into(),
            user: user.into(),
            password: password.into(),
            charset: default_charset(),
        }
    }

    /// Override the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the connection charset.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Build typed driver connect options (no DSN string assembly).
    pub(crate) fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
            .charset(&self.charset)
    }
}

/// Database configuration, either a single connection used for both reads
/// and writes, or an explicit primary with an optional replica.
///
/// Deserializes from two layouts:
///
/// ```toml
/// # flat: one connection for both sides
/// host = "127.0.0.1"
/// dbname = "app"
/// user = "app"
/// password = "secret"
/// ```
///
/// ```toml
/// # split: primary plus optional replica
/// [write]
/// host = "primary.db"
/// dbname = "app"
/// user = "app"
/// password = "secret"
///
/// [read]
/// host = "replica.db"
/// dbname = "app"
/// user = "app_ro"
/// password = "secret"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DatabaseConfig {
    /// Primary connection plus optional replica. When `read` is absent the
    /// replica side aliases the primary.
    Split {
        write: ConnectionParams,
        read: Option<ConnectionParams>,
    },
    /// One connection used for both reads and writes.
    Single(ConnectionParams),
}

impl DatabaseConfig {
    /// Configuration with a single connection for both sides.
    pub fn single(params: ConnectionParams) -> Self {
        Self::Single(params)
    }

    /// Configuration with an explicit primary and replica.
    pub fn with_replica(write: ConnectionParams, read: ConnectionParams) -> Self {
        Self::Split {
            write,
            read: Some(read),
        }
    }

    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(input: &str) -> DbResult<Self> {
        toml::from_str(input).map_err(|e| DbError::config(e.to_string()))
    }

    /// Resolve into `(write, read)` parameters. `read` is `None` when the
    /// replica side should reuse the primary connection.
    pub(crate) fn resolve(self) -> (ConnectionParams, Option<ConnectionParams>) {
        match self {
            Self::Split { write, read } => (write, read),
            Self::Single(params) => (params, None),
        }
    }

    /// Whether this configuration carries a distinct replica.
    pub fn has_replica(&self) -> bool {
        matches!(self, Self::Split { read: Some(_), .. })
    }
}
