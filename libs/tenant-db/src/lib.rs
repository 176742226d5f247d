#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Multi-engine database connections.
//!
//! Connections are described with typed configuration (`DbConnConfig`) and turned
//! into sqlx `ConnectOptions` rather than hand-built DSN strings. A connected
//! [`DbHandle`] owns one sqlx pool and the `SeaORM` connection wrapping it.
//!
//! # Features
//! - `pg`, `mysql`, `sqlite`: enable the matching `SQLx` backend (all on by default)
//!
//! # Example
//! ```rust,no_run
//! use tenant_db::{DbConnConfig, DbEngine, build_db_handle};
//!
//! # async fn example() -> tenant_db::Result<()> {
//! let cfg = DbConnConfig {
//!     engine: Some(DbEngine::Postgres),
//!     host: Some("localhost".to_owned()),
//!     port: Some(5432),
//!     user: Some("app".to_owned()),
//!     password: Some("${DB_PASSWORD}".to_owned()),
//!     dbname: Some("app_db".to_owned()),
//!     ..Default::default()
//! };
//! let db = build_db_handle(cfg).await?;
//! println!("connected to {}", db.dsn());
//! db.close().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(
    not(any(feature = "pg", feature = "mysql", feature = "sqlite")),
    allow(unused_imports, unused_variables, dead_code, unreachable_code)
)]

pub mod config;
pub mod options;

mod pool_opts;

pub use config::{DbConnConfig, PoolCfg};
pub use options::{
    DbConnectOptions, build_connect_options, build_db_handle, expand_env_vars,
    redact_credentials_in_dsn,
};

#[cfg(feature = "mysql")]
use sea_orm::sqlx::MySqlPool;
#[cfg(feature = "pg")]
use sea_orm::sqlx::PgPool;
#[cfg(feature = "sqlite")]
use sea_orm::sqlx::SqlitePool;

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle and helpers.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error("Configuration conflict: {0}")]
    ConfigConflict(String),

    #[error("Invalid connection parameter: {0}")]
    InvalidParameter(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[cfg(any(feature = "pg", feature = "mysql", feature = "sqlite"))]
    #[error(transparent)]
    Sqlx(#[from] sea_orm::sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbEngine {
    #[serde(alias = "postgresql", alias = "pgsql", alias = "pg")]
    Postgres,
    #[serde(rename = "mysql")]
    MySql,
    Sqlite,
}

impl DbEngine {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Detect engine by DSN scheme. The tail (credentials etc.) is not inspected.
    ///
    /// # Errors
    /// Returns `DbError::UnknownDsn` if the DSN scheme is not recognized.
    pub fn from_dsn(dsn: &str) -> Result<Self> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else if s.starts_with("mysql://") {
            Ok(Self::MySql)
        } else if s.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else {
            Err(DbError::UnknownDsn(dsn.to_owned()))
        }
    }
}

impl std::fmt::Display for DbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete sqlx pool.
#[derive(Clone, Debug)]
pub enum DbPool {
    #[cfg(feature = "pg")]
    Postgres(PgPool),
    #[cfg(feature = "mysql")]
    MySql(MySqlPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Connected database: engine, pool, redacted DSN and the `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
    dsn: String,
    sea: DatabaseConnection,
}

impl DbHandle {
    pub(crate) fn new(
        engine: DbEngine,
        pool: DbPool,
        dsn: String,
        sea: DatabaseConnection,
    ) -> Self {
        Self {
            engine,
            pool,
            dsn,
            sea,
        }
    }

    /// Graceful pool close. Dropping the pool also closes it; this waits for it.
    pub async fn close(self) {
        match self.pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => p.close().await,
            #[cfg(feature = "mysql")]
            DbPool::MySql(p) => p.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => p.close().await,
        }
    }

    #[must_use]
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// Redacted DSN, safe for logs.
    #[must_use]
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// `SeaORM` connection over the same pool.
    #[must_use]
    pub fn sea(&self) -> &DatabaseConnection {
        &self.sea
    }
}
