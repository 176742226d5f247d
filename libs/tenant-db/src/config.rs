//! Serializable connection configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DbEngine;

/// Configuration for one database connection.
///
/// Either `dsn` or the individual fields may be used. Individual fields override
/// the matching DSN parts. `password`, `dsn` and `params` values may reference
/// environment variables as `${VAR}`.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DbConnConfig {
    /// Required when `dsn` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<DbEngine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dsn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Database to select. `PostgreSQL` requires one; `MySQL` may connect without.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbname: Option<String>,
    /// `SQLite` database file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Engine-specific options (`SQLite` PRAGMAs, `PostgreSQL` runtime options).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolCfg>,
}

impl std::fmt::Debug for DbConnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConnConfig")
            .field("engine", &self.engine)
            .field(
                "dsn",
                &crate::options::redact_credentials_in_dsn(self.dsn.as_deref()),
            )
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("dbname", &self.dbname)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("pool", &self.pool)
            .finish()
    }
}

/// Pool knobs; each driver applies the subset it supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PoolCfg {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub max_lifetime: Option<Duration>,
    pub test_before_acquire: bool,
}
