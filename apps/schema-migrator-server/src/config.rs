//! Layered server configuration: defaults, YAML file, `APP__` environment, CLI.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use figment::Figment;
use figment::providers::{Env, Format as _, Serialized, Yaml};
use schema_migrator::SchemaMigratorConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tenant_db::{DbConnConfig, DbEngine, redact_credentials_in_dsn};

const ENV_PREFIX: &str = "APP__";
const APP_DB_FILE: &str = "schema_migrator.db";
const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// The application's own store. Defaults to `<home_dir>/schema_migrator.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DbConnConfig>,
    pub schema_migrator: SchemaMigratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub home_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
            home_dir: PathBuf::from(".schema-migrator"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `schema_migrator=debug,info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl AppConfig {
    /// Merge defaults, the optional YAML file and `APP__SECTION__KEY` variables,
    /// then resolve paths against `server.home_dir`.
    ///
    /// # Errors
    /// Fails on unreadable or invalid sources and unknown keys.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Self = figment.extract().context("invalid configuration")?;
        config.resolve_paths();
        Ok(config)
    }

    fn resolve_paths(&mut self) {
        let home = self.server.home_dir.clone();
        if self.schema_migrator.tenant_sqlite_dir.is_relative() {
            self.schema_migrator.tenant_sqlite_dir =
                home.join(&self.schema_migrator.tenant_sqlite_dir);
        }
        if self.database.is_none() {
            self.database = Some(DbConnConfig {
                engine: Some(DbEngine::Sqlite),
                path: Some(home.join(APP_DB_FILE)),
                ..DbConnConfig::default()
            });
        }
    }

    /// `--port` replaces the port of `server.bind_addr`; each `-v` raises verbosity.
    ///
    /// # Errors
    /// Fails if `server.bind_addr` is not a socket address.
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) -> Result<()> {
        if let Some(port) = port {
            let mut addr = self.bind_addr()?;
            addr.set_port(port);
            self.server.bind_addr = addr.to_string();
        }
        match verbose {
            0 => {}
            1 => "info".clone_into(&mut self.logging.level),
            2 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
        Ok(())
    }

    /// # Errors
    /// Fails if `server.bind_addr` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind_addr
            .parse()
            .with_context(|| {
                format!("server.bind_addr '{}' is not a socket address", self.server.bind_addr)
            })
    }

    /// Effective configuration with secrets masked. The output is JSON, which
    /// YAML loaders read as-is.
    ///
    /// # Errors
    /// Fails if serialization fails.
    pub fn render_redacted(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Some(module) = value.get_mut("schema_migrator") {
            let has_key = module
                .get("encryption_key")
                .and_then(Value::as_str)
                .is_some_and(|k| !k.is_empty());
            if has_key {
                module["encryption_key"] = Value::from(REDACTED);
            }
            let tokens = self.schema_migrator.tokens.len();
            module["tokens"] = Value::from(format!("<{tokens} token(s)>"));
        }
        if let Some(password) = value.pointer_mut("/database/password") {
            *password = Value::from(REDACTED);
        }
        if let Some(dsn) = value.pointer_mut("/database/dsn") {
            *dsn = Value::from(redact_credentials_in_dsn(dsn.as_str()));
        }
        serde_json::to_string_pretty(&value).context("failed to render configuration")
    }
}
