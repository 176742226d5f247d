//! Tenant connections over `tenant-db` pools and `SeaORM`.

pub mod ddl;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use schema_migrator_sdk::DbDriver;
use sea_orm::sea_query::{Alias, Table};
use sea_orm::{ConnectionTrait, DbBackend, DbErr, Statement};
use sea_orm_migration::SchemaManager;
use tenant_db::{DbConnConfig, DbEngine, DbHandle, PoolCfg, build_connect_options};

use crate::domain::descriptor::ConnectionDescriptor;
use crate::domain::directive::TableBlueprint;
use crate::domain::ports::{DriverError, RelationalDriver, TenantConnection};

/// `PostgreSQL` always needs a database; server-level work happens here.
const PG_MAINTENANCE_DB: &str = "postgres";

/// Opens one small pool per tenant connection. Tenant passwords are used
/// verbatim: no `${VAR}` expansion happens on tenant-supplied values.
pub struct SeaOrmDriver {
    sqlite_dir: PathBuf,
    pool: PoolCfg,
}

impl SeaOrmDriver {
    #[must_use]
    pub fn new(
        sqlite_dir: impl Into<PathBuf>,
        connect_timeout: Duration,
        max_connections: u32,
    ) -> Self {
        Self {
            sqlite_dir: sqlite_dir.into(),
            pool: PoolCfg {
                max_conns: Some(max_connections.max(1)),
                acquire_timeout: Some(connect_timeout),
                ..PoolCfg::default()
            },
        }
    }

    fn conn_config(&self, descriptor: &ConnectionDescriptor) -> DbConnConfig {
        match descriptor.driver {
            DbDriver::Sqlite => match descriptor.database() {
                Some(db) => DbConnConfig {
                    engine: Some(DbEngine::Sqlite),
                    path: Some(sqlite_file(&self.sqlite_dir, db)),
                    ..DbConnConfig::default()
                },
                None => DbConnConfig {
                    engine: Some(DbEngine::Sqlite),
                    dsn: Some("sqlite::memory:".to_owned()),
                    ..DbConnConfig::default()
                },
            },
            DbDriver::Postgres => DbConnConfig {
                engine: Some(DbEngine::Postgres),
                dbname: Some(descriptor.database().unwrap_or(PG_MAINTENANCE_DB).to_owned()),
                ..server_fields(descriptor)
            },
            DbDriver::Mysql => DbConnConfig {
                engine: Some(DbEngine::MySql),
                dbname: descriptor.database.clone(),
                ..server_fields(descriptor)
            },
        }
    }
}

fn server_fields(descriptor: &ConnectionDescriptor) -> DbConnConfig {
    DbConnConfig {
        host: Some(descriptor.host.clone()),
        port: Some(descriptor.port),
        user: Some(descriptor.username.clone()),
        password: descriptor
            .password
            .as_ref()
            .filter(|p| !p.is_empty())
            .map(|p| p.expose().to_owned()),
        ..DbConnConfig::default()
    }
}

fn sqlite_file(dir: &Path, database: &str) -> PathBuf {
    dir.join(format!("{database}.sqlite"))
}

#[async_trait]
impl RelationalDriver for SeaOrmDriver {
    async fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn TenantConnection>, DriverError> {
        let cfg = self.conn_config(descriptor);
        let options =
            build_connect_options(&cfg).map_err(|e| DriverError::Connection(e.to_string()))?;
        let handle = options
            .connect(&self.pool)
            .await
            .map_err(|e| DriverError::Connection(e.to_string()))?;

        tracing::debug!(target_db = %descriptor, dsn = handle.dsn(), "Opened tenant connection");
        Ok(Box::new(SeaOrmConnection {
            driver: descriptor.driver,
            handle,
            sqlite_dir: self.sqlite_dir.clone(),
        }))
    }
}

struct SeaOrmConnection {
    driver: DbDriver,
    handle: DbHandle,
    sqlite_dir: PathBuf,
}

impl SeaOrmConnection {
    fn manager(&self) -> SchemaManager<'_> {
        SchemaManager::new(self.handle.sea())
    }
}

fn statement_error(e: impl std::fmt::Display) -> DriverError {
    DriverError::Statement(e.to_string())
}

fn connection_error(e: impl std::fmt::Display) -> DriverError {
    DriverError::Connection(e.to_string())
}

/// Backends word it differently but all say "already exists".
fn create_error(e: &DbErr, table: &str) -> DriverError {
    let message = e.to_string();
    if message.contains("already exists") {
        DriverError::TableExists(table.to_owned())
    } else {
        DriverError::Statement(message)
    }
}

#[async_trait]
impl TenantConnection for SeaOrmConnection {
    async fn execute(&self, statement: &str) -> Result<(), DriverError> {
        self.handle
            .sea()
            .execute_unprepared(statement)
            .await
            .map(|_| ())
            .map_err(statement_error)
    }

    async fn database_exists(&self, name: &str) -> Result<bool, DriverError> {
        let lookup = match self.driver {
            DbDriver::Sqlite => {
                return tokio::fs::try_exists(sqlite_file(&self.sqlite_dir, name))
                    .await
                    .map_err(connection_error);
            }
            DbDriver::Mysql => Statement::from_sql_and_values(
                DbBackend::MySql,
                "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA WHERE SCHEMA_NAME = ?",
                [name.into()],
            ),
            DbDriver::Postgres => Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT 1 FROM pg_database WHERE datname = $1",
                [name.into()],
            ),
        };
        let row = self
            .handle
            .sea()
            .query_one(lookup)
            .await
            .map_err(connection_error)?;
        Ok(row.is_some())
    }

    async fn ensure_database(&self, name: &str) -> Result<(), DriverError> {
        // `name` passed identifier validation, so quoting it is enough
        match self.driver {
            // the file itself is created on first connect
            DbDriver::Sqlite => tokio::fs::create_dir_all(&self.sqlite_dir)
                .await
                .map_err(connection_error),
            DbDriver::Mysql => self
                .execute(&format!("CREATE DATABASE IF NOT EXISTS `{name}`"))
                .await
                .map_err(|e| DriverError::Connection(e.to_string())),
            DbDriver::Postgres => {
                if self.database_exists(name).await? {
                    return Ok(());
                }
                self.execute(&format!("CREATE DATABASE \"{name}\""))
                    .await
                    .map_err(|e| DriverError::Connection(e.to_string()))
            }
        }
    }

    async fn has_table(&self, name: &str) -> Result<bool, DriverError> {
        self.manager().has_table(name).await.map_err(statement_error)
    }

    async fn create_table(&self, table: &TableBlueprint) -> Result<(), DriverError> {
        let rendered = ddl::render_table(self.driver, table);
        let manager = self.manager();
        manager
            .create_table(rendered.table)
            .await
            .map_err(|e| create_error(&e, &table.name))?;
        for index in rendered.indexes {
            manager.create_index(index).await.map_err(statement_error)?;
        }
        for comment in &rendered.comments {
            self.execute(comment).await?;
        }
        Ok(())
    }

    async fn drop_table(&self, name: &str) -> Result<(), DriverError> {
        self.manager()
            .drop_table(Table::drop().table(Alias::new(name)).to_owned())
            .await
            .map_err(statement_error)
    }

    async fn close(&self) {
        self.handle.clone().close().await;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use schema_migrator_sdk::{ColumnSpec, ColumnType};
    use tenant_security::SecretString;

    use crate::domain::translator::ColumnTranslator;

    fn descriptor(driver: DbDriver, database: Option<&str>) -> ConnectionDescriptor {
        ConnectionDescriptor {
            driver,
            host: "db.internal".to_owned(),
            port: 5432,
            username: "app".to_owned(),
            password: Some(SecretString::new("${HOME}")),
            database: database.map(str::to_owned),
        }
    }

    fn driver(dir: &Path) -> SeaOrmDriver {
        SeaOrmDriver::new(dir, Duration::from_secs(5), 2)
    }

    #[test]
    fn postgres_server_connection_uses_maintenance_db() {
        let d = driver(Path::new("/tmp/t"));
        let cfg = d.conn_config(&descriptor(DbDriver::Postgres, None));
        assert_eq!(cfg.engine, Some(DbEngine::Postgres));
        assert_eq!(cfg.dbname.as_deref(), Some("postgres"));
        // tenant values are never env-expanded
        assert_eq!(cfg.password.as_deref(), Some("${HOME}"));

        let cfg = d.conn_config(&descriptor(DbDriver::Postgres, Some("tenant_a")));
        assert_eq!(cfg.dbname.as_deref(), Some("tenant_a"));
    }

    #[test]
    fn mysql_server_connection_selects_no_database() {
        let d = driver(Path::new("/tmp/t"));
        let cfg = d.conn_config(&descriptor(DbDriver::Mysql, None));
        assert_eq!(cfg.engine, Some(DbEngine::MySql));
        assert!(cfg.dbname.is_none());
        assert_eq!(cfg.host.as_deref(), Some("db.internal"));
    }

    #[test]
    fn sqlite_databases_are_files_under_the_tenant_dir() {
        let d = driver(Path::new("/var/lib/tenants"));
        let cfg = d.conn_config(&descriptor(DbDriver::Sqlite, Some("shop")));
        assert_eq!(cfg.path, Some(PathBuf::from("/var/lib/tenants/shop.sqlite")));
        assert!(cfg.host.is_none());

        let cfg = d.conn_config(&descriptor(DbDriver::Sqlite, None));
        assert_eq!(cfg.dsn.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn already_exists_errors_map_to_table_exists() {
        let err = create_error(
            &DbErr::Custom("table widgets already exists".to_owned()),
            "widgets",
        );
        assert_eq!(err, DriverError::TableExists("widgets".to_owned()));
        let err = create_error(&DbErr::Custom("syntax error".to_owned()), "widgets");
        assert!(matches!(err, DriverError::Statement(_)));
    }

    #[tokio::test]
    async fn sqlite_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(&dir.path().join("tenants"));

        let server = driver
            .connect(&descriptor(DbDriver::Sqlite, None))
            .await
            .unwrap();
        assert!(!server.database_exists("shop").await.unwrap());
        server.ensure_database("shop").await.unwrap();
        server.close().await;

        let conn = driver
            .connect(&descriptor(DbDriver::Sqlite, Some("shop")))
            .await
            .unwrap();
        let title = ColumnTranslator::default()
            .translate(&ColumnSpec::new("title", ColumnType::String))
            .unwrap();
        let blueprint = TableBlueprint::with_conventions("widgets", vec![title]);

        assert!(!conn.has_table("widgets").await.unwrap());
        conn.create_table(&blueprint).await.unwrap();
        assert!(conn.has_table("widgets").await.unwrap());

        let again = conn.create_table(&blueprint).await.unwrap_err();
        assert_eq!(again, DriverError::TableExists("widgets".to_owned()));

        conn.drop_table("widgets").await.unwrap();
        assert!(!conn.has_table("widgets").await.unwrap());
        conn.close().await;

        assert!(dir.path().join("tenants/shop.sqlite").exists());
    }
}
