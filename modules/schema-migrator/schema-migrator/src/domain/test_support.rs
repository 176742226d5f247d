//! In-memory ports for domain and handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use schema_migrator_sdk::{DbDriver, TenantConnectionConfig};
use uuid::Uuid;

use super::descriptor::ConnectionDescriptor;
use super::directive::TableBlueprint;
use super::ports::{
    ConfigError, DriverError, RelationalDriver, TenantConfigProvider, TenantConnection,
};

#[derive(Default)]
pub struct World {
    pub databases: HashSet<String>,
    /// Keyed by `<database>.<table>`.
    pub tables: HashMap<String, TableBlueprint>,
    pub calls: Vec<String>,
}

/// Driver over a shared in-memory "server" that records every call.
#[derive(Clone, Default)]
pub struct MockDriver {
    pub world: Arc<Mutex<World>>,
    pub fail_connect: Option<String>,
    pub fail_create: Option<DriverError>,
}

impl MockDriver {
    pub fn calls(&self) -> Vec<String> {
        self.world.lock().unwrap().calls.clone()
    }

    pub fn with_table(self, database: &str, table: &str) -> Self {
        {
            let mut world = self.world.lock().unwrap();
            world.databases.insert(database.to_owned());
            world.tables.insert(
                format!("{database}.{table}"),
                TableBlueprint::with_conventions(table, vec![]),
            );
        }
        self
    }

    pub fn table(&self, database: &str, table: &str) -> Option<TableBlueprint> {
        self.world
            .lock()
            .unwrap()
            .tables
            .get(&format!("{database}.{table}"))
            .cloned()
    }

    pub fn has_database(&self, database: &str) -> bool {
        self.world.lock().unwrap().databases.contains(database)
    }
}

#[async_trait]
impl RelationalDriver for MockDriver {
    async fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn TenantConnection>, DriverError> {
        let target = descriptor.database().unwrap_or("<server>").to_owned();
        self.world.lock().unwrap().calls.push(format!("connect:{target}"));
        if let Some(msg) = &self.fail_connect {
            return Err(DriverError::Connection(msg.clone()));
        }
        Ok(Box::new(MockConnection {
            database: descriptor.database.clone(),
            world: Arc::clone(&self.world),
            fail_create: self.fail_create.clone(),
        }))
    }
}

pub struct MockConnection {
    database: Option<String>,
    world: Arc<Mutex<World>>,
    fail_create: Option<DriverError>,
}

impl MockConnection {
    fn key(&self, table: &str) -> String {
        format!("{}.{table}", self.database.as_deref().unwrap_or(""))
    }

    fn record(&self, call: String) {
        self.world.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl TenantConnection for MockConnection {
    async fn execute(&self, statement: &str) -> Result<(), DriverError> {
        self.record(format!("execute:{statement}"));
        Ok(())
    }

    async fn database_exists(&self, name: &str) -> Result<bool, DriverError> {
        self.record(format!("database_exists:{name}"));
        Ok(self.world.lock().unwrap().databases.contains(name))
    }

    async fn ensure_database(&self, name: &str) -> Result<(), DriverError> {
        self.record(format!("ensure_database:{name}"));
        self.world.lock().unwrap().databases.insert(name.to_owned());
        Ok(())
    }

    async fn has_table(&self, name: &str) -> Result<bool, DriverError> {
        self.record(format!("has_table:{name}"));
        Ok(self.world.lock().unwrap().tables.contains_key(&self.key(name)))
    }

    async fn create_table(&self, table: &TableBlueprint) -> Result<(), DriverError> {
        self.record(format!("create_table:{}", table.name));
        if let Some(e) = &self.fail_create {
            return Err(e.clone());
        }
        let key = self.key(&table.name);
        self.world.lock().unwrap().tables.insert(key, table.clone());
        Ok(())
    }

    async fn drop_table(&self, name: &str) -> Result<(), DriverError> {
        self.record(format!("drop_table:{name}"));
        let key = self.key(name);
        self.world.lock().unwrap().tables.remove(&key);
        Ok(())
    }

    async fn close(&self) {
        self.record("close".to_owned());
    }
}

/// Plain in-memory config store.
#[derive(Default)]
pub struct InMemoryConfigStore {
    pub configs: Mutex<HashMap<Uuid, TenantConnectionConfig>>,
    pub corrupt: bool,
}

impl InMemoryConfigStore {
    pub fn with(tenant_id: Uuid, config: TenantConnectionConfig) -> Self {
        let store = Self::default();
        store.configs.lock().unwrap().insert(tenant_id, config);
        store
    }
}

#[async_trait]
impl TenantConfigProvider for InMemoryConfigStore {
    async fn store(
        &self,
        tenant_id: Uuid,
        config: &TenantConnectionConfig,
    ) -> Result<(), ConfigError> {
        self.configs.lock().unwrap().insert(tenant_id, config.clone());
        Ok(())
    }

    async fn load(&self, tenant_id: Uuid) -> Result<TenantConnectionConfig, ConfigError> {
        if self.corrupt {
            return Err(ConfigError::Corrupt("authentication tag mismatch".to_owned()));
        }
        self.configs
            .lock()
            .unwrap()
            .get(&tenant_id)
            .cloned()
            .ok_or(ConfigError::Missing(tenant_id))
    }
}

pub fn sqlite_config(database: &str) -> TenantConnectionConfig {
    TenantConnectionConfig {
        driver: DbDriver::Sqlite,
        host: String::new(),
        port: 0,
        database: database.to_owned(),
        username: "u".to_owned(),
        password: None,
    }
}
