//! Connection descriptors derived from a tenant's stored config.

use std::fmt;

use schema_migrator_sdk::{DbDriver, TenantConnectionConfig};
use tenant_security::SecretString;

/// Everything a driver needs to open one connection. Built per request, never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub driver: DbDriver,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<SecretString>,
    /// `None` connects to the server without selecting a database.
    pub database: Option<String>,
}

impl ConnectionDescriptor {
    #[must_use]
    pub fn from_config(config: &TenantConnectionConfig) -> Self {
        Self {
            driver: config.driver,
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
            database: Some(config.database.clone()).filter(|db| !db.is_empty()),
        }
    }

    /// Same server and credentials, no database selected.
    #[must_use]
    pub fn without_database(&self) -> Self {
        Self {
            database: None,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }
}

/// Credential-free form, safe for logs.
impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let db = self.database().unwrap_or("");
        if self.driver.is_server() {
            write!(
                f,
                "{}://{}@{}:{}/{db}",
                self.driver, self.username, self.host, self.port
            )
        } else {
            write!(f, "sqlite:{db}")
        }
    }
}
