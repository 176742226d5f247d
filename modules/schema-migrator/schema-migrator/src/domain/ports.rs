//! Output ports: what the engine needs from storage, drivers and authentication.

use async_trait::async_trait;
use schema_migrator_sdk::TenantConnectionConfig;
use tenant_security::SecurityContext;
use thiserror::Error;
use uuid::Uuid;

use super::descriptor::ConnectionDescriptor;
use super::directive::TableBlueprint;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no connection config stored for tenant {0}")]
    Missing(Uuid),
    /// Stored bytes could not be opened or parsed.
    #[error("stored connection config is corrupt: {0}")]
    Corrupt(String),
    #[error("config storage failed: {0}")]
    Storage(String),
}

/// Persists each tenant's connection config, sealed at rest.
#[async_trait]
pub trait TenantConfigProvider: Send + Sync {
    /// Replace the tenant's stored config.
    async fn store(
        &self,
        tenant_id: Uuid,
        config: &TenantConnectionConfig,
    ) -> Result<(), ConfigError>;

    async fn load(&self, tenant_id: Uuid) -> Result<TenantConnectionConfig, ConfigError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CipherError(pub String);

/// Seals config payloads. The engine never depends on a specific algorithm.
pub trait ConfigCipher: Send + Sync {
    /// # Errors
    /// Returns [`CipherError`] if encryption fails.
    fn seal(&self, plaintext: &[u8]) -> Result<String, CipherError>;

    /// # Errors
    /// Returns [`CipherError`] if the payload is malformed or fails authentication.
    fn open(&self, sealed: &str) -> Result<Vec<u8>, CipherError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// Unreachable server, rejected credentials or failed database creation.
    #[error("{0}")]
    Connection(String),
    /// The backend reported the table as already present.
    #[error("table '{0}' already exists")]
    TableExists(String),
    #[error("{0}")]
    Statement(String),
}

/// Opens tenant connections for one of the supported backends.
#[async_trait]
pub trait RelationalDriver: Send + Sync {
    async fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn TenantConnection>, DriverError>;
}

/// One live connection bound to a tenant's server or database.
#[async_trait]
pub trait TenantConnection: Send + Sync {
    async fn execute(&self, statement: &str) -> Result<(), DriverError>;

    async fn database_exists(&self, name: &str) -> Result<bool, DriverError>;

    /// Create `name` unless it already exists.
    async fn ensure_database(&self, name: &str) -> Result<(), DriverError>;

    async fn has_table(&self, name: &str) -> Result<bool, DriverError>;

    async fn create_table(&self, table: &TableBlueprint) -> Result<(), DriverError>;

    async fn drop_table(&self, name: &str) -> Result<(), DriverError>;

    /// Release the connection. Further calls fail.
    async fn close(&self);
}

/// Maps a bearer token to the caller's identity.
#[async_trait]
pub trait AuthnResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Option<SecurityContext>;
}
