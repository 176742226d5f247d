//! Tenant connection registry: resolves a tenant's config to a live connection.
//!
//! Binding is two-phase. The first connection selects no database so the
//! target database can be created; it is then closed and a fresh connection is
//! opened with the database selected. Nothing is cached across requests.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::descriptor::ConnectionDescriptor;
use super::error::DomainError;
use super::ports::{DriverError, RelationalDriver, TenantConnection};

/// A tenant's connection, alive for one operation.
pub struct TenantConnectionHandle {
    tenant_id: Uuid,
    descriptor: ConnectionDescriptor,
    conn: Box<dyn TenantConnection>,
}

impl TenantConnectionHandle {
    #[must_use]
    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    #[must_use]
    pub fn conn(&self) -> &dyn TenantConnection {
        self.conn.as_ref()
    }

    pub async fn close(self) {
        self.conn.close().await;
        debug!(tenant_id = %self.tenant_id, target = %self.descriptor, "Tenant connection closed");
    }
}

#[derive(Clone)]
pub struct TenantConnectionRegistry {
    driver: Arc<dyn RelationalDriver>,
}

impl TenantConnectionRegistry {
    #[must_use]
    pub fn new(driver: Arc<dyn RelationalDriver>) -> Self {
        Self { driver }
    }

    /// Phase one: connect to the server without selecting a database.
    ///
    /// # Errors
    /// `Connection` if the server is unreachable or rejects the credentials.
    pub async fn connect_server(
        &self,
        tenant_id: Uuid,
        descriptor: &ConnectionDescriptor,
    ) -> Result<TenantConnectionHandle, DomainError> {
        self.open(tenant_id, descriptor.without_database()).await
    }

    /// Phase two: create the database if needed, drop the server connection and
    /// reconnect with the database selected.
    ///
    /// # Errors
    /// `Connection` if creating the database or reconnecting fails.
    pub async fn bind_database(
        &self,
        server: TenantConnectionHandle,
        descriptor: &ConnectionDescriptor,
    ) -> Result<TenantConnectionHandle, DomainError> {
        let Some(database) = descriptor.database() else {
            return Ok(server);
        };
        let ensured = server.conn().ensure_database(database).await;
        let tenant_id = server.tenant_id();
        server.close().await;
        ensured.map_err(into_connection_error)?;
        debug!(%tenant_id, database, "Tenant database ensured");

        self.open(tenant_id, descriptor.clone()).await
    }

    /// Like [`Self::bind_database`] but never creates anything.
    /// Returns `None` when the database does not exist.
    ///
    /// # Errors
    /// `Connection` if probing or reconnecting fails.
    pub async fn attach_existing(
        &self,
        server: TenantConnectionHandle,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Option<TenantConnectionHandle>, DomainError> {
        let Some(database) = descriptor.database() else {
            return Ok(Some(server));
        };
        let exists = server.conn().database_exists(database).await;
        let tenant_id = server.tenant_id();
        server.close().await;
        if !exists.map_err(into_connection_error)? {
            debug!(%tenant_id, database, "Tenant database does not exist");
            return Ok(None);
        }

        self.open(tenant_id, descriptor.clone()).await.map(Some)
    }

    async fn open(
        &self,
        tenant_id: Uuid,
        descriptor: ConnectionDescriptor,
    ) -> Result<TenantConnectionHandle, DomainError> {
        let conn = self
            .driver
            .connect(&descriptor)
            .await
            .map_err(into_connection_error)?;
        debug!(%tenant_id, target = %descriptor, "Tenant connection opened");
        Ok(TenantConnectionHandle {
            tenant_id,
            descriptor,
            conn,
        })
    }
}

/// Anything going wrong while binding is a connection failure.
fn into_connection_error(e: DriverError) -> DomainError {
    match e {
        DriverError::Connection(msg) | DriverError::Statement(msg) => DomainError::Connection(msg),
        DriverError::TableExists(table) => {
            DomainError::Connection(format!("unexpected table conflict on '{table}'"))
        }
    }
}
