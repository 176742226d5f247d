//! Domain errors for schema migrations.

use schema_migrator_sdk::{FieldViolation, SchemaMigratorError};
use thiserror::Error;
use uuid::Uuid;

use super::ports::{ConfigError, DriverError};

/// Every way a tenant operation can end without success.
#[derive(Error, Debug)]
pub enum DomainError {
    /// The request is malformed. Carries every violated rule, not only the first.
    #[error("validation failed with {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("table '{0}' is protected")]
    ProtectedTable(String),

    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    #[error("no connection config saved for tenant {0}")]
    ConfigMissing(Uuid),

    #[error("stored connection config is unreadable: {0}")]
    ConfigCorrupt(String),

    /// Server unreachable, credentials rejected or database creation failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A DDL statement failed after the database was ensured.
    #[error("statement failed: {0}")]
    Execution(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// The caller carries no tenant identity.
    #[error("unauthenticated")]
    Unauthenticated,
}

impl DomainError {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation::new(field, message)])
    }

    /// Client-side failures end in `Rejected`; the rest end in `Failed`.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Unauthenticated
                | Self::ProtectedTable(_)
                | Self::TableExists(_)
                | Self::TableNotFound(_)
        )
    }
}

impl From<ConfigError> for DomainError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Missing(tenant_id) => Self::ConfigMissing(tenant_id),
            ConfigError::Corrupt(msg) => Self::ConfigCorrupt(msg),
            ConfigError::Storage(msg) => Self::Internal(msg),
        }
    }
}

impl From<DriverError> for DomainError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::Connection(msg) => Self::Connection(msg),
            DriverError::TableExists(table) => Self::TableExists(table),
            DriverError::Statement(msg) => Self::Execution(msg),
        }
    }
}

impl From<DomainError> for SchemaMigratorError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(violations) => Self::Validation(violations),
            DomainError::ProtectedTable(table) => Self::Protected(table),
            DomainError::TableExists(table) => Self::Conflict(table),
            DomainError::TableNotFound(table) => Self::NotFound(table),
            e @ (DomainError::ConfigMissing(_) | DomainError::ConfigCorrupt(_)) => {
                Self::Config(e.to_string())
            }
            e @ (DomainError::Connection(_)
            | DomainError::Execution(_)
            | DomainError::Internal(_)) => Self::Server(e.to_string()),
            DomainError::Unauthenticated => Self::Unauthenticated,
        }
    }
}
