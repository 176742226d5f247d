//! `SchemaMigratorClientV1` trait definition.

use async_trait::async_trait;
use tenant_security::SecurityContext;

use crate::errors::SchemaMigratorError;
use crate::models::{
    MigrationOutcome, MigrationPreview, SavedConfig, TableSpec, TenantConnectionConfig,
};

/// Public API of the schema-migrator module (Version 1).
///
/// Every call acts on the database of `ctx.tenant_id()`, as described by the
/// connection config the tenant saved last.
#[async_trait]
pub trait SchemaMigratorClientV1: Send + Sync {
    /// Validate and store the tenant's connection config, replacing any previous one.
    async fn save_config(
        &self,
        ctx: &SecurityContext,
        config: TenantConnectionConfig,
    ) -> Result<SavedConfig, SchemaMigratorError>;

    /// Validate a table request without touching any database.
    async fn preview_migration(
        &self,
        ctx: &SecurityContext,
        spec: TableSpec,
    ) -> Result<MigrationPreview, SchemaMigratorError>;

    /// Create the table in the tenant database, creating the database first if needed.
    async fn run_migration(
        &self,
        ctx: &SecurityContext,
        spec: TableSpec,
    ) -> Result<MigrationOutcome, SchemaMigratorError>;

    /// Drop a table previously created in the tenant database.
    async fn rollback_migration(
        &self,
        ctx: &SecurityContext,
        table: &str,
    ) -> Result<MigrationOutcome, SchemaMigratorError>;
}
