use std::sync::Arc;

use async_trait::async_trait;
use schema_migrator_sdk::{
    MigrationOutcome, MigrationPreview, SavedConfig, SchemaMigratorClientV1, SchemaMigratorError,
    TableSpec, TenantConnectionConfig,
};
use tenant_security::SecurityContext;

use crate::domain::service::{ConfigRequest, Service, TableRequest};

/// In-process implementation of the SDK client.
pub struct SchemaMigratorLocalClient {
    service: Arc<Service>,
}

impl SchemaMigratorLocalClient {
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SchemaMigratorClientV1 for SchemaMigratorLocalClient {
    async fn save_config(
        &self,
        ctx: &SecurityContext,
        config: TenantConnectionConfig,
    ) -> Result<SavedConfig, SchemaMigratorError> {
        self.service
            .save_config(ctx, ConfigRequest::Config(&config))
            .await
            .map_err(Into::into)
    }

    async fn preview_migration(
        &self,
        _ctx: &SecurityContext,
        spec: TableSpec,
    ) -> Result<MigrationPreview, SchemaMigratorError> {
        self.service
            .preview_migration(TableRequest::Spec(&spec))
            .map_err(Into::into)
    }

    async fn run_migration(
        &self,
        ctx: &SecurityContext,
        spec: TableSpec,
    ) -> Result<MigrationOutcome, SchemaMigratorError> {
        self.service
            .run_migration(ctx, TableRequest::Spec(&spec))
            .await
            .map_err(Into::into)
    }

    async fn rollback_migration(
        &self,
        ctx: &SecurityContext,
        table: &str,
    ) -> Result<MigrationOutcome, SchemaMigratorError> {
        self.service
            .rollback_migration(ctx, table)
            .await
            .map_err(Into::into)
    }
}
