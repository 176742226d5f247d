//! Migration engine.
//!
//! Each run walks `Validating -> ConfigLoaded -> Connected -> DatabaseEnsured
//! -> SchemaChecked` and ends in exactly one of `Executed`, `Rejected` or
//! `Failed`. Nothing is retried; statements are not wrapped in a transaction.

use std::fmt;
use std::sync::Arc;

use schema_migrator_sdk::{
    MigrationOutcome, MigrationPreview, MigrationStatus, SavedConfig, TableSpec,
    TenantConnectionConfig,
};
use serde_json::Value;
use tenant_security::SecurityContext;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::descriptor::ConnectionDescriptor;
use super::directive::TableBlueprint;
use super::error::DomainError;
use super::ports::{RelationalDriver, TenantConfigProvider};
use super::registry::{TenantConnectionHandle, TenantConnectionRegistry};
use super::translator::ColumnTranslator;
use super::validator::{
    TableSpecValidator, ValidatedTable, validate_config, validate_config_request,
    validate_table_name,
};

// ============================================================================
// Service Configuration
// ============================================================================

pub struct ServiceConfig {
    pub default_string_length: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_string_length: 255,
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// A table request as received: an untyped body or an already typed spec.
#[derive(Debug, Clone, Copy)]
pub enum TableRequest<'a> {
    Body(&'a Value),
    Spec(&'a TableSpec),
}

impl TableRequest<'_> {
    /// Best-effort table name for logging before validation.
    fn table_hint(&self) -> &str {
        match self {
            Self::Body(body) => body.get("table").and_then(Value::as_str).unwrap_or(""),
            Self::Spec(spec) => &spec.table,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ConfigRequest<'a> {
    Body(&'a Value),
    Config(&'a TenantConnectionConfig),
}

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Validating,
    ConfigLoaded,
    Connected,
    DatabaseEnsured,
    SchemaChecked,
    Executed,
    Rejected,
    Failed,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validating => "Validating",
            Self::ConfigLoaded => "ConfigLoaded",
            Self::Connected => "Connected",
            Self::DatabaseEnsured => "DatabaseEnsured",
            Self::SchemaChecked => "SchemaChecked",
            Self::Executed => "Executed",
            Self::Rejected => "Rejected",
            Self::Failed => "Failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Migrate,
    Rollback,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Migrate => "migrate",
            Self::Rollback => "rollback",
        }
    }
}

/// Tracks and logs the state of one run.
struct Run {
    tenant_id: Uuid,
    operation: Operation,
    table: String,
    state: MigrationState,
}

impl Run {
    fn start(tenant_id: Uuid, operation: Operation, table: &str) -> Self {
        debug!(
            %tenant_id,
            operation = operation.as_str(),
            table,
            state = %MigrationState::Validating,
            "Migration started"
        );
        Self {
            tenant_id,
            operation,
            table: table.to_owned(),
            state: MigrationState::Validating,
        }
    }

    fn enter(&mut self, next: MigrationState) {
        debug!(
            tenant_id = %self.tenant_id,
            operation = self.operation.as_str(),
            table = %self.table,
            from = %self.state,
            state = %next,
            "Migration state changed"
        );
        self.state = next;
    }

    fn conclude<T>(&self, result: Result<T, DomainError>) -> Result<T, DomainError> {
        match &result {
            Ok(_) => info!(
                tenant_id = %self.tenant_id,
                operation = self.operation.as_str(),
                table = %self.table,
                state = %MigrationState::Executed,
                "Migration executed"
            ),
            Err(e) if e.is_rejection() => warn!(
                tenant_id = %self.tenant_id,
                operation = self.operation.as_str(),
                table = %self.table,
                reached = %self.state,
                state = %MigrationState::Rejected,
                error = %e,
                "Migration rejected"
            ),
            Err(e) => error!(
                tenant_id = %self.tenant_id,
                operation = self.operation.as_str(),
                table = %self.table,
                reached = %self.state,
                state = %MigrationState::Failed,
                error = %e,
                "Migration failed"
            ),
        }
        result
    }
}

// ============================================================================
// Service Implementation
// ============================================================================

pub struct Service {
    configs: Arc<dyn TenantConfigProvider>,
    registry: TenantConnectionRegistry,
    validator: TableSpecValidator,
}

impl Service {
    #[must_use]
    pub fn new(
        configs: Arc<dyn TenantConfigProvider>,
        driver: Arc<dyn RelationalDriver>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            configs,
            registry: TenantConnectionRegistry::new(driver),
            validator: TableSpecValidator::new(ColumnTranslator::new(config.default_string_length)),
        }
    }

    /// Validate and store the tenant's connection config.
    ///
    /// # Errors
    /// `Validation` for a malformed config, `Internal` if storage fails.
    pub async fn save_config(
        &self,
        ctx: &SecurityContext,
        request: ConfigRequest<'_>,
    ) -> Result<SavedConfig, DomainError> {
        let tenant_id = require_tenant(ctx)?;
        let config = match request {
            ConfigRequest::Body(body) => validate_config_request(body)?,
            ConfigRequest::Config(config) => {
                validate_config(config)?;
                config.clone()
            }
        };
        self.configs.store(tenant_id, &config).await?;
        info!(
            %tenant_id,
            driver = %config.driver,
            database = %config.database,
            "Tenant connection config saved"
        );
        Ok(config.to_saved())
    }

    /// Validate a table request and echo it back. No side effects.
    ///
    /// # Errors
    /// `ProtectedTable` or `Validation`.
    pub fn preview_migration(
        &self,
        request: TableRequest<'_>,
    ) -> Result<MigrationPreview, DomainError> {
        let ValidatedTable { spec, .. } = self.validate(request)?;
        Ok(MigrationPreview {
            message: "Migration preview generated.".to_owned(),
            table: spec.table,
            columns: spec.columns,
        })
    }

    /// Create the requested table in the tenant database.
    ///
    /// # Errors
    /// Rejections: `Unauthenticated`, `ProtectedTable`, `Validation`, `TableExists`.
    /// Failures: `ConfigMissing`, `ConfigCorrupt`, `Connection`, `Execution`.
    pub async fn run_migration(
        &self,
        ctx: &SecurityContext,
        request: TableRequest<'_>,
    ) -> Result<MigrationOutcome, DomainError> {
        let tenant_id = require_tenant(ctx)?;
        let mut run = Run::start(tenant_id, Operation::Migrate, request.table_hint());
        let result = self.migrate(&mut run, request).await;
        run.conclude(result)
    }

    /// Drop a table from the tenant database.
    ///
    /// # Errors
    /// Rejections: `Unauthenticated`, `ProtectedTable`, `Validation`, `TableNotFound`.
    /// Failures: `ConfigMissing`, `ConfigCorrupt`, `Connection`, `Execution`.
    pub async fn rollback_migration(
        &self,
        ctx: &SecurityContext,
        table: &str,
    ) -> Result<MigrationOutcome, DomainError> {
        let tenant_id = require_tenant(ctx)?;
        let mut run = Run::start(tenant_id, Operation::Rollback, table);
        let result = self.rollback(&mut run).await;
        run.conclude(result)
    }

    fn validate(&self, request: TableRequest<'_>) -> Result<ValidatedTable, DomainError> {
        match request {
            TableRequest::Body(body) => self.validator.validate_request(body),
            TableRequest::Spec(spec) => self.validator.validate_spec(spec),
        }
    }

    async fn migrate(
        &self,
        run: &mut Run,
        request: TableRequest<'_>,
    ) -> Result<MigrationOutcome, DomainError> {
        let ValidatedTable { spec, columns } = self.validate(request)?;
        run.table.clone_from(&spec.table);

        let config = self.configs.load(run.tenant_id).await?;
        run.enter(MigrationState::ConfigLoaded);

        let descriptor = ConnectionDescriptor::from_config(&config);
        let server = self.registry.connect_server(run.tenant_id, &descriptor).await?;
        run.enter(MigrationState::Connected);

        let handle = self.registry.bind_database(server, &descriptor).await?;
        run.enter(MigrationState::DatabaseEnsured);

        let blueprint = TableBlueprint::with_conventions(&spec.table, columns);
        let result = create_table(&handle, run, &blueprint).await;
        handle.close().await;
        result?;

        Ok(MigrationOutcome {
            message: "Table created successfully.".to_owned(),
            table: spec.table,
            status: MigrationStatus::Created,
        })
    }

    async fn rollback(&self, run: &mut Run) -> Result<MigrationOutcome, DomainError> {
        validate_table_name(&run.table)?;

        let config = self.configs.load(run.tenant_id).await?;
        run.enter(MigrationState::ConfigLoaded);

        let descriptor = ConnectionDescriptor::from_config(&config);
        let server = self.registry.connect_server(run.tenant_id, &descriptor).await?;
        run.enter(MigrationState::Connected);

        let Some(handle) = self.registry.attach_existing(server, &descriptor).await? else {
            return Err(DomainError::TableNotFound(run.table.clone()));
        };
        run.enter(MigrationState::DatabaseEnsured);

        let result = drop_table(&handle, run).await;
        handle.close().await;
        result?;

        Ok(MigrationOutcome {
            message: "Table rolled back (dropped) successfully.".to_owned(),
            table: run.table.clone(),
            status: MigrationStatus::Dropped,
        })
    }
}

async fn create_table(
    handle: &TenantConnectionHandle,
    run: &mut Run,
    blueprint: &TableBlueprint,
) -> Result<(), DomainError> {
    if handle.conn().has_table(&blueprint.name).await? {
        return Err(DomainError::TableExists(blueprint.name.clone()));
    }
    run.enter(MigrationState::SchemaChecked);

    handle.conn().create_table(blueprint).await?;
    Ok(())
}

async fn drop_table(handle: &TenantConnectionHandle, run: &mut Run) -> Result<(), DomainError> {
    if !handle.conn().has_table(&run.table).await? {
        return Err(DomainError::TableNotFound(run.table.clone()));
    }
    run.enter(MigrationState::SchemaChecked);

    handle.conn().drop_table(&run.table).await?;
    Ok(())
}

fn require_tenant(ctx: &SecurityContext) -> Result<Uuid, DomainError> {
    if ctx.is_anonymous() {
        Err(DomainError::Unauthenticated)
    } else {
        Ok(ctx.tenant_id())
    }
}
