//! Schema Migrator SDK
//!
//! Public contract of the schema-migrator module:
//! - `SchemaMigratorClientV1` trait for in-process callers
//! - Model types (`TenantConnectionConfig`, `TableSpec`, `ColumnSpec`, `ModifierSet`)
//! - Error type (`SchemaMigratorError`)
//!
//! ```ignore
//! let client: Arc<dyn SchemaMigratorClientV1> = module.client();
//! client.save_config(&ctx, config).await?;
//! let outcome = client.run_migration(&ctx, spec).await?;
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod errors;
pub mod models;

pub use api::SchemaMigratorClientV1;
pub use errors::{FieldViolation, SchemaMigratorError};
pub use models::{
    ColumnSpec, ColumnType, Constrained, DbDriver, MigrationOutcome, MigrationPreview,
    MigrationStatus, ModifierSet, PROTECTED_TABLES, ReferentialAction, SavedConfig, TableSpec,
    TenantConnectionConfig,
};
pub use tenant_security::{SecretString, SecurityContext};
