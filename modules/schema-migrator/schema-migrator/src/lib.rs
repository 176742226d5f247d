//! Schema Migrator Module Implementation
//!
//! Tenants register where their database lives, then create or drop tables
//! from declarative specs. The public API is defined in `schema-migrator-sdk`
//! and re-exported here.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub use schema_migrator_sdk::{
    ColumnSpec, ColumnType, DbDriver, MigrationOutcome, MigrationPreview, MigrationStatus,
    SavedConfig, SchemaMigratorClientV1, SchemaMigratorError, TableSpec, TenantConnectionConfig,
};

pub mod module;
pub use module::SchemaMigratorModule;

pub mod config;
pub use config::SchemaMigratorConfig;

pub mod local_client;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
