//! Error types for the schema-migrator SDK.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One violated rule on one request field, e.g. `columns.1.name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Distinguishable outcome of every failed operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaMigratorError {
    /// Malformed request; every violation is listed.
    #[error("Validation failed with {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("Table '{0}' is protected")]
    Protected(String),

    #[error("Table '{0}' already exists")]
    Conflict(String),

    #[error("Table '{0}' does not exist")]
    NotFound(String),

    /// No usable stored connection config; call `save_config` first.
    #[error("Tenant connection config unavailable: {0}")]
    Config(String),

    /// Driver, network or storage failure. Not retried.
    #[error("Server error: {0}")]
    Server(String),

    #[error("Unauthenticated")]
    Unauthenticated,
}

impl SchemaMigratorError {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation::new(field, message)])
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    #[must_use]
    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Protected(_))
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    #[must_use]
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server(_))
    }

    /// Violations of a `Validation` error, empty otherwise.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Validation(v) => v,
            _ => &[],
        }
    }
}
