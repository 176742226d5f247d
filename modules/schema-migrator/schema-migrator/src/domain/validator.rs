//! Request validation for table specs and tenant connection configs.
//!
//! Validation never stops at the first problem: every violated rule is reported
//! with a dotted field path (`columns.1.type`). The one exception is a protected
//! table name, which is rejected outright regardless of anything else.

use std::collections::HashSet;

use schema_migrator_sdk::{
    ColumnSpec, ColumnType, DbDriver, FieldViolation, ModifierSet, PROTECTED_TABLES, TableSpec,
    TenantConnectionConfig,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tenant_security::SecretString;

use super::directive::{ColumnBlueprint, IDENTITY_COLUMN, TIMESTAMP_COLUMNS};
use super::error::DomainError;
use super::ident::identifier_violation;
use super::translator::ColumnTranslator;

/// A table request that passed validation, with its translated columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTable {
    pub spec: TableSpec,
    pub columns: Vec<ColumnBlueprint>,
}

#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    fn finish(self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.0))
        }
    }

    /// `value` is only absent when a violation explains why.
    fn conclude<T>(self, value: Option<T>) -> Result<T, DomainError> {
        self.finish()?;
        value.ok_or_else(|| DomainError::Internal("validation produced no value".to_owned()))
    }
}

#[must_use]
pub fn is_protected_table(table: &str) -> bool {
    PROTECTED_TABLES.iter().any(|p| p.eq_ignore_ascii_case(table))
}

fn reject_protected(table: &str) -> Result<(), DomainError> {
    if is_protected_table(table) {
        Err(DomainError::ProtectedTable(table.to_owned()))
    } else {
        Ok(())
    }
}

/// Checks a bare table name, as given to rollback.
///
/// # Errors
/// `ProtectedTable` for reserved names, `Validation` for malformed ones.
pub fn validate_table_name(table: &str) -> Result<(), DomainError> {
    reject_protected(table)?;
    let mut v = Violations::default();
    if let Some(msg) = identifier_violation(table) {
        v.push("table", msg);
    }
    v.finish()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableSpecValidator {
    translator: ColumnTranslator,
}

impl TableSpecValidator {
    #[must_use]
    pub fn new(translator: ColumnTranslator) -> Self {
        Self { translator }
    }

    /// Validate an untyped request body (`{"table": ..., "columns": [...]}`).
    ///
    /// # Errors
    /// `ProtectedTable` when the table is reserved; otherwise `Validation` listing
    /// every structural and semantic violation.
    pub fn validate_request(&self, body: &Value) -> Result<ValidatedTable, DomainError> {
        let Some(obj) = body.as_object() else {
            return Err(DomainError::validation("body", "must be a JSON object"));
        };
        let mut v = Violations::default();

        let table = match obj.get("table") {
            None | Some(Value::Null) => {
                v.push("table", "is required");
                None
            }
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => {
                v.push("table", "must be a string");
                None
            }
        };
        if let Some(table) = table {
            reject_protected(table)?;
            if let Some(msg) = identifier_violation(table) {
                v.push("table", msg);
            }
        }

        let mut parsed = Vec::new();
        let mut columns = Vec::new();
        let mut seen = HashSet::new();
        match obj.get("columns") {
            None | Some(Value::Null) => v.push("columns", "is required"),
            Some(Value::Array(items)) if items.is_empty() => {
                v.push("columns", "must contain at least one column");
            }
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if let Some(col) = parse_column(i, item, &mut v) {
                        columns.extend(self.check_column(i, &col, &mut seen, &mut v));
                        parsed.push(col);
                    }
                }
            }
            Some(_) => v.push("columns", "must be an array"),
        }

        let spec = table.map(|t| TableSpec {
            table: t.to_owned(),
            columns: parsed,
        });
        let spec = v.conclude(spec)?;
        Ok(ValidatedTable { spec, columns })
    }

    /// Validate an already-typed table spec.
    ///
    /// # Errors
    /// Same outcomes as [`Self::validate_request`].
    pub fn validate_spec(&self, spec: &TableSpec) -> Result<ValidatedTable, DomainError> {
        reject_protected(&spec.table)?;
        let mut v = Violations::default();
        if let Some(msg) = identifier_violation(&spec.table) {
            v.push("table", msg);
        }
        if spec.columns.is_empty() {
            v.push("columns", "must contain at least one column");
        }
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(spec.columns.len());
        for (i, col) in spec.columns.iter().enumerate() {
            columns.extend(self.check_column(i, col, &mut seen, &mut v));
        }
        v.finish()?;
        Ok(ValidatedTable {
            spec: spec.clone(),
            columns,
        })
    }

    fn check_column(
        &self,
        i: usize,
        col: &ColumnSpec,
        seen: &mut HashSet<String>,
        v: &mut Violations,
    ) -> Option<ColumnBlueprint> {
        let name = col.name.as_str();
        if let Some(msg) = identifier_violation(name) {
            v.push(format!("columns.{i}.name"), msg);
        } else if name == IDENTITY_COLUMN || TIMESTAMP_COLUMNS.contains(&name) {
            v.push(
                format!("columns.{i}.name"),
                format!("'{name}' is added to every table and cannot be declared"),
            );
        } else if !seen.insert(name.to_ascii_lowercase()) {
            v.push(
                format!("columns.{i}.name"),
                format!("'{name}' is declared more than once"),
            );
        }

        if col.modifiers.primary {
            v.push(
                format!("columns.{i}.modifiers.primary"),
                format!("is not allowed: '{IDENTITY_COLUMN}' is the primary key"),
            );
        }

        match self.translator.translate(col) {
            Ok(bp) => Some(bp),
            Err(e) => {
                v.push(format!("columns.{i}.modifiers.{}", e.modifier), e.message);
                None
            }
        }
    }
}

fn parse_column(i: usize, item: &Value, v: &mut Violations) -> Option<ColumnSpec> {
    let Some(obj) = item.as_object() else {
        v.push(format!("columns.{i}"), "must be an object");
        return None;
    };

    let name = match obj.get("name") {
        None | Some(Value::Null) => {
            v.push(format!("columns.{i}.name"), "is required");
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            v.push(format!("columns.{i}.name"), "must be a string");
            None
        }
    };

    let column_type = match obj.get("type") {
        None | Some(Value::Null) => {
            v.push(format!("columns.{i}.type"), "is required");
            None
        }
        Some(Value::String(s)) => match s.parse::<ColumnType>() {
            Ok(t) => Some(t),
            Err(msg) => {
                v.push(format!("columns.{i}.type"), msg);
                None
            }
        },
        Some(_) => {
            v.push(format!("columns.{i}.type"), "must be a string");
            None
        }
    };

    let modifiers = match obj.get("modifiers") {
        None | Some(Value::Null) => Some(ModifierSet::default()),
        Some(m @ Value::Object(_)) => match ModifierSet::deserialize(m) {
            Ok(m) => Some(m),
            Err(e) => {
                v.push(format!("columns.{i}.modifiers"), e.to_string());
                None
            }
        },
        Some(_) => {
            v.push(format!("columns.{i}.modifiers"), "must be an object");
            None
        }
    };

    Some(ColumnSpec {
        name: name?,
        column_type: column_type?,
        modifiers: modifiers?,
    })
}

/// Validate an untyped connection config body.
///
/// # Errors
/// `Validation` listing every violation.
pub fn validate_config_request(body: &Value) -> Result<TenantConnectionConfig, DomainError> {
    let Some(obj) = body.as_object() else {
        return Err(DomainError::validation("body", "must be a JSON object"));
    };
    let mut v = Violations::default();

    let driver = match obj.get("driver") {
        None | Some(Value::Null) => {
            v.push("driver", "is required");
            None
        }
        Some(Value::String(s)) => match s.parse::<DbDriver>() {
            Ok(d) => Some(d),
            Err(msg) => {
                v.push("driver", msg);
                None
            }
        },
        Some(_) => {
            v.push("driver", "must be a string");
            None
        }
    };
    let host = optional_string(obj, "host", &mut v);
    let port = match obj.get("port") {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<u16>().ok(),
        Some(_) => None,
    };
    if port.is_none() {
        v.push("port", "must be an integer between 0 and 65535");
    }
    if let (Some(driver), Some(host), Some(port)) = (driver, host.as_deref(), port) {
        check_endpoint(driver, host, port, &mut v);
    }
    let database = required_string(obj, "database", &mut v);
    if let Some(database) = &database {
        check_database(database, &mut v);
    }
    let username = required_string(obj, "username", &mut v);
    let password = match obj.get("password") {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(SecretString::new(s.as_str()))),
        Some(_) => {
            v.push("password", "must be a string");
            None
        }
    };

    let config = match (driver, host, port, database, username, password) {
        (Some(driver), Some(host), Some(port), Some(database), Some(username), Some(password)) => {
            Some(TenantConnectionConfig {
                driver,
                host,
                port,
                database,
                username,
                password,
            })
        }
        _ => None,
    };
    v.conclude(config)
}

/// Semantic checks on a typed connection config.
///
/// # Errors
/// `Validation` listing every violation.
pub fn validate_config(config: &TenantConnectionConfig) -> Result<(), DomainError> {
    let mut v = Violations::default();
    check_config(config, &mut v);
    v.finish()
}

fn check_config(config: &TenantConnectionConfig, v: &mut Violations) {
    check_endpoint(config.driver, &config.host, config.port, v);
    check_database(&config.database, v);
    if config.username.trim().is_empty() {
        v.push("username", "is required");
    }
}

/// Host and port only matter for server backends.
fn check_endpoint(driver: DbDriver, host: &str, port: u16, v: &mut Violations) {
    if driver.is_server() {
        if host.trim().is_empty() {
            v.push("host", format!("is required for {driver}"));
        }
        if port == 0 {
            v.push("port", format!("must be between 1 and 65535 for {driver}"));
        }
    }
}

/// The name ends up in `CREATE DATABASE` and in SQLite file names.
fn check_database(database: &str, v: &mut Violations) {
    if let Some(msg) = identifier_violation(database) {
        v.push("database", msg);
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str, v: &mut Violations) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            v.push(key, "must be a string");
            None
        }
    }
}

fn required_string(obj: &Map<String, Value>, key: &str, v: &mut Violations) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        None | Some(Value::Null | Value::String(_)) => {
            v.push(key, "is required");
            None
        }
        Some(_) => {
            v.push(key, "must be a string");
            None
        }
    }
}
