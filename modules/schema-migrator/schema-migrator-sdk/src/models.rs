use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tenant_security::SecretString;

/// Table names reserved for the application's own use.
pub const PROTECTED_TABLES: [&str; 3] = ["users", "migrations", "password_resets"];

/// Relational backend of a tenant database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbDriver {
    Mysql,
    #[serde(alias = "pgsql", alias = "postgresql")]
    Postgres,
    Sqlite,
}

impl DbDriver {
    pub const ALL: [Self; 3] = [Self::Mysql, Self::Postgres, Self::Sqlite];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Whether the backend has a network endpoint (host and port are meaningful).
    #[must_use]
    pub fn is_server(self) -> bool {
        !matches!(self, Self::Sqlite)
    }

    /// Whether integer columns can carry an UNSIGNED attribute.
    #[must_use]
    pub fn supports_unsigned(self) -> bool {
        matches!(self, Self::Mysql)
    }
}

impl fmt::Display for DbDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbDriver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(Self::Mysql),
            "postgres" | "pgsql" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!(
                "unsupported driver '{other}', expected one of mysql, postgres, sqlite"
            )),
        }
    }
}

/// Where a tenant's tables live. Persisted sealed; loaded once per operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConnectionConfig {
    pub driver: DbDriver,
    /// Ignored for `sqlite`.
    #[serde(default)]
    pub host: String,
    /// Ignored for `sqlite`.
    #[serde(default)]
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<SecretString>,
}

impl TenantConnectionConfig {
    /// The config as echoed back to clients: everything but the password.
    #[must_use]
    pub fn to_saved(&self) -> SavedConfig {
        SavedConfig {
            driver: self.driver,
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            username: self.username.clone(),
            has_password: self.password.as_ref().is_some_and(|p| !p.is_empty()),
        }
    }
}

/// Password-free view of a stored tenant config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedConfig {
    pub driver: DbDriver,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub has_password: bool,
}

/// Column types accepted in a table request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "foreignId")]
    ForeignId,
    #[serde(rename = "enum")]
    Enum,
}

impl ColumnType {
    pub const ALL: [Self; 10] = [
        Self::String,
        Self::Text,
        Self::Integer,
        Self::Boolean,
        Self::Date,
        Self::DateTime,
        Self::Float,
        Self::Double,
        Self::ForeignId,
        Self::Enum,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Float => "float",
            Self::Double => "double",
            Self::ForeignId => "foreignId",
            Self::Enum => "enum",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let supported: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                format!(
                    "unsupported type '{s}', expected one of {}",
                    supported.join(", ")
                )
            })
    }
}

/// Referential action attached to a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    #[serde(rename = "set null", alias = "set_null", alias = "setNull")]
    SetNull,
    #[serde(rename = "set default", alias = "set_default", alias = "setDefault")]
    SetDefault,
    #[serde(rename = "no action", alias = "no_action", alias = "noAction")]
    NoAction,
}

/// Target of a `foreignId` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constrained {
    /// `true` infers the table from the column name (`author_id` -> `authors`).
    Flag(bool),
    Table(String),
}

/// Column modifiers. Unknown keys are ignored so newer clients keep working.
#[allow(clippy::struct_excessive_bools)] // each flag is an independent client-facing modifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierSet {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub index: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unsigned: bool,
    /// `Some(Value::Null)` means an explicit `DEFAULT NULL`; `None` means no default.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// `string` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// `enum` only, in declaration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    /// `foreignId` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constrained: Option<Constrained>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
}

/// Keeps an explicit JSON `null` distinguishable from an absent key.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub modifiers: ModifierSet,
}

impl ColumnSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            modifiers: ModifierSet::default(),
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: ModifierSet) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// A create-table request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub table: String,
    pub columns: Vec<ColumnSpec>,
}

/// Result of a dry-run: the normalized request echoed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPreview {
    pub message: String,
    pub table: String,
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    Created,
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOutcome {
    pub message: String,
    pub table: String,
    pub status: MigrationStatus,
}
