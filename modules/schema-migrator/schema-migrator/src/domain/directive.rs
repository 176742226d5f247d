//! Column directives: the engine-neutral result of translating a column request.
//!
//! A [`ColumnBlueprint`] always starts with exactly one [`ColumnDirective::Base`]
//! followed by modifier directives in a fixed order. Drivers render the list
//! without re-deciding anything a request already determined.

use schema_migrator_sdk::ReferentialAction;

/// Column type with every type-specific argument already resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseType {
    /// Auto-incrementing big-integer primary key.
    Identity,
    String { length: u32 },
    Text,
    Integer,
    Boolean,
    Date,
    DateTime,
    /// Engine timestamp, used for `created_at`/`updated_at`.
    Timestamp,
    Float,
    Double,
    /// Unsigned big integer, optionally referencing another table's `id`.
    ForeignId { reference: Option<ForeignReference> },
    Enum { values: Vec<String> },
}

impl BaseType {
    /// Integer-backed types that accept an UNSIGNED attribute.
    #[must_use]
    pub fn accepts_unsigned(&self) -> bool {
        matches!(self, Self::Integer | Self::ForeignId { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignReference {
    pub table: String,
    pub column: String,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

/// Literal column default.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// One atomic column-construction or constraint instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDirective {
    Base(BaseType),
    Nullable(bool),
    Unsigned,
    Default(DefaultValue),
    Comment(String),
    Unique,
    Index,
    Primary,
}

impl ColumnDirective {
    /// Constraints reference an existing column and come after everything else.
    #[must_use]
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Unique | Self::Index | Self::Primary)
    }
}

/// Ordered directives for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBlueprint {
    pub name: String,
    pub directives: Vec<ColumnDirective>,
}

impl ColumnBlueprint {
    /// `id`: identity primary key.
    #[must_use]
    pub fn identity(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            directives: vec![ColumnDirective::Base(BaseType::Identity)],
        }
    }

    /// Nullable timestamp.
    #[must_use]
    pub fn timestamp(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            directives: vec![
                ColumnDirective::Base(BaseType::Timestamp),
                ColumnDirective::Nullable(true),
            ],
        }
    }

    #[must_use]
    pub fn base(&self) -> Option<&BaseType> {
        self.directives.iter().find_map(|d| match d {
            ColumnDirective::Base(base) => Some(base),
            _ => None,
        })
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.directives
            .iter()
            .any(|d| matches!(d, ColumnDirective::Nullable(true)))
    }

    #[must_use]
    pub fn has(&self, directive: &ColumnDirective) -> bool {
        self.directives.contains(directive)
    }
}

/// Identity column every created table starts with.
pub const IDENTITY_COLUMN: &str = "id";
/// Timestamp columns every created table ends with, in order.
pub const TIMESTAMP_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

/// Full column layout of a table to create.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlueprint {
    pub name: String,
    pub columns: Vec<ColumnBlueprint>,
}

impl TableBlueprint {
    /// Identity first, declared columns in request order, timestamps last.
    #[must_use]
    pub fn with_conventions(name: &str, declared: Vec<ColumnBlueprint>) -> Self {
        let mut columns = Vec::with_capacity(declared.len() + 3);
        columns.push(ColumnBlueprint::identity(IDENTITY_COLUMN));
        columns.extend(declared);
        columns.extend(TIMESTAMP_COLUMNS.into_iter().map(ColumnBlueprint::timestamp));
        Self {
            name: name.to_owned(),
            columns,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventions_wrap_declared_columns() {
        let title = ColumnBlueprint {
            name: "title".to_owned(),
            directives: vec![
                ColumnDirective::Base(BaseType::String { length: 100 }),
                ColumnDirective::Nullable(false),
            ],
        };
        let table = TableBlueprint::with_conventions("widgets", vec![title]);
        assert_eq!(
            table.column_names(),
            ["id", "title", "created_at", "updated_at"]
        );
        assert_eq!(table.columns[0].base(), Some(&BaseType::Identity));
        assert!(table.columns[3].is_nullable());
        assert!(!table.columns[1].is_nullable());
    }

    #[test]
    fn only_integer_types_accept_unsigned() {
        assert!(BaseType::Integer.accepts_unsigned());
        assert!(BaseType::ForeignId { reference: None }.accepts_unsigned());
        assert!(!BaseType::Double.accepts_unsigned());
        assert!(!BaseType::String { length: 10 }.accepts_unsigned());
    }
}
