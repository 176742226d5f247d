//! Column translation: one `ColumnSpec` in, one ordered directive list out.
//!
//! Order: base type, nullability, unsigned (integer types only), default,
//! comment, then unique/index/primary. Type-specific modifiers (`length`,
//! `values`, `constrained`, `onDelete`, `onUpdate`) are folded into the base
//! directive so constraints never precede the column they apply to.

use schema_migrator_sdk::{ColumnSpec, ColumnType, Constrained, ModifierSet};
use serde_json::Value;
use thiserror::Error;

use super::directive::{BaseType, ColumnBlueprint, ColumnDirective, DefaultValue, ForeignReference};
use super::ident::identifier_violation;

/// Column a `foreignId` reference points at.
const REFERENCED_COLUMN: &str = "id";

/// A column request that cannot be turned into directives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column '{column}': {modifier} {message}")]
pub struct InvalidColumnSpec {
    pub column: String,
    /// Offending modifier key, as written in the request.
    pub modifier: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnTranslator {
    default_string_length: u32,
}

impl Default for ColumnTranslator {
    fn default() -> Self {
        Self::new(255)
    }
}

impl ColumnTranslator {
    #[must_use]
    pub fn new(default_string_length: u32) -> Self {
        Self {
            default_string_length,
        }
    }

    /// Translate one column.
    ///
    /// # Errors
    /// Returns [`InvalidColumnSpec`] when `enum` has no values, `length` is zero,
    /// `default` is an array or object, or `constrained` names an invalid table.
    pub fn translate(&self, spec: &ColumnSpec) -> Result<ColumnBlueprint, InvalidColumnSpec> {
        let m = &spec.modifiers;
        let base = self.base_type(spec)?;
        let unsigned = m.unsigned && base.accepts_unsigned();

        let mut directives =
            vec![ColumnDirective::Base(base), ColumnDirective::Nullable(m.nullable)];
        if unsigned {
            directives.push(ColumnDirective::Unsigned);
        }
        if let Some(value) = &m.default {
            directives.push(ColumnDirective::Default(default_value(spec, value)?));
        }
        if let Some(comment) = &m.comment {
            directives.push(ColumnDirective::Comment(comment.clone()));
        }
        if m.unique {
            directives.push(ColumnDirective::Unique);
        }
        if m.index {
            directives.push(ColumnDirective::Index);
        }
        if m.primary {
            directives.push(ColumnDirective::Primary);
        }

        Ok(ColumnBlueprint {
            name: spec.name.clone(),
            directives,
        })
    }

    fn base_type(&self, spec: &ColumnSpec) -> Result<BaseType, InvalidColumnSpec> {
        let m = &spec.modifiers;
        Ok(match spec.column_type {
            ColumnType::String => BaseType::String {
                length: match m.length {
                    Some(0) => return Err(invalid(spec, "length", "must be at least 1")),
                    Some(n) => n,
                    None => self.default_string_length,
                },
            },
            ColumnType::Text => BaseType::Text,
            ColumnType::Integer => BaseType::Integer,
            ColumnType::Boolean => BaseType::Boolean,
            ColumnType::Date => BaseType::Date,
            ColumnType::DateTime => BaseType::DateTime,
            ColumnType::Float => BaseType::Float,
            ColumnType::Double => BaseType::Double,
            ColumnType::ForeignId => BaseType::ForeignId {
                reference: foreign_reference(spec)?,
            },
            ColumnType::Enum => BaseType::Enum {
                values: enum_values(spec)?,
            },
        })
    }
}

/// Target table for `constrained: true`: drop a trailing `_id`, then pluralize.
#[must_use]
pub fn infer_reference_table(column: &str) -> String {
    let stem = column.strip_suffix("_id").unwrap_or(column);
    pluralizer::pluralize(stem, 2, false)
}

fn foreign_reference(spec: &ColumnSpec) -> Result<Option<ForeignReference>, InvalidColumnSpec> {
    let ModifierSet {
        constrained,
        on_delete,
        on_update,
        ..
    } = &spec.modifiers;

    let table = match constrained {
        None | Some(Constrained::Flag(false)) => return Ok(None),
        Some(Constrained::Flag(true)) => infer_reference_table(&spec.name),
        Some(Constrained::Table(table)) if table.is_empty() => return Ok(None),
        Some(Constrained::Table(table)) => {
            if let Some(msg) = identifier_violation(table) {
                return Err(invalid(spec, "constrained", msg));
            }
            table.clone()
        }
    };

    Ok(Some(ForeignReference {
        table,
        column: REFERENCED_COLUMN.to_owned(),
        on_delete: *on_delete,
        on_update: *on_update,
    }))
}

fn enum_values(spec: &ColumnSpec) -> Result<Vec<String>, InvalidColumnSpec> {
    let values = match &spec.modifiers.values {
        Some(values) if !values.is_empty() => values,
        _ => {
            return Err(invalid(
                spec,
                "values",
                "is required for enum columns and must list at least one value",
            ));
        }
    };
    for (i, value) in values.iter().enumerate() {
        if value.chars().any(|c| c == '\'' || c == '\\' || c.is_control()) {
            return Err(invalid(
                spec,
                "values",
                format!("entry {i} must not contain quotes, backslashes or control characters"),
            ));
        }
        if values[..i].contains(value) {
            return Err(invalid(spec, "values", format!("contains '{value}' more than once")));
        }
    }
    Ok(values.clone())
}

fn default_value(spec: &ColumnSpec, value: &Value) -> Result<DefaultValue, InvalidColumnSpec> {
    match value {
        Value::Null => Ok(DefaultValue::Null),
        Value::Bool(b) => Ok(DefaultValue::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(DefaultValue::Int)
            .or_else(|| n.as_f64().map(DefaultValue::Float))
            .ok_or_else(|| invalid(spec, "default", "is not a representable number")),
        Value::String(s) => Ok(DefaultValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(invalid(
            spec,
            "default",
            "must be a string, number, boolean or null",
        )),
    }
}

fn invalid(
    spec: &ColumnSpec,
    modifier: &'static str,
    message: impl Into<String>,
) -> InvalidColumnSpec {
    InvalidColumnSpec {
        column: spec.name.clone(),
        modifier,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_migrator_sdk::ReferentialAction;
    use serde_json::json;

    fn column(value: Value) -> ColumnSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn base_directive_comes_first_and_constraints_last() {
        let spec = column(json!({
            "name": "code",
            "type": "string",
            "modifiers": {
                "primary": true, "index": true, "unique": true,
                "comment": "sku", "default": "x", "nullable": true, "length": 32
            }
        }));
        let bp = ColumnTranslator::default().translate(&spec).unwrap();
        assert_eq!(
            bp.directives,
            vec![
                ColumnDirective::Base(BaseType::String { length: 32 }),
                ColumnDirective::Nullable(true),
                ColumnDirective::Default(DefaultValue::Text("x".to_owned())),
                ColumnDirective::Comment("sku".to_owned()),
                ColumnDirective::Unique,
                ColumnDirective::Index,
                ColumnDirective::Primary,
            ]
        );
    }

    #[test]
    fn every_type_yields_base_then_constraints() {
        for t in ColumnType::ALL {
            let mut spec = ColumnSpec::new("c", t);
            spec.modifiers.values = Some(vec!["a".to_owned()]);
            spec.modifiers.unique = true;
            let bp = ColumnTranslator::default().translate(&spec).unwrap();
            assert!(matches!(bp.directives[0], ColumnDirective::Base(_)), "{t}");
            let first_constraint =
                bp.directives.iter().position(ColumnDirective::is_constraint).unwrap();
            assert!(first_constraint > 0);
            assert!(bp.directives[first_constraint..].iter().all(ColumnDirective::is_constraint));
        }
    }

    #[test]
    fn string_without_length_uses_configured_default() {
        let bp = ColumnTranslator::new(191)
            .translate(&ColumnSpec::new("title", ColumnType::String))
            .unwrap();
        assert_eq!(bp.base(), Some(&BaseType::String { length: 191 }));
        assert!(!bp.is_nullable());
    }

    #[test]
    fn zero_length_is_rejected() {
        let spec = column(json!({"name": "t", "type": "string", "modifiers": {"length": 0}}));
        let err = ColumnTranslator::default().translate(&spec).unwrap_err();
        assert_eq!(err.modifier, "length");
    }

    #[test]
    fn unsigned_is_a_noop_on_non_integer_types() {
        let spec =
            column(json!({"name": "ratio", "type": "double", "modifiers": {"unsigned": true}}));
        let bp = ColumnTranslator::default().translate(&spec).unwrap();
        assert!(!bp.has(&ColumnDirective::Unsigned));

        let spec =
            column(json!({"name": "qty", "type": "integer", "modifiers": {"unsigned": true}}));
        let bp = ColumnTranslator::default().translate(&spec).unwrap();
        assert_eq!(bp.directives[2], ColumnDirective::Unsigned);
    }

    #[test]
    fn enum_requires_values() {
        let spec = column(json!({"name": "status", "type": "enum", "modifiers": {}}));
        let err = ColumnTranslator::default().translate(&spec).unwrap_err();
        assert_eq!(err.modifier, "values");
        assert_eq!(err.column, "status");

        let spec = column(json!({"name": "status", "type": "enum", "modifiers": {"values": []}}));
        assert!(ColumnTranslator::default().translate(&spec).is_err());

        let spec =
            column(json!({"name": "status", "type": "enum", "modifiers": {"values": ["a", "a"]}}));
        assert!(ColumnTranslator::default().translate(&spec).is_err());

        let spec =
            column(json!({"name": "status", "type": "enum", "modifiers": {"values": ["a", "b"]}}));
        let bp = ColumnTranslator::default().translate(&spec).unwrap();
        assert_eq!(
            bp.base(),
            Some(&BaseType::Enum { values: vec!["a".to_owned(), "b".to_owned()] })
        );
    }

    #[test]
    fn enum_values_cannot_break_out_of_the_literal() {
        for raw in ["a'), `evil` INT, `z` ENUM('b", "it's", "back\\slash", "line\nbreak"] {
            let spec = ColumnSpec::new("status", ColumnType::Enum).with_modifiers(ModifierSet {
                values: Some(vec!["ok".to_owned(), raw.to_owned()]),
                ..ModifierSet::default()
            });
            let err = ColumnTranslator::default().translate(&spec).unwrap_err();
            assert_eq!(err.modifier, "values", "{raw}");
            assert!(err.message.contains("entry 1"), "{}", err.message);
        }
    }

    #[test]
    fn reference_table_is_inferred_from_column_name() {
        assert_eq!(infer_reference_table("author_id"), "authors");
        assert_eq!(infer_reference_table("category_id"), "categories");
        assert_eq!(infer_reference_table("owner"), "owners");
    }

    #[test]
    fn constrained_true_builds_reference_with_actions() {
        let spec = column(json!({
            "name": "author_id",
            "type": "foreignId",
            "modifiers": {"constrained": true, "onDelete": "cascade", "onUpdate": "restrict"}
        }));
        let bp = ColumnTranslator::default().translate(&spec).unwrap();
        assert_eq!(
            bp.base(),
            Some(&BaseType::ForeignId {
                reference: Some(ForeignReference {
                    table: "authors".to_owned(),
                    column: "id".to_owned(),
                    on_delete: Some(ReferentialAction::Cascade),
                    on_update: Some(ReferentialAction::Restrict),
                })
            })
        );
    }

    #[test]
    fn constrained_table_name_is_used_verbatim() {
        let spec = column(json!({
            "name": "writer_id",
            "type": "foreignId",
            "modifiers": {"constrained": "people"}
        }));
        let bp = ColumnTranslator::default().translate(&spec).unwrap();
        let Some(BaseType::ForeignId { reference: Some(r) }) = bp.base() else {
            panic!("expected reference");
        };
        assert_eq!(r.table, "people");
        assert!(r.on_delete.is_none());
    }

    #[test]
    fn actions_without_constrained_are_ignored() {
        let spec = column(json!({
            "name": "author_id",
            "type": "foreignId",
            "modifiers": {"onDelete": "cascade"}
        }));
        let bp = ColumnTranslator::default().translate(&spec).unwrap();
        assert_eq!(bp.base(), Some(&BaseType::ForeignId { reference: None }));

        let spec = column(json!({
            "name": "author_id",
            "type": "foreignId",
            "modifiers": {"constrained": ""}
        }));
        let bp = ColumnTranslator::default().translate(&spec).unwrap();
        assert_eq!(bp.base(), Some(&BaseType::ForeignId { reference: None }));
    }

    #[test]
    fn constrained_table_must_be_an_identifier() {
        let spec = column(json!({
            "name": "author_id",
            "type": "foreignId",
            "modifiers": {"constrained": "authors; drop table x"}
        }));
        let err = ColumnTranslator::default().translate(&spec).unwrap_err();
        assert_eq!(err.modifier, "constrained");
    }

    #[test]
    fn defaults_accept_scalars_and_null_only() {
        let t = ColumnTranslator::default();
        let spec = column(json!({"name": "n", "type": "integer", "modifiers": {"default": 7}}));
        assert!(t.translate(&spec).unwrap().has(&ColumnDirective::Default(DefaultValue::Int(7))));

        let spec = column(json!({
            "name": "n", "type": "string", "modifiers": {"default": null, "nullable": true}
        }));
        assert!(t.translate(&spec).unwrap().has(&ColumnDirective::Default(DefaultValue::Null)));

        let spec = column(json!({"name": "b", "type": "boolean", "modifiers": {"default": false}}));
        let bp = t.translate(&spec).unwrap();
        assert!(bp.has(&ColumnDirective::Default(DefaultValue::Bool(false))));

        let spec =
            column(json!({"name": "n", "type": "string", "modifiers": {"default": {"a": 1}}}));
        assert_eq!(t.translate(&spec).unwrap_err().modifier, "default");

        let spec = column(json!({"name": "n", "type": "string", "modifiers": {"default": [1]}}));
        assert!(t.translate(&spec).is_err());
    }
}
