//! Renders a [`TableBlueprint`] into `sea-query` statements for one backend.
//!
//! Columns are emitted in blueprint order. Unique and plain indexes become
//! separate `CREATE INDEX` statements named `<table>_<column>_unique` and
//! `<table>_<column>_index`; foreign keys stay inline as
//! `<table>_<column>_foreign`. Column comments are inline on MySQL and
//! `COMMENT ON COLUMN` statements on PostgreSQL; SQLite has none.

use schema_migrator_sdk::{DbDriver, ReferentialAction};
use sea_orm::sea_query::{
    Alias, ColumnDef, Expr, ForeignKey, ForeignKeyAction, Index, IndexCreateStatement, Keyword,
    SimpleExpr, Table, TableCreateStatement,
};

use crate::domain::directive::{
    BaseType, ColumnBlueprint, ColumnDirective, DefaultValue, ForeignReference, TableBlueprint,
};

pub struct RenderedTable {
    pub table: TableCreateStatement,
    pub indexes: Vec<IndexCreateStatement>,
    /// Raw statements to run once the table exists.
    pub comments: Vec<String>,
}

#[must_use]
pub fn render_table(driver: DbDriver, blueprint: &TableBlueprint) -> RenderedTable {
    let mut table = Table::create();
    table.table(Alias::new(&blueprint.name));
    let mut indexes = Vec::new();
    let mut comments = Vec::new();

    for column in &blueprint.columns {
        let mut def = column_def(driver, column);
        table.col(&mut def);

        for directive in &column.directives {
            match directive {
                ColumnDirective::Unique => indexes.push(index(&blueprint.name, &column.name, true)),
                ColumnDirective::Index => indexes.push(index(&blueprint.name, &column.name, false)),
                ColumnDirective::Comment(text) if driver == DbDriver::Postgres => {
                    comments.push(format!(
                        "COMMENT ON COLUMN \"{}\".\"{}\" IS '{}'",
                        blueprint.name,
                        column.name,
                        escape_literal(driver, text)
                    ));
                }
                _ => {}
            }
        }

        if let Some(BaseType::ForeignId {
            reference: Some(reference),
        }) = column.base()
        {
            table.foreign_key(&mut foreign_key(&blueprint.name, &column.name, reference));
        }
    }

    RenderedTable {
        table,
        indexes,
        comments,
    }
}

fn column_def(driver: DbDriver, column: &ColumnBlueprint) -> ColumnDef {
    let mut def = ColumnDef::new(Alias::new(&column.name));
    let unsigned = driver.supports_unsigned() && column.has(&ColumnDirective::Unsigned);

    for directive in &column.directives {
        match directive {
            ColumnDirective::Base(base) => {
                apply_base(driver, &mut def, &column.name, base, unsigned);
            }
            ColumnDirective::Nullable(true) => {
                def.null();
            }
            ColumnDirective::Nullable(false) => {
                def.not_null();
            }
            ColumnDirective::Default(value) => {
                def.default(default_expr(value));
            }
            ColumnDirective::Comment(text) if driver == DbDriver::Mysql => {
                def.comment(text);
            }
            ColumnDirective::Primary => {
                def.primary_key();
            }
            // type modifier, table-level constraints, comments rendered separately
            ColumnDirective::Unsigned
            | ColumnDirective::Unique
            | ColumnDirective::Index
            | ColumnDirective::Comment(_) => {}
        }
    }
    def
}

fn apply_base(driver: DbDriver, def: &mut ColumnDef, name: &str, base: &BaseType, unsigned: bool) {
    match base {
        BaseType::Identity => {
            match driver {
                DbDriver::Mysql => def.big_unsigned(),
                DbDriver::Postgres => def.big_integer(),
                // only `INTEGER PRIMARY KEY` aliases the rowid
                DbDriver::Sqlite => def.integer(),
            };
            def.not_null().auto_increment().primary_key();
        }
        BaseType::String { length } => {
            def.string_len(*length);
        }
        BaseType::Text => {
            def.text();
        }
        BaseType::Integer if unsigned => {
            def.unsigned();
        }
        BaseType::Integer => {
            def.integer();
        }
        BaseType::Boolean => {
            def.boolean();
        }
        BaseType::Date => {
            def.date();
        }
        BaseType::DateTime => {
            def.date_time();
        }
        BaseType::Timestamp => {
            def.timestamp();
        }
        BaseType::Float => {
            def.float();
        }
        BaseType::Double => {
            def.double();
        }
        BaseType::ForeignId { .. } if driver == DbDriver::Mysql => {
            def.big_unsigned();
        }
        BaseType::ForeignId { .. } => {
            def.big_integer();
        }
        BaseType::Enum { values } if driver == DbDriver::Mysql => {
            // sea-query writes MySQL ENUM variants verbatim
            def.enumeration(
                Alias::new(name),
                values.iter().map(|v| Alias::new(escape_literal(driver, v))),
            );
        }
        BaseType::Enum { values } => {
            def.string()
                .check(Expr::col(Alias::new(name)).is_in(values.iter().cloned()));
        }
    }
}

/// Body of a single-quoted SQL literal. Only MySQL treats `\` as an escape.
fn escape_literal(driver: DbDriver, value: &str) -> String {
    let quoted = value.replace('\'', "''");
    if driver == DbDriver::Mysql {
        quoted.replace('\\', "\\\\")
    } else {
        quoted
    }
}

fn default_expr(value: &DefaultValue) -> SimpleExpr {
    match value {
        DefaultValue::Null => SimpleExpr::Keyword(Keyword::Null),
        DefaultValue::Bool(b) => (*b).into(),
        DefaultValue::Int(i) => (*i).into(),
        DefaultValue::Float(f) => (*f).into(),
        DefaultValue::Text(s) => s.clone().into(),
    }
}

fn index(table: &str, column: &str, unique: bool) -> IndexCreateStatement {
    let suffix = if unique { "unique" } else { "index" };
    let mut index = Index::create();
    index
        .name(format!("{table}_{column}_{suffix}"))
        .table(Alias::new(table))
        .col(Alias::new(column));
    if unique {
        index.unique();
    }
    index
}

fn foreign_key(
    table: &str,
    column: &str,
    reference: &ForeignReference,
) -> sea_orm::sea_query::ForeignKeyCreateStatement {
    let mut fk = ForeignKey::create();
    fk.name(format!("{table}_{column}_foreign"))
        .from(Alias::new(table), Alias::new(column))
        .to(Alias::new(&reference.table), Alias::new(&reference.column));
    if let Some(action) = reference.on_delete {
        fk.on_delete(fk_action(action));
    }
    if let Some(action) = reference.on_update {
        fk.on_update(fk_action(action));
    }
    fk
}

fn fk_action(action: ReferentialAction) -> ForeignKeyAction {
    match action {
        ReferentialAction::Cascade => ForeignKeyAction::Cascade,
        ReferentialAction::Restrict => ForeignKeyAction::Restrict,
        ReferentialAction::SetNull => ForeignKeyAction::SetNull,
        ReferentialAction::SetDefault => ForeignKeyAction::SetDefault,
        ReferentialAction::NoAction => ForeignKeyAction::NoAction,
    }
}
