//! DDL compiler: a registry of renderers keyed by DDL intent.
//!
//! The [`DdlCompiler`] maps each [`DdlKind`] to a render function. It starts
//! from the generic renderers every engine understands and dialects then
//! register their own overrides on top, once, when the orchestrator is built.
//! Rendering looks the renderer up by the element's kind.
//!
//! # Example
//!
//! ```rust,ignore
//! let dialect = Db2Dialect::new();
//! let compiler = DdlCompiler::for_dialect(&dialect);
//! let sql = compiler.render(&element, &dialect)?;
//! ```

use std::collections::HashMap;

use crate::error::{MigrateError, Result};

use super::ddl::{DdlElement, DdlKind};
use super::schema::{ConstraintKind, ServerDefault, TableRef};
use super::traits::Dialect;

/// Signature of a renderer: turn one DDL intent into SQL text.
pub type RenderFn = fn(&DdlElement, &dyn Dialect) -> Result<String>;

/// Registry of DDL renderers.
#[derive(Default, Clone)]
pub struct DdlCompiler {
    renderers: HashMap<DdlKind, RenderFn>,
}

impl DdlCompiler {
    /// Create an empty compiler with no renderers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler with the generic renderers registered.
    pub fn generic() -> Self {
        let mut compiler = Self::new();
        compiler.register(DdlKind::ColumnNullable, generic::visit_column_nullable);
        compiler.register(DdlKind::ColumnDefault, generic::visit_column_default);
        compiler.register(DdlKind::ColumnType, generic::visit_column_type);
        compiler.register(DdlKind::ColumnName, generic::visit_column_name);
        compiler.register(DdlKind::RenameTable, generic::visit_rename_table);
        compiler.register(DdlKind::AddColumn, generic::visit_add_column);
        compiler.register(DdlKind::DropConstraint, generic::visit_drop_constraint);
        compiler
    }

    /// Create a compiler with the generic renderers plus the dialect's overrides.
    pub fn for_dialect(dialect: &dyn Dialect) -> Self {
        let mut compiler = Self::generic();
        dialect.register_renderers(&mut compiler);
        compiler
    }

    /// Register a renderer for a kind, returning the one it replaces.
    pub fn register(&mut self, kind: DdlKind, render: RenderFn) -> Option<RenderFn> {
        self.renderers.insert(kind, render)
    }

    /// Get the renderer for a kind.
    pub fn get(&self, kind: DdlKind) -> Option<RenderFn> {
        self.renderers.get(&kind).copied()
    }

    /// Check if a renderer is registered for a kind.
    pub fn has(&self, kind: DdlKind) -> bool {
        self.renderers.contains_key(&kind)
    }

    /// Render an element with the renderer registered for its kind.
    pub fn render(&self, element: &DdlElement, dialect: &dyn Dialect) -> Result<String> {
        let render = self.get(element.kind()).ok_or_else(|| {
            MigrateError::Config(format!(
                "No renderer registered for {:?} in dialect {}",
                element.kind(),
                dialect.name()
            ))
        })?;
        render(element, dialect)
    }
}

impl std::fmt::Debug for DdlCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.renderers.keys().collect();
        kinds.sort_by_key(|k| DdlKind::ALL.iter().position(|a| a == *k));
        f.debug_struct("DdlCompiler").field("kinds", &kinds).finish()
    }
}

/// Error for a renderer handed an element of the wrong kind.
pub fn kind_mismatch(expected: DdlKind, element: &DdlElement) -> MigrateError {
    MigrateError::Config(format!(
        "Renderer for {:?} received a {:?} element",
        expected,
        element.kind()
    ))
}

/// `ALTER TABLE <table>` prefix.
pub fn alter_table(dialect: &dyn Dialect, table: &TableRef) -> Result<String> {
    Ok(format!("ALTER TABLE {}", dialect.format_table(table)?))
}

/// Generic renderers: the spelling a standard engine uses when no dialect
/// overrides a kind.
mod generic {
    use super::*;

    pub(super) fn visit_column_nullable(element: &DdlElement, dialect: &dyn Dialect) -> Result<String> {
        let DdlElement::ColumnNullable {
            table,
            column,
            nullable,
        } = element
        else {
            return Err(kind_mismatch(DdlKind::ColumnNullable, element));
        };
        Ok(format!(
            "{} ALTER COLUMN {} {}",
            alter_table(dialect, table)?,
            dialect.format_ident(column)?,
            if *nullable { "DROP NOT NULL" } else { "SET NOT NULL" }
        ))
    }

    pub(super) fn visit_column_default(element: &DdlElement, dialect: &dyn Dialect) -> Result<String> {
        let DdlElement::ColumnDefault {
            table,
            column,
            default,
        } = element
        else {
            return Err(kind_mismatch(DdlKind::ColumnDefault, element));
        };
        let action = match default {
            ServerDefault::Expression(expr) => format!("SET DEFAULT {}", expr),
            ServerDefault::Drop => "DROP DEFAULT".to_string(),
        };
        Ok(format!(
            "{} ALTER COLUMN {} {}",
            alter_table(dialect, table)?,
            dialect.format_ident(column)?,
            action
        ))
    }

    pub(super) fn visit_column_type(element: &DdlElement, dialect: &dyn Dialect) -> Result<String> {
        let DdlElement::ColumnType {
            table,
            column,
            column_type,
        } = element
        else {
            return Err(kind_mismatch(DdlKind::ColumnType, element));
        };
        Ok(format!(
            "{} ALTER COLUMN {} TYPE {}",
            alter_table(dialect, table)?,
            dialect.format_ident(column)?,
            dialect.format_type(column_type)
        ))
    }

    pub(super) fn visit_column_name(element: &DdlElement, dialect: &dyn Dialect) -> Result<String> {
        let DdlElement::ColumnName {
            table,
            column,
            new_name,
        } = element
        else {
            return Err(kind_mismatch(DdlKind::ColumnName, element));
        };
        Ok(format!(
            "{} RENAME {} TO {}",
            alter_table(dialect, table)?,
            dialect.format_ident(column)?,
            dialect.format_ident(new_name)?
        ))
    }

    pub(super) fn visit_rename_table(element: &DdlElement, dialect: &dyn Dialect) -> Result<String> {
        let DdlElement::RenameTable { table, new_name } = element else {
            return Err(kind_mismatch(DdlKind::RenameTable, element));
        };
        Ok(format!(
            "{} RENAME TO {}",
            alter_table(dialect, table)?,
            dialect.format_ident(new_name)?
        ))
    }

    pub(super) fn visit_add_column(element: &DdlElement, dialect: &dyn Dialect) -> Result<String> {
        let DdlElement::AddColumn { table, column } = element else {
            return Err(kind_mismatch(DdlKind::AddColumn, element));
        };
        let mut spec = format!(
            "{} {}",
            dialect.format_ident(&column.name)?,
            dialect.format_type(&column.column_type)
        );
        if let Some(ref default) = column.server_default {
            spec.push_str(&format!(" DEFAULT {}", default));
        }
        if !column.nullable {
            spec.push_str(" NOT NULL");
        }
        if column.primary_key {
            spec.push_str(" PRIMARY KEY");
        }
        Ok(format!("{} ADD COLUMN {}", alter_table(dialect, table)?, spec))
    }

    pub(super) fn visit_drop_constraint(element: &DdlElement, dialect: &dyn Dialect) -> Result<String> {
        let DdlElement::DropConstraint {
            constraint,
            as_index,
        } = element
        else {
            return Err(kind_mismatch(DdlKind::DropConstraint, element));
        };

        let named = || -> Result<String> {
            let name = constraint.name.as_deref().ok_or_else(|| {
                MigrateError::Config(format!(
                    "Cannot drop an unnamed {:?} constraint on {}",
                    constraint.kind, constraint.table
                ))
            })?;
            dialect.format_ident(name)
        };

        let table = alter_table(dialect, &constraint.table)?;
        let sql = match constraint.kind {
            ConstraintKind::PrimaryKey => format!("{} DROP PRIMARY KEY", table),
            ConstraintKind::ForeignKey => format!("{} DROP FOREIGN KEY {}", table, named()?),
            ConstraintKind::Unique if *as_index => match constraint.table.schema() {
                Some(schema) => format!("DROP INDEX {}.{}", dialect.format_ident(schema)?, named()?),
                None => format!("DROP INDEX {}", named()?),
            },
            ConstraintKind::Unique => format!("{} DROP UNIQUE {}", table, named()?),
            ConstraintKind::Check => format!("{} DROP CONSTRAINT {}", table, named()?),
        };
        Ok(sql)
    }
}
