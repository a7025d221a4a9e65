//! Generic DDL intents and the statements the orchestrator executes.
//!
//! A [`DdlElement`] describes *what* should change ("change this column's
//! type"); the [`DdlCompiler`](super::compiler::DdlCompiler) decides *how* it
//! is spelled for the target database. Statements the orchestrator builds
//! itself (primary key rebuilds, identity drops, reorg commands) are plain
//! text.

use super::schema::{ColumnSpec, ColumnType, Constraint, ServerDefault, TableRef};

/// Tag identifying the kind of a DDL intent, used to look up its renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DdlKind {
    ColumnNullable,
    ColumnDefault,
    ColumnType,
    ColumnName,
    RenameTable,
    AddColumn,
    DropConstraint,
}

impl DdlKind {
    /// All kinds, in declaration order.
    pub const ALL: [DdlKind; 7] = [
        DdlKind::ColumnNullable,
        DdlKind::ColumnDefault,
        DdlKind::ColumnType,
        DdlKind::ColumnName,
        DdlKind::RenameTable,
        DdlKind::AddColumn,
        DdlKind::DropConstraint,
    ];
}

/// A database-agnostic DDL intent.
#[derive(Debug, Clone, PartialEq)]
pub enum DdlElement {
    /// `SET NOT NULL` / `DROP NOT NULL` on a column.
    ColumnNullable {
        table: TableRef,
        column: String,
        nullable: bool,
    },
    /// Set or drop a column's server default.
    ColumnDefault {
        table: TableRef,
        column: String,
        default: ServerDefault,
    },
    /// Change a column's data type.
    ColumnType {
        table: TableRef,
        column: String,
        column_type: ColumnType,
    },
    /// Rename a column.
    ColumnName {
        table: TableRef,
        column: String,
        new_name: String,
    },
    /// Rename a table within its schema.
    RenameTable { table: TableRef, new_name: String },
    /// Add a column.
    AddColumn { table: TableRef, column: ColumnSpec },
    /// Drop a constraint; `as_index` drops the unique index that stands in
    /// for a unique constraint over nullable columns.
    DropConstraint {
        constraint: Constraint,
        as_index: bool,
    },
}

impl DdlElement {
    /// Kind tag of this element.
    pub fn kind(&self) -> DdlKind {
        match self {
            DdlElement::ColumnNullable { .. } => DdlKind::ColumnNullable,
            DdlElement::ColumnDefault { .. } => DdlKind::ColumnDefault,
            DdlElement::ColumnType { .. } => DdlKind::ColumnType,
            DdlElement::ColumnName { .. } => DdlKind::ColumnName,
            DdlElement::RenameTable { .. } => DdlKind::RenameTable,
            DdlElement::AddColumn { .. } => DdlKind::AddColumn,
            DdlElement::DropConstraint { .. } => DdlKind::DropConstraint,
        }
    }
}

/// Anything the orchestrator can execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A DDL intent rendered by the compiler.
    Ddl(DdlElement),
    /// Literal SQL text.
    Text(String),
}

impl From<DdlElement> for Statement {
    fn from(element: DdlElement) -> Self {
        Statement::Ddl(element)
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::Text(sql)
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::Text(sql.to_string())
    }
}
