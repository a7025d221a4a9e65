//! Operations a migration plan can contain.

use serde::{Deserialize, Serialize};

use crate::core::identifier::validate_identifier;
use crate::core::schema::{ColumnSpec, Constraint, ConstraintKind, TableRef};
use crate::error::{MigrateError, Result};
use crate::orchestrator::{AlterColumn, Orchestrator};

/// One schema change, tagged by `op` in the plan file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Alter one column.
    AlterColumn(AlterColumn),

    /// Add a column to a table.
    AddColumn { table: TableRef, column: ColumnSpec },

    /// Drop a constraint.
    DropConstraint(Constraint),

    /// Rename a table within its schema.
    RenameTable { table: TableRef, new_name: String },

    /// Run a SQL statement as-is (still followed by a reorg sweep).
    Execute { sql: String },
}

impl Operation {
    /// Short description for logs and reports.
    pub fn describe(&self) -> String {
        match self {
            Operation::AlterColumn(req) => format!("alter column {}.{}", req.table, req.column),
            Operation::AddColumn { table, column } => {
                format!("add column {}.{}", table, column.name)
            }
            Operation::DropConstraint(c) => format!(
                "drop {:?} {} on {}",
                c.kind,
                c.name.as_deref().unwrap_or("<unnamed>"),
                c.table
            ),
            Operation::RenameTable { table, new_name } => {
                format!("rename table {} to {}", table, new_name)
            }
            Operation::Execute { sql } => {
                let first_line = sql.lines().next().unwrap_or_default();
                format!("execute {}", first_line)
            }
        }
    }

    /// Check every identifier the operation names.
    pub fn validate(&self) -> Result<()> {
        match self {
            Operation::AlterColumn(req) => {
                validate_table(&req.table)?;
                validate_identifier(&req.column)?;
                if let Some(new_name) = &req.new_name {
                    validate_identifier(new_name)?;
                }
            }
            Operation::AddColumn { table, column } => {
                validate_table(table)?;
                validate_identifier(&column.name)?;
            }
            Operation::DropConstraint(c) => {
                validate_table(&c.table)?;
                match &c.name {
                    Some(name) => validate_identifier(name)?,
                    None if c.kind != ConstraintKind::PrimaryKey => {
                        return Err(MigrateError::Plan(format!(
                            "{:?} constraint on {} needs a name",
                            c.kind, c.table
                        )));
                    }
                    None => {}
                }
            }
            Operation::RenameTable { table, new_name } => {
                validate_table(table)?;
                validate_identifier(new_name)?;
            }
            Operation::Execute { sql } => {
                if sql.trim().is_empty() {
                    return Err(MigrateError::Plan("execute needs a non-empty sql".into()));
                }
            }
        }
        Ok(())
    }

    /// Apply the operation through the orchestrator.
    pub async fn apply(&self, orch: &Orchestrator) -> Result<()> {
        match self {
            Operation::AlterColumn(req) => orch.alter_column(req).await,
            Operation::AddColumn { table, column } => orch.add_column(table, column).await,
            Operation::DropConstraint(c) => orch.drop_constraint(c).await,
            Operation::RenameTable { table, new_name } => {
                orch.rename_table(table, new_name).await
            }
            Operation::Execute { sql } => orch.execute(sql.as_str()).await.map(|_| ()),
        }
    }
}

fn validate_table(table: &TableRef) -> Result<()> {
    if let Some(schema) = table.schema() {
        validate_identifier(schema)?;
    }
    validate_identifier(&table.name)
}
