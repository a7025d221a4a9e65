//! Constraint drops and table renames.

use tracing::{debug, info};

use super::Orchestrator;
use crate::core::ddl::DdlElement;
use crate::core::schema::{Constraint, ConstraintKind, ForeignKey, TableRef};
use crate::error::{MigrateError, Result};

impl Orchestrator {
    /// Drop a constraint.
    ///
    /// From DB2 10.5 on, a unique constraint over nullable columns exists as
    /// a null-excluding unique index instead of a constraint. Such a
    /// "constraint" is dropped with `DROP INDEX` unless the catalog lists a
    /// true unique constraint under the same name.
    pub async fn drop_constraint(&self, constraint: &Constraint) -> Result<()> {
        let mut as_index = false;

        if constraint.kind == ConstraintKind::Unique
            && self.supports_nullable_unique_constraints().await?
        {
            let Some(name) = constraint.name.as_deref() else {
                return Err(MigrateError::Config(format!(
                    "Cannot drop an unnamed unique constraint on {}",
                    constraint.table
                )));
            };

            as_index = true;
            let uniques = self.inspector.unique_constraints(&constraint.table).await?;
            if uniques.iter().any(|u| u.name.eq_ignore_ascii_case(name)) {
                as_index = false;
            }
            debug!(
                "unique {} on {} dropped as {}",
                name,
                constraint.table,
                if as_index { "index" } else { "constraint" }
            );
        }

        self.execute(DdlElement::DropConstraint {
            constraint: constraint.clone(),
            as_index,
        })
        .await?;
        Ok(())
    }

    /// Rename a table within its schema.
    ///
    /// Every foreign key touching the table (owned by it or referencing it)
    /// is dropped first and recreated against the new name afterwards.
    pub async fn rename_table(&self, table: &TableRef, new_name: &str) -> Result<()> {
        let mut keys = self.inspector.foreign_keys(table).await?;
        for fk in self.inspector.incoming_foreign_keys(table).await? {
            if !keys.iter().any(|k| k.name == fk.name) {
                keys.push(fk);
            }
        }

        for fk in &keys {
            let owner = owner_table(fk, table);
            self.execute(self.dialect.drop_constraint_sql(&owner, &fk.name)?)
                .await?;
        }

        self.execute(DdlElement::RenameTable {
            table: table.clone(),
            new_name: new_name.to_string(),
        })
        .await?;

        for fk in &keys {
            let mut renamed = fk.with_renamed_table(table, new_name);
            if renamed.constrained_schema.is_none() {
                renamed.constrained_schema = table.schema.clone();
            }
            self.execute(self.dialect.add_foreign_key_sql(&renamed)?)
                .await?;
        }

        info!(
            "Renamed {} to {} ({} foreign keys recreated)",
            table,
            new_name,
            keys.len()
        );
        Ok(())
    }
}

/// Table that owns `fk`, falling back to the schema of the renamed table.
fn owner_table(fk: &ForeignKey, table: &TableRef) -> TableRef {
    TableRef::with_schema(
        fk.constrained_table.as_str(),
        fk.constrained_schema.clone().or_else(|| table.schema.clone()),
    )
}
