//! DB2 SQL dialect (Strategy pattern).
//!
//! Provides DB2-specific identifier formatting, type rendering, the three
//! DDL spellings DB2 does differently from the generic engine, and the
//! literal statements the orchestrator issues around primary keys, identity
//! columns, foreign keys and table reorganization.

use crate::core::compiler::{alter_table, kind_mismatch, DdlCompiler};
use crate::core::ddl::{DdlElement, DdlKind};
use crate::core::identifier::{format_ident, qualify_db2};
use crate::core::schema::{ColumnType, ForeignKey, PendingReorg, TableRef};
use crate::core::traits::Dialect;
use crate::error::Result;

/// Catalog query listing tables left in reorg-pending state.
pub const REORG_PENDING_QUERY: &str =
    "select TABSCHEMA, TABNAME from SYSIBMADM.ADMINTABINFO where REORG_PENDING = 'Y'";

/// IBM DB2 (LUW) dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct Db2Dialect;

impl Db2Dialect {
    /// Create a new DB2 dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// DB2 runs DDL inside transactions.
    pub fn transactional_ddl(&self) -> bool {
        true
    }

    /// `ALTER TABLE t DROP PRIMARY KEY`
    pub fn drop_primary_key_sql(&self, table: &TableRef) -> Result<String> {
        Ok(format!("{} DROP PRIMARY KEY", alter_table(self, table)?))
    }

    /// `ALTER TABLE t ADD PRIMARY KEY (c1, c2)`
    pub fn add_primary_key_sql(&self, table: &TableRef, columns: &[String]) -> Result<String> {
        Ok(format!(
            "{} ADD PRIMARY KEY ({})",
            alter_table(self, table)?,
            self.column_list(columns)?
        ))
    }

    /// `ALTER TABLE t ALTER COLUMN c DROP IDENTITY`
    pub fn drop_identity_sql(&self, table: &TableRef, column: &str) -> Result<String> {
        Ok(format!(
            "{} ALTER COLUMN {} DROP IDENTITY",
            alter_table(self, table)?,
            format_ident(column)?
        ))
    }

    /// `ALTER TABLE t DROP CHECK name`
    pub fn drop_check_sql(&self, table: &TableRef, name: &str) -> Result<String> {
        Ok(format!(
            "{} DROP CHECK {}",
            alter_table(self, table)?,
            format_ident(name)?
        ))
    }

    /// `ALTER TABLE t DROP CONSTRAINT name`
    pub fn drop_constraint_sql(&self, table: &TableRef, name: &str) -> Result<String> {
        Ok(format!(
            "{} DROP CONSTRAINT {}",
            alter_table(self, table)?,
            format_ident(name)?
        ))
    }

    /// `ALTER TABLE child ADD CONSTRAINT name FOREIGN KEY (..) REFERENCES parent (..)`
    pub fn add_foreign_key_sql(&self, fk: &ForeignKey) -> Result<String> {
        Ok(format!(
            "{} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            alter_table(self, &fk.constrained())?,
            format_ident(&fk.name)?,
            self.column_list(&fk.constrained_columns)?,
            fk.referred().qualified()?,
            self.column_list(&fk.referred_columns)?
        ))
    }

    /// `CALL SYSPROC.ADMIN_CMD('REORG TABLE "SCHEMA"."TABLE"')`
    ///
    /// Catalog names are used verbatim, so both parts are always quoted.
    pub fn reorg_table_sql(&self, pending: &PendingReorg) -> String {
        let command = format!(
            "REORG TABLE {}.{}",
            self.quote_ident(&pending.schema),
            self.quote_ident(&pending.table)
        );
        format!(
            "CALL SYSPROC.ADMIN_CMD('{}')",
            command.replace('\'', "''")
        )
    }

    fn column_list(&self, columns: &[String]) -> Result<String> {
        Ok(columns
            .iter()
            .map(|c| format_ident(c))
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }
}

impl Dialect for Db2Dialect {
    fn name(&self) -> &str {
        "db2"
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn format_ident(&self, name: &str) -> Result<String> {
        format_ident(name)
    }

    fn format_table(&self, table: &TableRef) -> Result<String> {
        qualify_db2(table.schema(), &table.name)
    }

    fn format_type(&self, column_type: &ColumnType) -> String {
        match column_type {
            ColumnType::Plain(sql) => sql.clone(),
            // Enums are stored as VARCHAR sized to the longest value.
            ColumnType::Enum { values, .. } => {
                let length = values.iter().map(|v| v.chars().count()).max().unwrap_or(0);
                format!("VARCHAR({})", length.max(1))
            }
        }
    }

    fn register_renderers(&self, compiler: &mut DdlCompiler) {
        compiler.register(DdlKind::ColumnType, visit_column_type);
        compiler.register(DdlKind::ColumnName, visit_column_name);
        compiler.register(DdlKind::RenameTable, visit_rename_table);
    }
}

/// `ALTER TABLE t ALTER COLUMN c SET DATA TYPE <type>`
fn visit_column_type(element: &DdlElement, dialect: &dyn Dialect) -> Result<String> {
    let DdlElement::ColumnType {
        table,
        column,
        column_type,
    } = element
    else {
        return Err(kind_mismatch(DdlKind::ColumnType, element));
    };
    Ok(format!(
        "{} ALTER COLUMN {} SET DATA TYPE {}",
        alter_table(dialect, table)?,
        dialect.format_ident(column)?,
        dialect.format_type(column_type)
    ))
}

/// `ALTER TABLE t RENAME COLUMN old TO new`
fn visit_column_name(element: &DdlElement, dialect: &dyn Dialect) -> Result<String> {
    let DdlElement::ColumnName {
        table,
        column,
        new_name,
    } = element
    else {
        return Err(kind_mismatch(DdlKind::ColumnName, element));
    };
    Ok(format!(
        "{} RENAME COLUMN {} TO {}",
        alter_table(dialect, table)?,
        dialect.format_ident(column)?,
        dialect.format_ident(new_name)?
    ))
}

/// `RENAME TABLE schema.old TO schema.new`
fn visit_rename_table(element: &DdlElement, dialect: &dyn Dialect) -> Result<String> {
    let DdlElement::RenameTable { table, new_name } = element else {
        return Err(kind_mismatch(DdlKind::RenameTable, element));
    };
    let renamed = TableRef::with_schema(new_name.as_str(), table.schema.clone());
    Ok(format!(
        "RENAME TABLE {} TO {}",
        dialect.format_table(table)?,
        dialect.format_table(&renamed)?
    ))
}
