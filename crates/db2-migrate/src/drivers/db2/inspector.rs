//! DB2 catalog inspector.
//!
//! Reads the `SYSCAT` views directly through the supplied connection. The
//! queries are plain reads issued on the connection, never through the
//! orchestrator, so they do not trigger a reorg sweep.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::core::identifier::{denormalize_name, normalize_name, string_literal};
use crate::core::schema::{ForeignKey, TableRef, UniqueConstraint};
use crate::core::traits::{Connection, QueryResult, SchemaInspector};
use crate::error::{MigrateError, Result};

/// [`SchemaInspector`] backed by the DB2 system catalog.
pub struct Db2Inspector {
    conn: Arc<dyn Connection>,
}

impl Db2Inspector {
    /// Create an inspector that reads the catalog over `conn`.
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        Self { conn }
    }

    async fn query(&self, what: &str, sql: String) -> Result<QueryResult> {
        debug!("catalog lookup ({}): {}", what, sql);
        self.conn
            .execute(&sql)
            .await
            .map_err(|e| MigrateError::Catalog(format!("{} lookup failed: {}", what, e)))
    }

    /// Query outgoing (`R.TABNAME`) or incoming (`R.REFTABNAME`) foreign keys.
    async fn query_foreign_keys(
        &self,
        what: &str,
        owner_schema: &str,
        owner_table: &str,
        table: &TableRef,
    ) -> Result<Vec<ForeignKey>> {
        let sql = format!(
            "SELECT R.CONSTNAME, R.TABSCHEMA, R.TABNAME, FK.COLNAME, \
             R.REFTABSCHEMA, R.REFTABNAME, PK.COLNAME \
             FROM SYSCAT.REFERENCES R \
             JOIN SYSCAT.KEYCOLUSE FK ON FK.CONSTNAME = R.CONSTNAME \
             AND FK.TABSCHEMA = R.TABSCHEMA AND FK.TABNAME = R.TABNAME \
             JOIN SYSCAT.KEYCOLUSE PK ON PK.CONSTNAME = R.REFKEYNAME \
             AND PK.TABSCHEMA = R.REFTABSCHEMA AND PK.TABNAME = R.REFTABNAME \
             AND PK.COLSEQ = FK.COLSEQ \
             WHERE {} AND {} = {} \
             ORDER BY R.TABSCHEMA, R.TABNAME, R.CONSTNAME, FK.COLSEQ",
            schema_predicate(owner_schema, table),
            owner_table,
            table_literal(table)
        );
        let result = self.query(what, sql).await?;
        group_foreign_keys(&result)
    }
}

/// `<column> = 'SCHEMA'`, or the session schema when none is given.
fn schema_predicate(column: &str, table: &TableRef) -> String {
    match table.schema() {
        Some(schema) => format!("{} = {}", column, string_literal(&denormalize_name(schema))),
        None => format!("{} = CURRENT SCHEMA", column),
    }
}

fn table_literal(table: &TableRef) -> String {
    string_literal(&denormalize_name(&table.name))
}

/// Read a cell that the catalog never leaves NULL.
fn required(result: &QueryResult, row: usize, col: usize) -> Result<String> {
    result.text(row, col).map(normalize_name).ok_or_else(|| {
        MigrateError::Catalog(format!(
            "unexpected NULL in catalog row {} column {}",
            row, col
        ))
    })
}

/// Fold per-column rows into one descriptor per constraint.
///
/// Rows arrive ordered by owner and constraint name, then key sequence.
fn group_foreign_keys(result: &QueryResult) -> Result<Vec<ForeignKey>> {
    let mut keys: Vec<ForeignKey> = Vec::new();
    for row in 0..result.rows.len() {
        let name = required(result, row, 0)?;
        let schema = required(result, row, 1)?;
        let table = required(result, row, 2)?;
        let column = required(result, row, 3)?;
        let referred_column = required(result, row, 6)?;

        match keys.last_mut() {
            Some(fk)
                if fk.name == name
                    && fk.constrained_schema.as_deref() == Some(schema.as_str())
                    && fk.constrained_table == table =>
            {
                fk.constrained_columns.push(column);
                fk.referred_columns.push(referred_column);
            }
            _ => keys.push(ForeignKey {
                name,
                constrained_schema: Some(schema),
                constrained_table: table,
                constrained_columns: vec![column],
                referred_schema: Some(required(result, row, 4)?),
                referred_table: required(result, row, 5)?,
                referred_columns: vec![referred_column],
            }),
        }
    }
    Ok(keys)
}

#[async_trait]
impl SchemaInspector for Db2Inspector {
    async fn primary_key_columns(&self, table: &TableRef) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT K.COLNAME FROM SYSCAT.TABCONST C \
             JOIN SYSCAT.KEYCOLUSE K ON K.CONSTNAME = C.CONSTNAME \
             AND K.TABSCHEMA = C.TABSCHEMA AND K.TABNAME = C.TABNAME \
             WHERE C.TYPE = 'P' AND {} AND C.TABNAME = {} \
             ORDER BY K.COLSEQ",
            schema_predicate("C.TABSCHEMA", table),
            table_literal(table)
        );
        let result = self.query("primary key", sql).await?;
        (0..result.rows.len())
            .map(|row| required(&result, row, 0))
            .collect()
    }

    async fn foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKey>> {
        self.query_foreign_keys("foreign key", "R.TABSCHEMA", "R.TABNAME", table)
            .await
    }

    async fn incoming_foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKey>> {
        self.query_foreign_keys(
            "referencing foreign key",
            "R.REFTABSCHEMA",
            "R.REFTABNAME",
            table,
        )
        .await
    }

    async fn unique_constraints(&self, table: &TableRef) -> Result<Vec<UniqueConstraint>> {
        let sql = format!(
            "SELECT C.CONSTNAME, K.COLNAME FROM SYSCAT.TABCONST C \
             JOIN SYSCAT.KEYCOLUSE K ON K.CONSTNAME = C.CONSTNAME \
             AND K.TABSCHEMA = C.TABSCHEMA AND K.TABNAME = C.TABNAME \
             WHERE C.TYPE = 'U' AND {} AND C.TABNAME = {} \
             ORDER BY C.CONSTNAME, K.COLSEQ",
            schema_predicate("C.TABSCHEMA", table),
            table_literal(table)
        );
        let result = self.query("unique constraint", sql).await?;

        let mut constraints: Vec<UniqueConstraint> = Vec::new();
        for row in 0..result.rows.len() {
            let name = required(&result, row, 0)?;
            let column = required(&result, row, 1)?;
            match constraints.last_mut() {
                Some(uc) if uc.name == name => uc.columns.push(column),
                _ => constraints.push(UniqueConstraint {
                    name,
                    columns: vec![column],
                }),
            }
        }
        Ok(constraints)
    }

    async fn check_constraint_exists(&self, table: &TableRef, name: &str) -> Result<bool> {
        let sql = format!(
            "SELECT 1 FROM SYSCAT.CHECKS WHERE {} AND TABNAME = {} AND CONSTNAME = {}",
            schema_predicate("TABSCHEMA", table),
            table_literal(table),
            string_literal(&denormalize_name(name))
        );
        Ok(!self.query("check constraint", sql).await?.rows.is_empty())
    }

    async fn is_identity_column(&self, table: &TableRef, column: &str) -> Result<bool> {
        let sql = format!(
            "SELECT 1 FROM SYSCAT.COLUMNS WHERE {} AND TABNAME = {} AND COLNAME = {} \
             AND IDENTITY = 'Y'",
            schema_predicate("TABSCHEMA", table),
            table_literal(table),
            string_literal(&denormalize_name(column))
        );
        Ok(!self.query("identity column", sql).await?.rows.is_empty())
    }
}
