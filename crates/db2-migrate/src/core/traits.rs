//! Core traits forming the contract between the migration engine and the
//! DDL orchestrator.
//!
//! - [`Connection`]: executes SQL text against a live, authenticated database
//! - [`SchemaInspector`]: reads the catalog fragments the orchestrator needs
//! - [`Dialect`]: SQL spelling strategy for the target database
//!
//! # Design Patterns
//!
//! - **Strategy**: `Dialect` provides interchangeable SQL spelling rules and
//!   registers its renderers into a [`DdlCompiler`]
//! - **Dependency injection**: the engine supplies the `Connection` and the
//!   `SchemaInspector`; the orchestrator never opens connections itself

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::compiler::DdlCompiler;
use super::schema::{ColumnType, ForeignKey, TableRef, UniqueConstraint};

/// Result of executing one statement.
///
/// Cells are fetched as text; `None` is SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Result set column names (empty for statements without a result set).
    pub columns: Vec<String>,
    /// Result set rows.
    pub rows: Vec<Vec<Option<String>>>,
    /// Rows affected, when the driver reports it.
    pub rows_affected: Option<u64>,
}

impl QueryResult {
    /// A result without a result set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A result set with the given columns and rows.
    pub fn with_rows(columns: &[&str], rows: Vec<Vec<Option<String>>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            rows_affected: None,
        }
    }

    /// Whether the statement produced a result set.
    pub fn returns_rows(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Text of a cell, `None` for NULL or out-of-range positions.
    pub fn text(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

/// Identification of the server behind a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectInfo {
    /// DBMS product name as reported by the driver (`DB2/LINUXX8664`).
    pub dbms_name: Option<String>,
    /// Dotted DBMS version string (`11.05.0900`).
    pub dbms_ver: Option<String>,
}

impl DialectInfo {
    /// Create dialect info from a product name and version.
    pub fn new(dbms_name: impl Into<String>, dbms_ver: impl Into<String>) -> Self {
        Self {
            dbms_name: Some(dbms_name.into()),
            dbms_ver: Some(dbms_ver.into()),
        }
    }
}

/// A live database connection supplied by the migration engine.
///
/// Implementations must execute one statement at a time; the orchestrator
/// awaits each statement before issuing the next.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a statement and return its result set, if any.
    async fn execute(&self, sql: &str) -> Result<QueryResult>;

    /// Identify the server (product name and version).
    async fn dialect_info(&self) -> Result<DialectInfo>;

    /// Get the connection type identifier (e.g., "odbc", "dry-run").
    fn db_type(&self) -> &str;
}

/// Catalog introspection used to decide which extra statements are needed.
///
/// Every call reads the live catalog; results are never cached because the
/// catalog changes between the steps of one operation.
#[async_trait]
pub trait SchemaInspector: Send + Sync {
    /// Primary key column names in key order (empty if the table has no key).
    async fn primary_key_columns(&self, table: &TableRef) -> Result<Vec<String>>;

    /// Foreign keys owned by the table (table is the child).
    async fn foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKey>>;

    /// Foreign keys of other tables referencing the table (table is the parent).
    async fn incoming_foreign_keys(&self, table: &TableRef) -> Result<Vec<ForeignKey>>;

    /// True unique constraints on the table (unique indexes are not included).
    async fn unique_constraints(&self, table: &TableRef) -> Result<Vec<UniqueConstraint>>;

    /// Check whether a named check constraint exists on the table.
    async fn check_constraint_exists(&self, table: &TableRef, name: &str) -> Result<bool>;

    /// Check whether a column is an identity column.
    async fn is_identity_column(&self, table: &TableRef, column: &str) -> Result<bool>;
}

/// SQL spelling strategy for a database engine.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "db2").
    fn name(&self) -> &str;

    /// Quote an identifier unconditionally.
    fn quote_ident(&self, name: &str) -> String;

    /// Format an identifier for DDL, quoting only when required.
    fn format_ident(&self, name: &str) -> Result<String>;

    /// Format a (possibly schema-qualified) table name for DDL.
    fn format_table(&self, table: &TableRef) -> Result<String>;

    /// Render a column type.
    fn format_type(&self, column_type: &ColumnType) -> String;

    /// Register dialect-specific renderers over the generic ones.
    fn register_renderers(&self, _compiler: &mut DdlCompiler) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_result_accessors() {
        let result = QueryResult::with_rows(
            &["TABSCHEMA", "TABNAME"],
            vec![vec![Some("APP".to_string()), None]],
        );
        assert!(result.returns_rows());
        assert_eq!(result.text(0, 0), Some("APP"));
        assert_eq!(result.text(0, 1), None);
        assert_eq!(result.text(3, 0), None);
        assert!(!QueryResult::empty().returns_rows());
    }
}
