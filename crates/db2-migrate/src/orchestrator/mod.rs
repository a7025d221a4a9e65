//! DDL orchestrator - sequences DB2 statements for schema changes.
//!
//! Every statement goes through [`Orchestrator::execute`], which follows it
//! with a reorg sweep: DB2 leaves some tables in reorg-pending state after
//! certain ALTERs, and those tables reject further work until reorganized.
//!
//! The higher-level operations live in submodules:
//! - [`alter`]: column alteration and column addition
//! - [`constraints`]: constraint drops and table renames

mod alter;
mod constraints;

pub use alter::AlterColumn;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::compiler::DdlCompiler;
use crate::core::ddl::Statement;
use crate::core::identifier::normalize_name;
use crate::core::schema::PendingReorg;
use crate::core::traits::{Connection, DialectInfo, QueryResult, SchemaInspector};
use crate::drivers::db2::{self, Db2Dialect, Db2Inspector, REORG_PENDING_QUERY};
use crate::error::{MigrateError, Result};

/// DB2 DDL orchestrator.
///
/// Holds the connection and catalog supplied by the migration engine, plus
/// the DB2 dialect and its renderer registry (built once).
pub struct Orchestrator {
    conn: Arc<dyn Connection>,
    inspector: Arc<dyn SchemaInspector>,
    dialect: Db2Dialect,
    compiler: DdlCompiler,
    statements_executed: AtomicUsize,
}

impl Orchestrator {
    /// Create an orchestrator that inspects the catalog over the same connection.
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        let inspector: Arc<dyn SchemaInspector> = Arc::new(Db2Inspector::new(conn.clone()));
        Self::with_inspector(conn, inspector)
    }

    /// Create an orchestrator with an explicit catalog inspector.
    pub fn with_inspector(conn: Arc<dyn Connection>, inspector: Arc<dyn SchemaInspector>) -> Self {
        let dialect = Db2Dialect::new();
        let compiler = DdlCompiler::for_dialect(&dialect);
        Self {
            conn,
            inspector,
            dialect,
            compiler,
            statements_executed: AtomicUsize::new(0),
        }
    }

    /// The connection statements are executed on.
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.conn
    }

    /// The DB2 dialect.
    pub fn dialect(&self) -> &Db2Dialect {
        &self.dialect
    }

    /// The renderer registry.
    pub fn compiler(&self) -> &DdlCompiler {
        &self.compiler
    }

    /// Whether DDL may run inside a transaction.
    pub fn transactional_ddl(&self) -> bool {
        self.dialect.transactional_ddl()
    }

    /// Statements executed so far, including reorg commands.
    pub fn statements_executed(&self) -> usize {
        self.statements_executed.load(Ordering::Relaxed)
    }

    /// Render a statement to SQL text.
    pub fn render(&self, statement: &Statement) -> Result<String> {
        match statement {
            Statement::Ddl(element) => self.compiler.render(element, &self.dialect),
            Statement::Text(sql) => Ok(sql.clone()),
        }
    }

    /// Execute one statement, then reorganize every table left reorg-pending.
    ///
    /// The reorg-discovery query itself is executed as-is without a sweep.
    /// A failing reorg command fails the call even though the primary
    /// statement has already run.
    pub async fn execute(&self, statement: impl Into<Statement>) -> Result<QueryResult> {
        let sql = self.render(&statement.into())?;

        if sql == REORG_PENDING_QUERY {
            return self.conn.execute(&sql).await;
        }

        debug!("executing: {}", sql);
        let result = self.conn.execute(&sql).await?;
        self.statements_executed.fetch_add(1, Ordering::Relaxed);

        self.reorg_pending().await?;
        Ok(result)
    }

    /// Tables the server currently reports as reorg-pending.
    pub async fn pending_reorgs(&self) -> Result<Vec<PendingReorg>> {
        let result = self.conn.execute(REORG_PENDING_QUERY).await?;
        if !result.returns_rows() {
            return Ok(Vec::new());
        }

        (0..result.rows.len())
            .map(|row| {
                let cell = |col: usize| {
                    result
                        .text(row, col)
                        .map(|s| s.trim_end().to_string())
                        .ok_or_else(|| {
                            MigrateError::Catalog(format!(
                                "reorg-pending row {} has a NULL name",
                                row
                            ))
                        })
                };
                Ok::<_, MigrateError>(PendingReorg {
                    schema: cell(0)?,
                    table: cell(1)?,
                })
            })
            .collect()
    }

    /// Run the reorg sweep on its own and return the tables reorganized.
    pub async fn reorg_pending(&self) -> Result<Vec<PendingReorg>> {
        let pending = self.pending_reorgs().await?;
        for table in &pending {
            let sql = self.dialect.reorg_table_sql(table);
            info!(
                "Reorganizing {}.{}",
                normalize_name(&table.schema),
                normalize_name(&table.table)
            );
            self.conn.execute(&sql).await?;
            self.statements_executed.fetch_add(1, Ordering::Relaxed);
        }
        Ok(pending)
    }

    /// Identify the server behind the connection.
    pub async fn dialect_info(&self) -> Result<DialectInfo> {
        self.conn.dialect_info().await
    }

    /// `[major, minor]` of the server version, empty when unknown.
    pub async fn server_version_info(&self) -> Result<Vec<u32>> {
        db2::server_version_info(&self.dialect_info().await?)
    }

    /// Whether unique constraints over nullable columns are unique indexes.
    pub async fn supports_nullable_unique_constraints(&self) -> Result<bool> {
        db2::supports_nullable_unique_constraints(&self.dialect_info().await?)
    }
}
