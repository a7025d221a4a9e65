//! ODBC connection to DB2 through the IBM Data Server driver.
//!
//! **Requirements:**
//! - The `odbc` feature must be enabled
//! - unixODBC (Linux/macOS) and the IBM Data Server Driver for ODBC and CLI
//!   must be installed and registered, e.g. as `IBM DB2 ODBC DRIVER`
//!
//! One ODBC connection is opened in [`OdbcConnection::connect`] and every
//! statement runs on it while holding `conn`, so statements are strictly
//! serialized and share the connection's transaction state. Calls into the
//! driver block the calling task.

use async_trait::async_trait;
use odbc_api::buffers::TextRowSet;
use odbc_api::{ConnectionOptions, Cursor, Environment, ResultSetMetadata};
use std::sync::OnceLock;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{ConnectionConfig, DialectConfig};
use crate::core::traits::{Connection, DialectInfo, QueryResult};
use crate::drivers::db2::version::version_from_service_level;
use crate::error::{MigrateError, Result};

/// Rows fetched per round trip.
const FETCH_BATCH_ROWS: usize = 500;

/// Upper bound for a single text cell.
const MAX_CELL_BYTES: usize = 4096;

/// Instance service level, e.g. `DB2 v11.5.8.0`.
const SERVICE_LEVEL_QUERY: &str = "SELECT SERVICE_LEVEL FROM SYSIBMADM.ENV_INST_INFO";

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Process-wide ODBC environment, created on first use.
fn environment() -> Result<&'static Environment> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let env = Environment::new().map_err(|e| {
        MigrateError::connection(
            format!(
                "Failed to create ODBC environment: {}.\n\n\
                 The ODBC driver requires unixODBC and the IBM Data Server Driver \
                 for ODBC and CLI to be installed.",
                e
            ),
            "ODBC environment",
        )
    })?;
    Ok(ENVIRONMENT.get_or_init(|| env))
}

/// [`Connection`] over ODBC.
pub struct OdbcConnection {
    dialect: DialectConfig,
    /// The single session all statements run on.
    conn: Mutex<odbc_api::Connection<'static>>,
}

impl OdbcConnection {
    /// Connect to DB2 and verify the connection with a trivial query.
    ///
    /// # Errors
    ///
    /// Returns an error if the ODBC environment cannot be created (driver
    /// manager missing) or the connection is refused.
    pub async fn connect(config: &ConnectionConfig, dialect: &DialectConfig) -> Result<Self> {
        let env = environment()?;

        let connection_string = config.connection_string();
        debug!("ODBC connection string: {}", config.redacted());

        let conn = env
            .connect_with_connection_string(&connection_string, ConnectionOptions::default())
            .map_err(|e| {
                MigrateError::connection(
                    format!("Failed to connect to DB2 via ODBC: {}", e),
                    config.redacted(),
                )
            })?;
        conn.execute("VALUES 1", ()).map_err(|e| {
            MigrateError::connection(format!("Connection check failed: {}", e), "VALUES 1")
        })?;

        info!("Connected to DB2 via ODBC: {}", config.describe());

        Ok(Self {
            dialect: dialect.clone(),
            conn: Mutex::new(conn),
        })
    }

    /// Open a transaction: statements stay uncommitted until [`commit`] or
    /// [`rollback`].
    ///
    /// [`commit`]: OdbcConnection::commit
    /// [`rollback`]: OdbcConnection::rollback
    pub async fn begin(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.set_autocommit(false).map_err(|e| {
            MigrateError::connection(format!("Failed to disable autocommit: {}", e), "BEGIN")
        })?;
        debug!("transaction started");
        Ok(())
    }

    /// Commit the open transaction and return to autocommit.
    pub async fn commit(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.commit()
            .map_err(|e| MigrateError::execution("COMMIT", e.to_string()))?;
        conn.set_autocommit(true)
            .map_err(|e| MigrateError::execution("COMMIT", e.to_string()))?;
        debug!("transaction committed");
        Ok(())
    }

    /// Roll back the open transaction and return to autocommit.
    pub async fn rollback(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.rollback()
            .map_err(|e| MigrateError::execution("ROLLBACK", e.to_string()))?;
        conn.set_autocommit(true)
            .map_err(|e| MigrateError::execution("ROLLBACK", e.to_string()))?;
        debug!("transaction rolled back");
        Ok(())
    }
}

/// Execute one statement and fetch its result set as text.
fn execute_on(conn: &odbc_api::Connection<'_>, sql: &str) -> Result<QueryResult> {
    let mut result = QueryResult::empty();

    let cursor = conn
        .execute(sql, ())
        .map_err(|e| MigrateError::execution(sql, e.to_string()))?;

    if let Some(mut cursor) = cursor {
        let num_cols = cursor
            .num_result_cols()
            .map_err(|e| MigrateError::execution(sql, format!("column count: {}", e)))?;

        for col in 1..=num_cols {
            let name = cursor
                .col_name(col as u16)
                .map_err(|e| MigrateError::execution(sql, format!("column name: {}", e)))?;
            result.columns.push(name);
        }

        let mut buffers =
            TextRowSet::for_cursor(FETCH_BATCH_ROWS, &mut cursor, Some(MAX_CELL_BYTES))
                .map_err(|e| MigrateError::execution(sql, format!("row buffer: {}", e)))?;
        let mut row_cursor = cursor
            .bind_buffer(&mut buffers)
            .map_err(|e| MigrateError::execution(sql, format!("bind buffer: {}", e)))?;

        while let Some(batch) = row_cursor
            .fetch()
            .map_err(|e| MigrateError::execution(sql, format!("fetch: {}", e)))?
        {
            for row_idx in 0..batch.num_rows() {
                let row = (0..num_cols as usize)
                    .map(|col_idx| {
                        batch
                            .at(col_idx, row_idx)
                            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                    })
                    .collect();
                result.rows.push(row);
            }
        }
    }

    Ok(result)
}

#[async_trait]
impl Connection for OdbcConnection {
    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        let conn = self.conn.lock().await;
        execute_on(&conn, sql)
    }

    async fn dialect_info(&self) -> Result<DialectInfo> {
        let conn = self.conn.lock().await;

        let dbms_name = match &self.dialect.dbms_name {
            Some(name) => name.clone(),
            None => conn.database_management_system_name().map_err(|e| {
                MigrateError::connection(format!("DBMS name lookup failed: {}", e), "SQLGetInfo")
            })?,
        };

        let dbms_ver = match &self.dialect.server_version {
            Some(version) => Some(version.clone()),
            None => {
                let result = execute_on(&conn, SERVICE_LEVEL_QUERY)?;
                result.text(0, 0).map(version_from_service_level)
            }
        };

        debug!("server identified as {} {:?}", dbms_name, dbms_ver);
        Ok(DialectInfo {
            dbms_name: Some(dbms_name),
            dbms_ver,
        })
    }

    fn db_type(&self) -> &str {
        "odbc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_is_created_once() {
        let first = environment().unwrap();
        let second = environment().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_connection_is_shareable_across_tasks() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OdbcConnection>();
    }
}
