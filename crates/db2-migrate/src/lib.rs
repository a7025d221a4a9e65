//! # db2-migrate
//!
//! DDL orchestration for schema migrations on IBM DB2 (LUW).
//!
//! DB2's `ALTER TABLE` differs from the generic case in ways a migration
//! engine has to work around. This library sequences the statements for it:
//!
//! - **Single-attribute alters**: nullability, default, type and name are
//!   changed one statement at a time
//! - **Primary key rebuilds** around retyped or renamed key columns
//! - **Foreign key rebuilds** around table renames
//! - **Unique index handling** for unique constraints over nullable columns
//! - **Reorg sweeps** after every statement for tables left reorg-pending
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use db2_migrate::{AlterColumn, ColumnType, Orchestrator, TableRef};
//!
//! async fn widen(conn: Arc<dyn db2_migrate::Connection>) -> db2_migrate::Result<()> {
//!     let orch = Orchestrator::new(conn);
//!     let request = AlterColumn::new(TableRef::in_schema("app", "orders"), "qty")
//!         .retype(ColumnType::plain("BIGINT"));
//!     orch.alter_column(&request).await
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod plan;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use crate::config::{Config, ConnectionConfig, DialectConfig};
pub use crate::core::{
    ColumnSpec, ColumnType, Connection, Constraint, ConstraintKind, DdlCompiler, DdlElement,
    DdlKind, Dialect, DialectInfo, ForeignKey, PendingReorg, QueryResult, SchemaInspector,
    ServerDefault, Statement, TableRef, UniqueConstraint,
};
pub use crate::drivers::db2::{server_version_info, supports_nullable_unique_constraints};
pub use crate::drivers::{Db2Dialect, Db2Inspector, DryRunConnection};
#[cfg(feature = "odbc")]
pub use crate::drivers::OdbcConnection;
pub use crate::error::{MigrateError, Result};
pub use crate::orchestrator::{AlterColumn, Orchestrator};
pub use crate::plan::{MigrationPlan, Operation, PlanFailure, PlanResult};
