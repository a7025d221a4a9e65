//! Core abstractions for DDL orchestration.
//!
//! This module provides the foundational types and traits used throughout
//! the crate:
//!
//! - [`schema`]: table, column and constraint metadata types
//! - [`ddl`]: generic DDL intents and executable statements
//! - [`compiler`]: renderer registry turning DDL intents into SQL text
//! - [`traits`]: the connection, catalog and dialect contracts
//! - [`identifier`]: identifier validation, quoting and normalization
//!
//! # Architecture
//!
//! The core module is database-agnostic. The DB2 specifics (catalog queries,
//! spellings, version gate) live in `drivers/db2`, and the statement
//! sequencing lives in `orchestrator`.

pub mod compiler;
pub mod ddl;
pub mod identifier;
pub mod schema;
pub mod traits;

// Re-export commonly used types for convenience
pub use compiler::{DdlCompiler, RenderFn};
pub use ddl::{DdlElement, DdlKind, Statement};
pub use schema::{
    ColumnSpec, ColumnType, Constraint, ConstraintKind, ForeignKey, PendingReorg, ServerDefault,
    TableRef, UniqueConstraint,
};
pub use traits::{Connection, Dialect, DialectInfo, QueryResult, SchemaInspector};
