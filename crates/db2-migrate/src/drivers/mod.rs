//! Database driver implementations.
//!
//! - [`db2`]: DB2 dialect, catalog inspector and version gate
//! - [`dry_run`]: connection wrapper that records DDL instead of running it
//! - `odbc`: ODBC connection (feature `odbc`)
//!
//! # Adding Connection Types
//!
//! A connection only has to implement [`Connection`](crate::core::Connection):
//! execute one statement, return its rows as text and identify the server.
//! Gate anything that links against native client libraries behind a
//! feature flag in `Cargo.toml`.

pub mod db2;
pub mod dry_run;
#[cfg(feature = "odbc")]
pub mod odbc;

pub use db2::{Db2Dialect, Db2Inspector};
pub use dry_run::DryRunConnection;
#[cfg(feature = "odbc")]
pub use odbc::OdbcConnection;
