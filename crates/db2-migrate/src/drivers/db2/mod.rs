//! IBM DB2 (LUW) driver: dialect, catalog inspector and version gate.

pub mod dialect;
pub mod inspector;
pub mod version;

pub use dialect::{Db2Dialect, REORG_PENDING_QUERY};
pub use inspector::Db2Inspector;
pub use version::{server_version_info, supports_nullable_unique_constraints};
