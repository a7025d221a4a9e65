//! Server version gate.
//!
//! DB2 10.5 introduced unique indexes that exclude NULL keys, which is how
//! unique constraints over nullable columns get materialized. Everything
//! that depends on that behavior asks [`supports_nullable_unique_constraints`].

use crate::core::traits::DialectInfo;
use crate::error::{MigrateError, Result};

/// First DB2 release with null-excluding unique indexes.
pub const NULLABLE_UNIQUE_MIN_VERSION: [u32; 2] = [10, 5];

/// Product name marker reported by DB2 for Linux, Unix and Windows.
const DB2_FAMILY_MARKER: &str = "DB2/";

/// Parse the `[major, minor]` prefix of the server version string.
///
/// Returns an empty list when the connection reports no version or a blank
/// one. A token that is not an integer is an error.
pub fn server_version_info(info: &DialectInfo) -> Result<Vec<u32>> {
    let Some(version) = info.dbms_ver.as_deref().filter(|v| !v.trim().is_empty()) else {
        return Ok(Vec::new());
    };

    version
        .split('.')
        .take(2)
        .map(|token| {
            token
                .trim()
                .parse::<u32>()
                .map_err(|source| MigrateError::Version {
                    version: version.to_string(),
                    source,
                })
        })
        .collect()
}

/// Extract the dotted version from an instance service level.
///
/// `DB2 v11.5.8.0` → `11.5.8.0`. Text without a `v` marker is returned trimmed.
pub fn version_from_service_level(service_level: &str) -> String {
    let trimmed = service_level.trim();
    match trimmed.rfind(|c: char| c == 'v' || c == 'V') {
        Some(pos) => trimmed[pos + 1..].trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Whether the server belongs to the DB2 LUW family.
pub fn is_db2_family(info: &DialectInfo) -> bool {
    info.dbms_name
        .as_deref()
        .is_some_and(|name| name.contains(DB2_FAMILY_MARKER))
}

/// Whether unique constraints over nullable columns are represented as
/// null-excluding unique indexes on this server.
pub fn supports_nullable_unique_constraints(info: &DialectInfo) -> Result<bool> {
    if !is_db2_family(info) {
        return Ok(false);
    }
    let version = server_version_info(info)?;
    Ok(version.as_slice() >= NULLABLE_UNIQUE_MIN_VERSION.as_slice())
}
