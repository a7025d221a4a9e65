//! Configuration validation.

use super::Config;
use crate::core::identifier::validate_identifier;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let conn = &config.connection;

    match &conn.connection_string {
        Some(conn_str) if conn_str.trim().is_empty() => {
            return Err(MigrateError::Config(
                "connection.connection_string cannot be empty".into(),
            ));
        }
        Some(_) => {}
        None => {
            if conn.host.is_empty() {
                return Err(MigrateError::Config("connection.host is required".into()));
            }
            if conn.database.is_empty() {
                return Err(MigrateError::Config(
                    "connection.database is required".into(),
                ));
            }
            if conn.user.is_empty() {
                return Err(MigrateError::Config("connection.user is required".into()));
            }
            if conn.driver.is_empty() {
                return Err(MigrateError::Config(
                    "connection.driver cannot be empty".into(),
                ));
            }
        }
    }

    if conn.port == 0 {
        return Err(MigrateError::Config(
            "connection.port must be greater than 0".into(),
        ));
    }

    if let Some(schema) = &conn.schema {
        validate_identifier(schema)
            .map_err(|e| MigrateError::Config(format!("connection.schema: {}", e)))?;
    }

    if let Some(version) = &config.dialect.server_version {
        if version.trim().is_empty() {
            return Err(MigrateError::Config(
                "dialect.server_version cannot be empty".into(),
            ));
        }
    }

    Ok(())
}
