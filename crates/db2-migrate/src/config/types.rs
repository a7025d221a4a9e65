//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// DB2 connection settings.
    pub connection: ConnectionConfig,

    /// Server identification overrides.
    #[serde(default)]
    pub dialect: DialectConfig,
}

/// DB2 connection configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Full ODBC connection string; wins over the individual fields.
    #[serde(default)]
    pub connection_string: Option<String>,

    /// ODBC driver name (default: "IBM DB2 ODBC DRIVER").
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Database host.
    #[serde(default)]
    pub host: String,

    /// Database port (default: 50000).
    #[serde(default = "default_db2_port")]
    pub port: u16,

    /// Database name.
    #[serde(default)]
    pub database: String,

    /// Username.
    #[serde(default)]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Session schema (`CurrentSchema`), used for unqualified table names.
    #[serde(default)]
    pub schema: Option<String>,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Overrides for what the server reports about itself.
///
/// Useful when the driver reports an unexpected product name or when the
/// monitoring views used for the version lookup are not accessible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialectConfig {
    /// DBMS product name, e.g. `DB2/LINUXX8664`.
    #[serde(default)]
    pub dbms_name: Option<String>,

    /// Dotted server version, e.g. `11.5`.
    #[serde(default)]
    pub server_version: Option<String>,
}

fn default_driver() -> String {
    "IBM DB2 ODBC DRIVER".to_string()
}

fn default_db2_port() -> u16 {
    50000
}
