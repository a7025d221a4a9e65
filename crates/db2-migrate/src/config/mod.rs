//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl ConnectionConfig {
    /// Build an ODBC connection string for the IBM Data Server driver.
    pub fn connection_string(&self) -> String {
        if let Some(conn_str) = &self.connection_string {
            return conn_str.clone();
        }

        let mut conn_str = format!(
            "Driver={{{}}};Hostname={};Port={};Protocol=TCPIP;Database={};Uid={};Pwd={};",
            self.driver, self.host, self.port, self.database, self.user, self.password
        );
        if let Some(schema) = &self.schema {
            conn_str.push_str(&format!("CurrentSchema={};", schema));
        }
        conn_str
    }

    /// Connection string with credentials hidden, for logs and errors.
    pub fn redacted(&self) -> String {
        match &self.connection_string {
            Some(_) => "<connection_string from config>".to_string(),
            None => format!(
                "Driver={{{}}};Hostname={};Port={};Protocol=TCPIP;Database={};Uid={};Pwd=***;",
                self.driver, self.host, self.port, self.database, self.user
            ),
        }
    }

    /// Short `host:port/database` description.
    pub fn describe(&self) -> String {
        match &self.connection_string {
            Some(_) => "connection string".to_string(),
            None => format!("{}:{}/{}", self.host, self.port, self.database),
        }
    }
}
