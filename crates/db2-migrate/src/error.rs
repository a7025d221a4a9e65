//! Error types for the DDL orchestration library.

use thiserror::Error;

/// Exit code for invalid configuration or plan files.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code when the database cannot be reached.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code when a statement or catalog lookup fails.
pub const EXIT_EXECUTION_ERROR: u8 = 4;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, bad identifiers, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection could not be established or was lost, with context
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// A statement failed on the server
    #[error("Statement failed: {message}\n  SQL: {statement}")]
    Execution { statement: String, message: String },

    /// Catalog introspection failed or returned malformed rows
    #[error("Catalog lookup failed: {0}")]
    Catalog(String),

    /// Server version string could not be parsed
    #[error("Invalid server version '{version}': {source}")]
    Version {
        version: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Migration plan file is invalid
    #[error("Plan error: {0}")]
    Plan(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl Into<String>, context: impl Into<String>) -> Self {
        MigrateError::Connection {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create an Execution error for a failed statement
    pub fn execution(statement: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Execution {
            statement: statement.into(),
            message: message.into(),
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Process exit code for this error category.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_)
            | MigrateError::Plan(_)
            | MigrateError::Yaml(_)
            | MigrateError::Json(_)
            | MigrateError::Version { .. } => EXIT_CONFIG_ERROR,
            MigrateError::Connection { .. } => EXIT_CONNECTION_ERROR,
            MigrateError::Execution { .. } | MigrateError::Catalog(_) => EXIT_EXECUTION_ERROR,
            MigrateError::Io(_) => EXIT_IO_ERROR,
        }
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
