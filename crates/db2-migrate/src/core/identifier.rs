//! Centralized identifier validation, quoting and name normalization for DB2.
//!
//! SQL identifiers (table names, column names, schema names) cannot be passed as
//! parameters in prepared statements, so every DDL statement this crate emits is
//! built from formatted identifiers. To keep that safe we:
//! 1. Validate identifiers for suspicious patterns (null bytes, excessive length)
//! 2. Quote only when DB2 would otherwise fold or reject the name
//! 3. Escape embedded double quotes inside quoted names
//!
//! # Name normalization
//!
//! DB2 stores unquoted identifiers in upper case. Names read back from the
//! catalog are normalized so that `EMPLOYEE` becomes `employee` (which renders
//! bare and folds back to `EMPLOYEE`), while names that genuinely need quoting
//! (`MixedCase`, `order`) are kept verbatim. Caller-supplied names go the other
//! way through [`denormalize_name`] before they are compared with catalog rows.

use crate::error::{MigrateError, Result};

/// Maximum identifier length accepted by DB2 LUW for most object kinds.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Words DB2 reserves; an identifier spelled like one of these must be quoted.
const RESERVED_WORDS: &[&str] = &[
    "activate", "add", "after", "alias", "all", "allocate", "allow", "alter", "and", "any",
    "as", "asensitive", "associate", "asutime", "at", "attributes", "audit", "authorization",
    "aux", "auxiliary", "before", "begin", "between", "binary", "bufferpool", "by", "cache",
    "call", "called", "capture", "cardinality", "cascaded", "case", "cast", "ccsid", "char",
    "character", "check", "clone", "close", "cluster", "collection", "collid", "column",
    "comment", "commit", "concat", "condition", "connect", "connection", "constraint",
    "contains", "continue", "count", "count_big", "create", "cross", "current",
    "current_date", "current_lc_ctype", "current_path", "current_schema", "current_server",
    "current_time", "current_timestamp", "current_timezone", "current_user", "cursor",
    "cycle", "data", "database", "datapartitionname", "datapartitionnum", "date", "day",
    "days", "db2general", "db2genrl", "db2sql", "dbinfo", "dbpartitionname",
    "dbpartitionnum", "deallocate", "declare", "default", "defaults", "definition",
    "delete", "dense_rank", "denserank", "describe", "descriptor", "deterministic",
    "diagnostics", "disable", "disallow", "disconnect", "distinct", "do", "document",
    "double", "drop", "dssize", "dynamic", "each", "editproc", "else", "elseif", "enable",
    "encoding", "encryption", "end", "end-exec", "ending", "erase", "escape", "every",
    "except", "exception", "excluding", "exclusive", "execute", "exists", "exit", "explain",
    "external", "extract", "fenced", "fetch", "fieldproc", "file", "final", "for",
    "foreign", "free", "from", "full", "function", "general", "generated", "get", "global",
    "go", "goto", "grant", "graphic", "group", "handler", "hash", "hashed_value", "having",
    "hint", "hold", "hour", "hours", "identity", "if", "immediate", "in", "including",
    "inclusive", "increment", "index", "indicator", "inherit", "inner", "inout",
    "insensitive", "insert", "integrity", "intersect", "into", "is", "isobid", "isolation",
    "iterate", "jar", "java", "join", "keep", "key", "label", "language", "lateral",
    "lc_ctype", "leave", "left", "like", "linktype", "local", "localdate", "locale",
    "localtime", "localtimestamp", "locator", "locators", "lock", "lockmax", "locksize",
    "long", "loop", "maintained", "materialized", "maxvalue", "microsecond",
    "microseconds", "minute", "minutes", "minvalue", "mode", "modifies", "month", "months",
    "new", "new_table", "nextval", "no", "nocache", "nocycle", "nodename", "nodenumber",
    "nomaxvalue", "nominvalue", "none", "noorder", "normalized", "not", "null", "nulls",
    "numparts", "obid", "of", "old", "old_table", "on", "open", "optimization", "optimize",
    "option", "or", "order", "out", "outer", "over", "overriding", "package", "padded",
    "pagesize", "parameter", "part", "partition", "partitioned", "partitioning",
    "partitions", "password", "path", "piecesize", "plan", "position", "precision",
    "prepare", "prevval", "primary", "priqty", "privileges", "procedure", "program",
    "psid", "public", "query", "queryno", "range", "rank", "read", "reads", "recovery",
    "references", "referencing", "refresh", "release", "rename", "repeat", "reset",
    "resignal", "restart", "restrict", "result", "result_set_locator", "return", "returns",
    "revoke", "right", "role", "rollback", "round_ceiling", "round_down", "round_floor",
    "round_half_down", "round_half_even", "round_half_up", "round_up", "routine", "row",
    "row_number", "rownumber", "rows", "rowset", "rrn", "run", "savepoint", "schema",
    "scratchpad", "scroll", "search", "second", "seconds", "secqty", "security", "select",
    "sensitive", "sequence", "session", "session_user", "set", "signal", "simple", "snan",
    "some", "source", "specific", "sql", "sqlid", "stacked", "standard", "start",
    "starting", "statement", "static", "stay", "stogroup", "stores", "style", "substring",
    "summary", "synonym", "sysfun", "sysibm", "sysproc", "system", "system_user", "table",
    "tablespace", "then", "time", "timestamp", "to", "transaction", "trigger", "trim",
    "truncate", "type", "undo", "union", "unique", "until", "update", "usage", "user",
    "using", "validproc", "value", "values", "variable", "variant", "vcat", "version",
    "view", "volatile", "volumes", "when", "whenever", "where", "while", "with", "without",
    "wlm", "write", "xmlelement", "xmlexists", "xmlnamespaces", "year", "years",
];

/// Validate an identifier for security issues.
///
/// Rejects empty identifiers, identifiers containing null bytes and identifiers
/// exceeding the maximum length.
///
/// # Errors
///
/// Returns `MigrateError::Config` for invalid identifiers with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote a DB2 identifier unconditionally.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
///
/// ```ignore
/// assert_eq!(quote_db2("users")?, "\"users\"");
/// assert_eq!(quote_db2("table\"name")?, "\"table\"\"name\"");
/// ```
pub fn quote_db2(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Check whether a name must be quoted to survive DB2's case folding.
///
/// A name can stay bare only if it is all lower case, starts with a letter,
/// uses only `[a-z0-9_$]` and is not a reserved word.
pub fn requires_quotes(name: &str) -> bool {
    let lower = name.to_lowercase();
    let Some(first) = name.chars().next() else {
        return true;
    };
    RESERVED_WORDS.contains(&lower.as_str())
        || first.is_ascii_digit()
        || first == '$'
        || first == '_'
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        || lower != name
}

/// Format an identifier for DDL, quoting only when required.
pub fn format_ident(name: &str) -> Result<String> {
    validate_identifier(name)?;
    if requires_quotes(name) {
        quote_db2(name)
    } else {
        Ok(name.to_string())
    }
}

/// Qualify a table name with an optional schema, quoting each part as needed.
pub fn qualify_db2(schema: Option<&str>, table: &str) -> Result<String> {
    match schema {
        Some(schema) => Ok(format!("{}.{}", format_ident(schema)?, format_ident(table)?)),
        None => format_ident(table),
    }
}

/// Convert a catalog name into the form used throughout the crate.
///
/// `EMPLOYEE` → `employee`; `MixedCase` and names that need quoting stay as-is.
/// Trailing blanks (CHAR padding in some catalog views) are dropped.
pub fn normalize_name(name: &str) -> String {
    let name = name.trim_end();
    let lower = name.to_lowercase();
    if name.to_uppercase() == name && !requires_quotes(&lower) {
        lower
    } else {
        name.to_string()
    }
}

/// Convert a caller-supplied name into its catalog spelling.
///
/// `employee` → `EMPLOYEE`; names that need quoting are stored verbatim.
pub fn denormalize_name(name: &str) -> String {
    if name.to_lowercase() == name && !requires_quotes(name) {
        name.to_uppercase()
    } else {
        name.to_string()
    }
}

/// Render a string as a SQL character literal (single quotes doubled).
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("employee").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("bad\0name").is_err());
        assert!(validate_identifier(&"x".repeat(129)).is_err());
        assert!(validate_identifier(&"x".repeat(128)).is_ok());
    }

    #[test]
    fn test_quote_db2() {
        assert_eq!(quote_db2("users").unwrap(), "\"users\"");
        assert_eq!(quote_db2("table\"name").unwrap(), "\"table\"\"name\"");
    }

    #[test]
    fn test_requires_quotes() {
        assert!(!requires_quotes("employee"));
        assert!(!requires_quotes("emp_no2"));
        assert!(requires_quotes("Employee"));
        assert!(requires_quotes("order"));
        assert!(requires_quotes("1st"));
        assert!(requires_quotes("_hidden"));
        assert!(requires_quotes("has space"));
    }

    #[test]
    fn test_format_ident() {
        assert_eq!(format_ident("employee").unwrap(), "employee");
        assert_eq!(format_ident("EMPLOYEE").unwrap(), "\"EMPLOYEE\"");
        assert_eq!(format_ident("user").unwrap(), "\"user\"");
    }

    #[test]
    fn test_qualify_db2() {
        assert_eq!(qualify_db2(Some("app"), "order").unwrap(), "app.\"order\"");
        assert_eq!(qualify_db2(Some("app"), "invoice").unwrap(), "app.invoice");
        assert_eq!(qualify_db2(None, "invoice").unwrap(), "invoice");
        assert_eq!(qualify_db2(Some("App"), "invoice").unwrap(), "\"App\".invoice");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("EMPLOYEE"), "employee");
        assert_eq!(normalize_name("EMPLOYEE   "), "employee");
        assert_eq!(normalize_name("MixedCase"), "MixedCase");
        // reserved words keep their catalog spelling so they stay quoted
        assert_eq!(normalize_name("ORDER"), "ORDER");
    }

    #[test]
    fn test_denormalize_name() {
        assert_eq!(denormalize_name("employee"), "EMPLOYEE");
        assert_eq!(denormalize_name("MixedCase"), "MixedCase");
        assert_eq!(denormalize_name("order"), "order");
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal("O'Brien"), "'O''Brien'");
    }
}
