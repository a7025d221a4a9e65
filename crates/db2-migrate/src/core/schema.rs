//! Schema and metadata types for tables, columns and constraints.
//!
//! These are the values passed between the migration engine, the catalog
//! inspector and the orchestrator. None of them are cached: every catalog
//! fragment is read fresh for the operation that needs it.

use serde::{Deserialize, Serialize};

use crate::core::identifier::qualify_db2;
use crate::error::Result;

/// A table name with an optional schema.
///
/// When the schema is absent the connection's `CURRENT SCHEMA` applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    /// Schema name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Table name.
    pub name: String,
}

impl TableRef {
    /// Create a reference to a table in the current schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Create a reference to a table in an explicit schema.
    pub fn in_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Build a reference from a table name and an optional schema.
    pub fn with_schema(name: impl Into<String>, schema: Option<String>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }

    /// Schema as a string slice.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Get the display name (`schema.table` or `table`).
    pub fn full_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// Render the table name for DDL, quoting parts only where required.
    pub fn qualified(&self) -> Result<String> {
        qualify_db2(self.schema(), &self.name)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Declared type of a column.
///
/// Enumerated types are stored as `VARCHAR` with a check constraint named
/// after the enum, so changing such a column's type must clean that
/// constraint up first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnType {
    /// A plain SQL type, rendered verbatim (`INTEGER`, `VARCHAR(40)`, ...).
    Plain(String),
    /// An enumerated type backed by a named check constraint.
    Enum {
        /// Enum (and check constraint) name.
        name: String,
        /// Allowed values.
        values: Vec<String>,
    },
}

impl ColumnType {
    /// Create a plain SQL type.
    pub fn plain(sql: impl Into<String>) -> Self {
        ColumnType::Plain(sql.into())
    }

    /// Create an enumerated type.
    pub fn enumeration(name: impl Into<String>, values: &[&str]) -> Self {
        ColumnType::Enum {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Name of the backing check constraint for enumerated types.
    pub fn enum_name(&self) -> Option<&str> {
        match self {
            ColumnType::Enum { name, .. } => Some(name),
            ColumnType::Plain(_) => None,
        }
    }
}

/// A server default change requested by an ALTER COLUMN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerDefault {
    /// Set the default to a SQL expression (rendered verbatim).
    Expression(String),
    /// Remove the default.
    Drop,
}

/// Definition of a column to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,

    /// Column type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Whether the column accepts NULL.
    #[serde(default = "default_true")]
    pub nullable: bool,

    /// Whether the column is (part of) the primary key.
    #[serde(default)]
    pub primary_key: bool,

    /// Server default expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_default: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ColumnSpec {
    /// Create a nullable, non-key column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary_key: false,
            server_default: None,
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark the column as a primary key member.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Set a server default expression.
    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.server_default = Some(expr.into());
        self
    }
}

/// Foreign key metadata as read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,

    /// Schema of the constrained (child) table.
    pub constrained_schema: Option<String>,

    /// Constrained (child) table name.
    pub constrained_table: String,

    /// Constrained column names, in key order.
    pub constrained_columns: Vec<String>,

    /// Schema of the referred (parent) table.
    pub referred_schema: Option<String>,

    /// Referred (parent) table name.
    pub referred_table: String,

    /// Referred column names, in key order.
    pub referred_columns: Vec<String>,
}

impl ForeignKey {
    /// The table that owns the constraint.
    pub fn constrained(&self) -> TableRef {
        TableRef::with_schema(&self.constrained_table, self.constrained_schema.clone())
    }

    /// The table the constraint points to.
    pub fn referred(&self) -> TableRef {
        TableRef::with_schema(&self.referred_table, self.referred_schema.clone())
    }

    /// Produce a copy of this key with `old` renamed to `new_name`.
    ///
    /// Table names are compared case-insensitively. A side whose schema is
    /// known only matches when it agrees with the schema of `old` (if that is
    /// known too).
    pub fn with_renamed_table(&self, old: &TableRef, new_name: &str) -> ForeignKey {
        let old_name = old.name.to_lowercase();
        let matches = |schema: &Option<String>, table: &str| {
            let schema_ok = match (schema, &old.schema) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => true,
            };
            schema_ok && table.to_lowercase() == old_name
        };

        let mut renamed = self.clone();
        if matches(&self.constrained_schema, &self.constrained_table) {
            renamed.constrained_table = new_name.to_string();
        }
        if matches(&self.referred_schema, &self.referred_table) {
            renamed.referred_table = new_name.to_string();
        }
        renamed
    }
}

/// Unique constraint metadata (true constraints only, not unique indexes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraint {
    /// Constraint name.
    pub name: String,

    /// Constrained column names.
    pub columns: Vec<String>,
}

/// Kind of table constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
}

/// A constraint to be dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint name (primary keys may be unnamed).
    #[serde(default)]
    pub name: Option<String>,

    /// Constraint kind.
    pub kind: ConstraintKind,

    /// Owning table.
    pub table: TableRef,

    /// Constrained columns, when known.
    #[serde(default)]
    pub columns: Vec<String>,
}

impl Constraint {
    /// Create a named constraint on a table.
    pub fn new(name: impl Into<String>, kind: ConstraintKind, table: TableRef) -> Self {
        Self {
            name: Some(name.into()),
            kind,
            table,
            columns: Vec::new(),
        }
    }

    /// The primary key of a table.
    pub fn primary_key(table: TableRef) -> Self {
        Self {
            name: None,
            kind: ConstraintKind::PrimaryKey,
            table,
            columns: Vec::new(),
        }
    }
}

/// A table flagged by the server as needing reorganization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReorg {
    /// Schema name, as stored in the catalog.
    pub schema: String,

    /// Table name, as stored in the catalog.
    pub table: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_fk() -> ForeignKey {
        ForeignKey {
            name: "fk_order_customer".to_string(),
            constrained_schema: Some("app".to_string()),
            constrained_table: "orders".to_string(),
            constrained_columns: vec!["customer_id".to_string()],
            referred_schema: Some("app".to_string()),
            referred_table: "customer".to_string(),
            referred_columns: vec!["id".to_string()],
        }
    }

    #[test]
    fn test_table_ref_names() {
        let table = TableRef::in_schema("app", "invoice");
        assert_eq!(table.full_name(), "app.invoice");
        assert_eq!(table.qualified().unwrap(), "app.invoice");
        assert_eq!(TableRef::new("Invoice").qualified().unwrap(), "\"Invoice\"");
    }

    #[test]
    fn test_enum_name() {
        let status = ColumnType::enumeration("order_status", &["new", "shipped"]);
        assert_eq!(status.enum_name(), Some("order_status"));
        assert_eq!(ColumnType::plain("INTEGER").enum_name(), None);
    }

    #[test]
    fn test_fk_rename_parent_side() {
        let fk = order_fk();
        let renamed = fk.with_renamed_table(&TableRef::in_schema("app", "CUSTOMER"), "client");
        assert_eq!(renamed.referred_table, "client");
        assert_eq!(renamed.constrained_table, "orders");
        // input is left unchanged
        assert_eq!(fk.referred_table, "customer");
    }

    #[test]
    fn test_fk_rename_child_side() {
        let renamed = order_fk().with_renamed_table(&TableRef::new("orders"), "purchase");
        assert_eq!(renamed.constrained_table, "purchase");
        assert_eq!(renamed.referred_table, "customer");
    }

    #[test]
    fn test_fk_rename_other_schema_untouched() {
        let renamed = order_fk().with_renamed_table(&TableRef::in_schema("hr", "customer"), "client");
        assert_eq!(renamed, order_fk());
    }

    #[test]
    fn test_self_referencing_fk_renames_both_sides() {
        let fk = ForeignKey {
            name: "fk_emp_manager".to_string(),
            constrained_schema: None,
            constrained_table: "employee".to_string(),
            constrained_columns: vec!["manager_id".to_string()],
            referred_schema: None,
            referred_table: "employee".to_string(),
            referred_columns: vec!["id".to_string()],
        };
        let renamed = fk.with_renamed_table(&TableRef::new("employee"), "staff");
        assert_eq!(renamed.constrained_table, "staff");
        assert_eq!(renamed.referred_table, "staff");
    }

    #[test]
    fn test_column_spec_yaml() {
        let yaml = r#"
name: status
type:
  name: order_status
  values: [new, shipped]
nullable: false
"#;
        let spec: ColumnSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.column_type.enum_name(), Some("order_status"));
        assert!(!spec.nullable);
        assert!(!spec.primary_key);

        let plain: ColumnSpec = serde_yaml::from_str("name: id\ntype: INTEGER\n").unwrap();
        assert_eq!(plain.column_type, ColumnType::plain("INTEGER"));
        assert!(plain.nullable);
    }
}
