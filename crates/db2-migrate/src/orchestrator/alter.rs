//! Column alteration and column addition.
//!
//! DB2 cannot change several column attributes in one statement, and it
//! refuses to retype or rename a primary key column while the key exists.
//! Both operations therefore split the request into single-attribute
//! statements and rebuild the primary key around them when needed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::Orchestrator;
use crate::core::ddl::DdlElement;
use crate::core::schema::{ColumnSpec, ColumnType, ServerDefault, TableRef};
use crate::error::Result;

/// A request to change one column.
///
/// Only the attributes that are `Some` are changed. The `existing_*` fields
/// describe the column as it is today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterColumn {
    /// Owning table.
    pub table: TableRef,

    /// Column to alter.
    pub column: String,

    /// New nullability.
    #[serde(default)]
    pub nullable: Option<bool>,

    /// New server default, or `Drop` to remove it.
    #[serde(default)]
    pub server_default: Option<ServerDefault>,

    /// New column name.
    #[serde(default)]
    pub new_name: Option<String>,

    /// New column type.
    #[serde(default)]
    pub new_type: Option<ColumnType>,

    /// Current column type.
    #[serde(default)]
    pub existing_type: Option<ColumnType>,

    /// Current server default.
    #[serde(default)]
    pub existing_server_default: Option<String>,

    /// Current nullability.
    #[serde(default)]
    pub existing_nullable: Option<bool>,

    /// MySQL-only hint; ignored with a warning.
    #[serde(default)]
    pub autoincrement: Option<bool>,

    /// MySQL-only hint; ignored with a warning.
    #[serde(default)]
    pub existing_autoincrement: Option<bool>,
}

impl AlterColumn {
    /// Create a request that changes nothing yet.
    pub fn new(table: TableRef, column: impl Into<String>) -> Self {
        Self {
            table,
            column: column.into(),
            nullable: None,
            server_default: None,
            new_name: None,
            new_type: None,
            existing_type: None,
            existing_server_default: None,
            existing_nullable: None,
            autoincrement: None,
            existing_autoincrement: None,
        }
    }

    /// Set or clear NOT NULL.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Set or drop the server default.
    pub fn server_default(mut self, default: ServerDefault) -> Self {
        self.server_default = Some(default);
        self
    }

    /// Rename the column.
    pub fn rename_to(mut self, new_name: impl Into<String>) -> Self {
        self.new_name = Some(new_name.into());
        self
    }

    /// Change the column type.
    pub fn retype(mut self, new_type: ColumnType) -> Self {
        self.new_type = Some(new_type);
        self
    }

    /// Record the current type, used for enum check cleanup.
    pub fn existing_type(mut self, existing_type: ColumnType) -> Self {
        self.existing_type = Some(existing_type);
        self
    }

    /// Whether the primary key has to be inspected for this request.
    fn touches_key(&self) -> bool {
        self.new_name.is_some() || self.new_type.is_some()
    }
}

/// Position of `column` in the key, compared case-insensitively.
fn key_position(key: &[String], column: &str) -> Option<usize> {
    key.iter().position(|c| c.eq_ignore_ascii_case(column))
}

impl Orchestrator {
    /// Alter a column, one attribute per statement.
    ///
    /// Order: nullability, default, type, name. If the column belongs to the
    /// primary key and is retyped or renamed, the key is dropped before the
    /// first such statement and recreated (same column order, renamed column
    /// in place) after the last one.
    pub async fn alter_column(&self, request: &AlterColumn) -> Result<()> {
        let table = &request.table;
        let column = request.column.as_str();

        if request.autoincrement.is_some() || request.existing_autoincrement.is_some() {
            warn!(
                "autoincrement and existing_autoincrement only make sense for MySQL (ignored for {}.{})",
                table, column
            );
        }

        let mut key = if request.touches_key() {
            self.inspector.primary_key_columns(table).await?
        } else {
            Vec::new()
        };
        let mut key_dropped = false;

        if let Some(nullable) = request.nullable {
            self.execute(DdlElement::ColumnNullable {
                table: table.clone(),
                column: column.to_string(),
                nullable,
            })
            .await?;
        }

        if let Some(default) = &request.server_default {
            self.execute(DdlElement::ColumnDefault {
                table: table.clone(),
                column: column.to_string(),
                default: default.clone(),
            })
            .await?;
        }

        if let Some(new_type) = &request.new_type {
            self.drop_enum_checks(table, request.existing_type.as_ref(), new_type)
                .await?;

            if let Some(pos) = key_position(&key, column) {
                self.execute(self.dialect.drop_primary_key_sql(table)?).await?;
                key_dropped = true;

                if self.inspector.is_identity_column(table, column).await? {
                    self.execute(self.dialect.drop_identity_sql(table, column)?)
                        .await?;
                }
                if let Some(new_name) = &request.new_name {
                    key[pos] = new_name.clone();
                }
            }

            self.execute(DdlElement::ColumnType {
                table: table.clone(),
                column: column.to_string(),
                column_type: new_type.clone(),
            })
            .await?;
        }

        if let Some(new_name) = &request.new_name {
            if !key_dropped {
                if let Some(pos) = key_position(&key, column) {
                    self.execute(self.dialect.drop_primary_key_sql(table)?).await?;
                    key_dropped = true;
                    key[pos] = new_name.clone();
                }
            }

            self.execute(DdlElement::ColumnName {
                table: table.clone(),
                column: column.to_string(),
                new_name: new_name.clone(),
            })
            .await?;
        }

        if key_dropped {
            self.execute(self.dialect.add_primary_key_sql(table, &key)?)
                .await?;
            info!("Rebuilt primary key on {} ({})", table, key.join(", "));
        }

        Ok(())
    }

    /// Drop the check constraints backing enumerated types before a retype.
    ///
    /// Only constraints the catalog reports are dropped.
    async fn drop_enum_checks(
        &self,
        table: &TableRef,
        existing: Option<&ColumnType>,
        new_type: &ColumnType,
    ) -> Result<()> {
        let mut names: Vec<&str> = Vec::new();
        for name in [existing.and_then(|t| t.enum_name()), new_type.enum_name()]
            .into_iter()
            .flatten()
        {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name);
            }
        }

        for name in names {
            if self.inspector.check_constraint_exists(table, name).await? {
                self.execute(self.dialect.drop_check_sql(table, name)?).await?;
            } else {
                debug!("no check constraint {} on {}", name, table);
            }
        }
        Ok(())
    }

    /// Add a column.
    ///
    /// The column is always added nullable and without a key; NOT NULL and
    /// PRIMARY KEY follow as separate statements. A primary key column
    /// replaces whatever primary key the table had.
    pub async fn add_column(&self, table: &TableRef, column: &ColumnSpec) -> Result<()> {
        let mut relaxed = column.clone();
        relaxed.nullable = true;
        relaxed.primary_key = false;

        self.execute(DdlElement::AddColumn {
            table: table.clone(),
            column: relaxed,
        })
        .await?;

        if !column.nullable {
            self.execute(DdlElement::ColumnNullable {
                table: table.clone(),
                column: column.name.clone(),
                nullable: false,
            })
            .await?;
        }

        if column.primary_key {
            let existing = self.inspector.primary_key_columns(table).await?;
            if !existing.is_empty() {
                if existing.len() > 1 {
                    warn!(
                        "Replacing composite primary key ({}) on {} with ({})",
                        existing.join(", "),
                        table,
                        column.name
                    );
                }
                self.execute(self.dialect.drop_primary_key_sql(table)?).await?;

                if self.inspector.is_identity_column(table, &column.name).await? {
                    self.execute(self.dialect.drop_identity_sql(table, &column.name)?)
                        .await?;
                }
            }

            self.execute(
                self.dialect
                    .add_primary_key_sql(table, std::slice::from_ref(&column.name))?,
            )
            .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::orchestrator;
    use crate::testing::{MockConnection, StaticInspector};

    fn orders() -> TableRef {
        TableRef::in_schema("app", "orders")
    }

    #[tokio::test]
    async fn test_noop_request_issues_nothing() {
        let (orch, conn, inspector) = orchestrator(MockConnection::new(), StaticInspector::new());

        orch.alter_column(&AlterColumn::new(orders(), "qty"))
            .await
            .unwrap();

        assert!(conn.executed().is_empty());
        assert!(inspector.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_autoincrement_hint_only_warns() {
        let (orch, conn, _) = orchestrator(MockConnection::new(), StaticInspector::new());

        let mut request = AlterColumn::new(orders(), "id");
        request.autoincrement = Some(true);
        orch.alter_column(&request).await.unwrap();

        assert!(conn.executed().is_empty());
    }

    #[tokio::test]
    async fn test_attribute_order() {
        let (orch, conn, _) = orchestrator(MockConnection::new(), StaticInspector::new());

        orch.alter_column(
            &AlterColumn::new(orders(), "qty")
                .nullable(false)
                .server_default(ServerDefault::Expression("0".to_string()))
                .retype(ColumnType::plain("BIGINT"))
                .rename_to("quantity"),
        )
        .await
        .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "ALTER TABLE app.orders ALTER COLUMN qty SET NOT NULL",
                "ALTER TABLE app.orders ALTER COLUMN qty SET DEFAULT 0",
                "ALTER TABLE app.orders ALTER COLUMN qty SET DATA TYPE BIGINT",
                "ALTER TABLE app.orders RENAME COLUMN qty TO quantity",
            ]
        );
        assert_eq!(conn.reorg_queries(), 4);
    }

    #[tokio::test]
    async fn test_drop_default() {
        let (orch, conn, _) = orchestrator(MockConnection::new(), StaticInspector::new());

        orch.alter_column(&AlterColumn::new(orders(), "note").server_default(ServerDefault::Drop))
            .await
            .unwrap();

        assert_eq!(
            conn.statements(),
            vec!["ALTER TABLE app.orders ALTER COLUMN note DROP DEFAULT"]
        );
    }

    #[tokio::test]
    async fn test_retype_key_column_rebuilds_key() {
        let (orch, conn, _) = orchestrator(
            MockConnection::new(),
            StaticInspector::new().with_primary_key(&["id"]),
        );

        orch.alter_column(&AlterColumn::new(orders(), "ID").retype(ColumnType::plain("BIGINT")))
            .await
            .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "ALTER TABLE app.orders DROP PRIMARY KEY",
                "ALTER TABLE app.orders ALTER COLUMN \"ID\" SET DATA TYPE BIGINT",
                "ALTER TABLE app.orders ADD PRIMARY KEY (id)",
            ]
        );
    }

    #[tokio::test]
    async fn test_retype_identity_key_column() {
        let (orch, conn, _) = orchestrator(
            MockConnection::new(),
            StaticInspector::new()
                .with_primary_key(&["id"])
                .with_identity("id"),
        );

        orch.alter_column(&AlterColumn::new(orders(), "id").retype(ColumnType::plain("BIGINT")))
            .await
            .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "ALTER TABLE app.orders DROP PRIMARY KEY",
                "ALTER TABLE app.orders ALTER COLUMN id DROP IDENTITY",
                "ALTER TABLE app.orders ALTER COLUMN id SET DATA TYPE BIGINT",
                "ALTER TABLE app.orders ADD PRIMARY KEY (id)",
            ]
        );
    }

    #[tokio::test]
    async fn test_retype_and_rename_key_column_keeps_key_order() {
        let (orch, conn, _) = orchestrator(
            MockConnection::new(),
            StaticInspector::new().with_primary_key(&["region", "order_no", "line"]),
        );

        orch.alter_column(
            &AlterColumn::new(orders(), "order_no")
                .retype(ColumnType::plain("BIGINT"))
                .rename_to("order_id"),
        )
        .await
        .unwrap();

        let statements = conn.statements();
        assert_eq!(
            statements
                .iter()
                .filter(|s| s.contains("DROP PRIMARY KEY"))
                .count(),
            1
        );
        assert_eq!(
            statements.last().map(String::as_str),
            Some("ALTER TABLE app.orders ADD PRIMARY KEY (region, order_id, line)")
        );
        assert_eq!(statements.len(), 4);
    }

    #[tokio::test]
    async fn test_rename_key_column_rebuilds_key() {
        let (orch, conn, inspector) = orchestrator(
            MockConnection::new(),
            StaticInspector::new().with_primary_key(&["id", "line"]),
        );

        orch.alter_column(&AlterColumn::new(orders(), "line").rename_to("line_no"))
            .await
            .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "ALTER TABLE app.orders DROP PRIMARY KEY",
                "ALTER TABLE app.orders RENAME COLUMN line TO line_no",
                "ALTER TABLE app.orders ADD PRIMARY KEY (id, line_no)",
            ]
        );
        assert!(!inspector
            .lookups()
            .contains(&"is_identity_column".to_string()));
    }

    #[tokio::test]
    async fn test_non_key_column_leaves_key_alone() {
        let (orch, conn, _) = orchestrator(
            MockConnection::new(),
            StaticInspector::new().with_primary_key(&["id"]),
        );

        orch.alter_column(
            &AlterColumn::new(orders(), "note")
                .retype(ColumnType::plain("VARCHAR(200)"))
                .rename_to("remark"),
        )
        .await
        .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "ALTER TABLE app.orders ALTER COLUMN note SET DATA TYPE VARCHAR(200)",
                "ALTER TABLE app.orders RENAME COLUMN note TO remark",
            ]
        );
    }

    #[tokio::test]
    async fn test_enum_check_dropped_when_present() {
        let (orch, conn, _) = orchestrator(
            MockConnection::new(),
            StaticInspector::new().with_check("order_status"),
        );

        orch.alter_column(
            &AlterColumn::new(orders(), "status")
                .existing_type(ColumnType::enumeration("order_status", &["new", "paid"]))
                .retype(ColumnType::enumeration(
                    "order_status",
                    &["new", "paid", "cancelled"],
                )),
        )
        .await
        .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "ALTER TABLE app.orders DROP CHECK order_status",
                "ALTER TABLE app.orders ALTER COLUMN status SET DATA TYPE VARCHAR(9)",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_enum_check_is_skipped() {
        let (orch, conn, inspector) =
            orchestrator(MockConnection::new(), StaticInspector::new());

        orch.alter_column(
            &AlterColumn::new(orders(), "status")
                .retype(ColumnType::enumeration("order_status", &["new", "paid"])),
        )
        .await
        .unwrap();

        assert_eq!(
            conn.statements(),
            vec!["ALTER TABLE app.orders ALTER COLUMN status SET DATA TYPE VARCHAR(4)"]
        );
        assert!(inspector
            .lookups()
            .contains(&"check_constraint_exists".to_string()));
    }

    #[tokio::test]
    async fn test_failure_stops_the_sequence() {
        let (orch, conn, _) = orchestrator(
            MockConnection::new().fail_on("SET DATA TYPE"),
            StaticInspector::new().with_primary_key(&["id"]),
        );

        let result = orch
            .alter_column(&AlterColumn::new(orders(), "id").retype(ColumnType::plain("BIGINT")))
            .await;

        assert!(result.is_err());
        assert!(!conn
            .statements()
            .iter()
            .any(|s| s.contains("ADD PRIMARY KEY")));
    }

    #[tokio::test]
    async fn test_add_column_splits_constraints() {
        let (orch, conn, _) = orchestrator(MockConnection::new(), StaticInspector::new());

        orch.add_column(
            &orders(),
            &ColumnSpec::new("code", ColumnType::plain("CHAR(8)"))
                .not_null()
                .with_default("'NONE'"),
        )
        .await
        .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "ALTER TABLE app.orders ADD COLUMN code CHAR(8) DEFAULT 'NONE'",
                "ALTER TABLE app.orders ALTER COLUMN code SET NOT NULL",
            ]
        );
    }

    #[tokio::test]
    async fn test_add_key_column_to_table_without_key() {
        let (orch, conn, _) = orchestrator(MockConnection::new(), StaticInspector::new());

        orch.add_column(
            &orders(),
            &ColumnSpec::new("id", ColumnType::plain("INTEGER"))
                .not_null()
                .primary_key(),
        )
        .await
        .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "ALTER TABLE app.orders ADD COLUMN id INTEGER",
                "ALTER TABLE app.orders ALTER COLUMN id SET NOT NULL",
                "ALTER TABLE app.orders ADD PRIMARY KEY (id)",
            ]
        );
    }

    #[tokio::test]
    async fn test_add_key_column_replaces_existing_key() {
        let (orch, conn, _) = orchestrator(
            MockConnection::new(),
            StaticInspector::new()
                .with_primary_key(&["legacy_id", "region"])
                .with_identity("id"),
        );

        orch.add_column(
            &orders(),
            &ColumnSpec::new("id", ColumnType::plain("INTEGER"))
                .not_null()
                .primary_key(),
        )
        .await
        .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "ALTER TABLE app.orders ADD COLUMN id INTEGER",
                "ALTER TABLE app.orders ALTER COLUMN id SET NOT NULL",
                "ALTER TABLE app.orders DROP PRIMARY KEY",
                "ALTER TABLE app.orders ALTER COLUMN id DROP IDENTITY",
                "ALTER TABLE app.orders ADD PRIMARY KEY (id)",
            ]
        );
    }

    #[test]
    fn test_request_from_yaml() {
        let request: AlterColumn = serde_yaml::from_str(
            r#"
table: { schema: app, name: orders }
column: qty
new_type: BIGINT
server_default: drop
"#,
        )
        .unwrap();
        assert_eq!(request.new_type, Some(ColumnType::plain("BIGINT")));
        assert_eq!(request.server_default, Some(ServerDefault::Drop));
        assert!(request.nullable.is_none());
    }
}
