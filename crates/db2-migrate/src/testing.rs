//! Recording test doubles for the connection and catalog contracts.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::schema::{ForeignKey, TableRef, UniqueConstraint};
use crate::core::traits::{Connection, DialectInfo, QueryResult, SchemaInspector};
use crate::drivers::db2::REORG_PENDING_QUERY;
use crate::error::{MigrateError, Result};

/// Build text rows from string slices.
pub(crate) fn cells(rows: &[&[&str]]) -> Vec<Vec<Option<String>>> {
    rows.iter()
        .map(|row| row.iter().map(|c| Some(c.to_string())).collect())
        .collect()
}

/// Connection that records every statement and answers from a script.
pub(crate) struct MockConnection {
    info: DialectInfo,
    executed: Mutex<Vec<String>>,
    responses: Vec<(String, QueryResult)>,
    reorg_batches: Mutex<VecDeque<Vec<(String, String)>>>,
    failures: Vec<String>,
}

impl MockConnection {
    pub(crate) fn new() -> Self {
        Self::with_info(DialectInfo::new("DB2/LINUXX8664", "11.05.0800"))
    }

    pub(crate) fn with_info(info: DialectInfo) -> Self {
        Self {
            info,
            executed: Mutex::new(Vec::new()),
            responses: Vec::new(),
            reorg_batches: Mutex::new(VecDeque::new()),
            failures: Vec::new(),
        }
    }

    /// Answer statements containing `fragment` with `result`.
    pub(crate) fn respond(mut self, fragment: &str, result: QueryResult) -> Self {
        self.responses.push((fragment.to_string(), result));
        self
    }

    /// Queue the rows returned by the next reorg-pending query.
    pub(crate) fn pending_reorgs(self, tables: &[(&str, &str)]) -> Self {
        self.reorg_batches.lock().unwrap().push_back(
            tables
                .iter()
                .map(|(s, t)| (s.to_string(), t.to_string()))
                .collect(),
        );
        self
    }

    /// Fail statements containing `fragment`.
    pub(crate) fn fail_on(mut self, fragment: &str) -> Self {
        self.failures.push(fragment.to_string());
        self
    }

    /// Every statement received, in order.
    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// Statements received, without the reorg-pending queries.
    pub(crate) fn statements(&self) -> Vec<String> {
        self.executed()
            .into_iter()
            .filter(|sql| sql != REORG_PENDING_QUERY)
            .collect()
    }

    /// Number of reorg-pending queries received.
    pub(crate) fn reorg_queries(&self) -> usize {
        self.executed()
            .iter()
            .filter(|sql| *sql == REORG_PENDING_QUERY)
            .count()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.executed.lock().unwrap().push(sql.to_string());

        if self.failures.iter().any(|f| sql.contains(f.as_str())) {
            return Err(MigrateError::execution(
                sql,
                "SQL0204N  An undefined object or constraint name was specified.",
            ));
        }

        if sql == REORG_PENDING_QUERY {
            let batch = self.reorg_batches.lock().unwrap().pop_front();
            let rows = batch
                .unwrap_or_default()
                .into_iter()
                .map(|(s, t)| vec![Some(s), Some(t)])
                .collect();
            return Ok(QueryResult::with_rows(&["TABSCHEMA", "TABNAME"], rows));
        }

        Ok(self
            .responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_default())
    }

    async fn dialect_info(&self) -> Result<DialectInfo> {
        Ok(self.info.clone())
    }

    fn db_type(&self) -> &str {
        "mock"
    }
}

/// Catalog with fixed contents that records which lookups were made.
#[derive(Default)]
pub(crate) struct StaticInspector {
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    pub incoming: Vec<ForeignKey>,
    pub uniques: Vec<UniqueConstraint>,
    pub checks: Vec<String>,
    pub identity: Vec<String>,
    lookups: Mutex<Vec<String>>,
}

impl StaticInspector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub(crate) fn with_identity(mut self, column: &str) -> Self {
        self.identity.push(column.to_string());
        self
    }

    pub(crate) fn with_check(mut self, name: &str) -> Self {
        self.checks.push(name.to_string());
        self
    }

    pub(crate) fn with_unique(mut self, name: &str, columns: &[&str]) -> Self {
        self.uniques.push(UniqueConstraint {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub(crate) fn with_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub(crate) fn with_incoming(mut self, fk: ForeignKey) -> Self {
        self.incoming.push(fk);
        self
    }

    /// Names of the lookups made, in order.
    pub(crate) fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    fn record(&self, lookup: &str) {
        self.lookups.lock().unwrap().push(lookup.to_string());
    }
}

#[async_trait]
impl SchemaInspector for StaticInspector {
    async fn primary_key_columns(&self, _table: &TableRef) -> Result<Vec<String>> {
        self.record("primary_key_columns");
        Ok(self.primary_key.clone())
    }

    async fn foreign_keys(&self, _table: &TableRef) -> Result<Vec<ForeignKey>> {
        self.record("foreign_keys");
        Ok(self.foreign_keys.clone())
    }

    async fn incoming_foreign_keys(&self, _table: &TableRef) -> Result<Vec<ForeignKey>> {
        self.record("incoming_foreign_keys");
        Ok(self.incoming.clone())
    }

    async fn unique_constraints(&self, _table: &TableRef) -> Result<Vec<UniqueConstraint>> {
        self.record("unique_constraints");
        Ok(self.uniques.clone())
    }

    async fn check_constraint_exists(&self, _table: &TableRef, name: &str) -> Result<bool> {
        self.record("check_constraint_exists");
        Ok(self.checks.iter().any(|c| c.eq_ignore_ascii_case(name)))
    }

    async fn is_identity_column(&self, _table: &TableRef, column: &str) -> Result<bool> {
        self.record("is_identity_column");
        Ok(self.identity.iter().any(|c| c.eq_ignore_ascii_case(column)))
    }
}

/// Foreign key `name` from `child(columns)` to `parent(id)`, both in `app`.
pub(crate) fn foreign_key(name: &str, child: &str, columns: &[&str], parent: &str) -> ForeignKey {
    ForeignKey {
        name: name.to_string(),
        constrained_schema: Some("app".to_string()),
        constrained_table: child.to_string(),
        constrained_columns: columns.iter().map(|c| c.to_string()).collect(),
        referred_schema: Some("app".to_string()),
        referred_table: parent.to_string(),
        referred_columns: vec!["id".to_string(); columns.len()],
    }
}
