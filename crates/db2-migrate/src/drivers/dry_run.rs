//! Dry-run connection wrapper.
//!
//! Reads go to the wrapped connection so that catalog lookups and the reorg
//! query see the live database; every other statement is recorded and logged
//! instead of being executed.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::core::traits::{Connection, DialectInfo, QueryResult};
use crate::error::Result;

/// Leading keywords of statements that only read.
const READ_ONLY_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES"];

/// [`Connection`] that passes reads through and records writes.
pub struct DryRunConnection {
    inner: Arc<dyn Connection>,
    recorded: Mutex<Vec<String>>,
}

impl DryRunConnection {
    /// Wrap a live connection.
    pub fn new(inner: Arc<dyn Connection>) -> Self {
        Self {
            inner,
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Statements that would have been executed, in order.
    pub async fn recorded(&self) -> Vec<String> {
        self.recorded.lock().await.clone()
    }
}

/// Whether a statement only reads (by its leading keyword).
pub fn is_read_only(sql: &str) -> bool {
    let keyword: String = sql
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase();
    READ_ONLY_KEYWORDS.contains(&keyword.as_str())
}

#[async_trait]
impl Connection for DryRunConnection {
    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        if is_read_only(sql) {
            return self.inner.execute(sql).await;
        }
        info!("[dry-run] {}", sql);
        self.recorded.lock().await.push(sql.to_string());
        Ok(QueryResult::empty())
    }

    async fn dialect_info(&self) -> Result<DialectInfo> {
        self.inner.dialect_info().await
    }

    fn db_type(&self) -> &str {
        "dry-run"
    }
}
