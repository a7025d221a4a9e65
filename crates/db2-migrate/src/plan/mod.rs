//! Migration plan files.
//!
//! A plan is an ordered list of [`Operation`]s in YAML:
//!
//! ```yaml
//! description: widen order quantities
//! operations:
//!   - op: alter_column
//!     table: { schema: app, name: orders }
//!     column: qty
//!     new_type: BIGINT
//!   - op: rename_table
//!     table: { schema: app, name: orders }
//!     new_name: purchase
//! ```
//!
//! Operations run in order; the first failure stops the plan. Nothing is
//! rolled back.

mod operation;

pub use operation::Operation;

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{MigrateError, Result};
use crate::orchestrator::Orchestrator;

/// A list of schema changes to apply in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Operations, in execution order.
    pub operations: Vec<Operation>,
}

/// Outcome of applying a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    /// "completed" or "failed".
    pub status: String,

    /// Operations in the plan.
    pub operations_total: usize,

    /// Operations that completed.
    pub operations_applied: usize,

    /// Statements executed, including reorg commands.
    pub statements_executed: usize,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the plan started.
    pub started_at: DateTime<Utc>,

    /// When the plan finished.
    pub completed_at: DateTime<Utc>,

    /// The failing operation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<PlanFailure>,
}

/// Where and why a plan stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFailure {
    /// Zero-based index of the failing operation.
    pub index: usize,

    /// Description of the failing operation.
    pub operation: String,

    /// Error message.
    pub error: String,

    /// Process exit code for the error category.
    pub exit_code: u8,
}

impl PlanResult {
    /// Whether every operation completed.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

impl MigrationPlan {
    /// Load a plan from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a plan from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let plan: MigrationPlan = serde_yaml::from_str(yaml)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Validate the plan.
    pub fn validate(&self) -> Result<()> {
        if self.operations.is_empty() {
            return Err(MigrateError::Plan("plan has no operations".into()));
        }
        for (index, op) in self.operations.iter().enumerate() {
            op.validate().map_err(|e| {
                MigrateError::Plan(format!("operation {} ({}): {}", index + 1, op.describe(), e))
            })?;
        }
        Ok(())
    }

    /// Apply the operations in order, stopping at the first failure.
    pub async fn apply(&self, orch: &Orchestrator) -> PlanResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let statements_before = orch.statements_executed();
        let total = self.operations.len();

        if let Some(description) = &self.description {
            info!("Applying plan: {}", description);
        }

        let mut applied = 0;
        let mut failure = None;
        for (index, op) in self.operations.iter().enumerate() {
            info!("[{}/{}] {}", index + 1, total, op.describe());
            match op.apply(orch).await {
                Ok(()) => applied += 1,
                Err(e) => {
                    error!("Operation {} failed: {}", index + 1, e);
                    failure = Some(PlanFailure {
                        index,
                        operation: op.describe(),
                        error: e.to_string(),
                        exit_code: e.exit_code(),
                    });
                    break;
                }
            }
        }

        let result = PlanResult {
            status: if failure.is_none() { "completed" } else { "failed" }.to_string(),
            operations_total: total,
            operations_applied: applied,
            statements_executed: orch.statements_executed() - statements_before,
            duration_seconds: start.elapsed().as_secs_f64(),
            started_at,
            completed_at: Utc::now(),
            failure,
        };

        info!(
            "Plan {}: {}/{} operations, {} statements in {:.2}s",
            result.status,
            result.operations_applied,
            result.operations_total,
            result.statements_executed,
            result.duration_seconds
        );
        result
    }
}
