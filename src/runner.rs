/// Script Runner Module
///
/// Applies a script's statements to the database strictly in source order,
/// sequentially. Each statement must finish before the next starts because
/// later DDL/DML routinely depends on objects created earlier. The first
/// failing statement aborts the rest of the script; by default the
/// already-applied statements stay applied (no wrapping transaction), and
/// `atomic` mode instead brackets the whole script in one transaction that
/// rolls back on failure.
use crate::core::db::query::StatementExecutor;
use crate::core::{FreightError, Result};
use crate::script::Script;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use uuid::Uuid;

/// How long one statement may run before it is treated as failed.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum characters of a failing statement echoed into the report.
const EXCERPT_CHARS: usize = 100;

/// Runner behavior knobs, resolved from configuration.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub statement_timeout: Duration,
    pub atomic: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        RunnerOptions {
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
            atomic: false,
        }
    }
}

/// The first failure of a run, if any.
#[derive(Debug, Clone, Serialize)]
pub struct StatementFailure {
    /// Zero-based index of the failing statement within the script
    pub index: usize,
    /// Error message reported by the database driver (or the timeout)
    pub message: String,
    /// Leading characters of the offending statement text
    pub excerpt: String,
}

/// Outcome record of executing one script.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub script: String,
    pub started_at: DateTime<Utc>,
    pub total_statements: usize,
    pub succeeded: usize,
    pub failed: Option<StatementFailure>,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }
}

/// Executes scripts statement by statement against one owned session.
pub struct ScriptRunner {
    options: RunnerOptions,
}

impl ScriptRunner {
    pub fn new(options: RunnerOptions) -> Self {
        ScriptRunner { options }
    }

    /// Runs every statement of `script` in order, stopping at the first
    /// failure. Returns the report either way; only transaction bracketing
    /// problems surface as hard errors.
    pub async fn run_script(
        &self,
        executor: &mut impl StatementExecutor,
        script: &Script,
    ) -> Result<RunReport> {
        let statements = script.statements();
        let started_at = Utc::now();
        let clock = Instant::now();

        println!(
            "Running {} ({} statements)",
            script.name(),
            statements.len()
        );

        if self.options.atomic {
            executor.run_sql("BEGIN").await.map_err(|e| {
                FreightError::Transaction(format!("failed to begin transaction: {}", e))
            })?;
        }

        let mut succeeded = 0;
        let mut failed = None;

        for (index, statement) in statements.iter().enumerate() {
            match self.execute_one(executor, statement).await {
                Ok(()) => {
                    succeeded += 1;
                    println!("   ok {}/{}", index + 1, statements.len());
                }
                Err(message) => {
                    tracing::error!(index, script = script.name(), "statement failed: {}", message);
                    failed = Some(StatementFailure {
                        index,
                        message,
                        excerpt: excerpt(statement),
                    });
                    // Remaining statements are skipped; migrations are not
                    // assumed safe to retry or to continue past a failure.
                    break;
                }
            }
        }

        if self.options.atomic {
            if failed.is_none() {
                executor
                    .run_sql("COMMIT")
                    .await
                    .map_err(|e| FreightError::Transaction(format!("failed to commit: {}", e)))?;
            } else if let Err(e) = executor.run_sql("ROLLBACK").await {
                tracing::warn!("rollback after failed statement also failed: {}", e);
            }
        }

        Ok(RunReport {
            run_id: Uuid::new_v4(),
            script: script.name().to_string(),
            started_at,
            total_statements: statements.len(),
            succeeded,
            failed,
            elapsed_ms: clock.elapsed().as_millis() as u64,
        })
    }

    async fn execute_one(
        &self,
        executor: &mut impl StatementExecutor,
        statement: &str,
    ) -> std::result::Result<(), String> {
        match timeout(self.options.statement_timeout, executor.run_sql(statement)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "statement timed out after {:?}",
                self.options.statement_timeout
            )),
        }
    }
}

/// Leading characters of a statement, for failure reports.
fn excerpt(statement: &str) -> String {
    statement.chars().take(EXCERPT_CHARS).collect()
}
