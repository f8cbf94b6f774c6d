/// # Test Utilities Module
///
/// Scripted execution infrastructure used by unit and integration tests to
/// exercise the runner and catalog layers without a live Postgres server.
///
/// This module provides:
/// - A `ScriptedExecutor` stand-in for a database session that records
///   every statement it receives
/// - Substring-keyed failure and delay injection
/// - Canned row responses for catalog queries
use crate::core::db::query::{QueryOutput, StatementExecutor};
use crate::core::{FreightError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// An in-memory stand-in for one database session.
///
/// Statements are recorded in arrival order. Failures and delays are keyed
/// on substrings of the statement text so a test can target one statement
/// out of a script.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    /// Every statement received, in arrival order
    pub calls: Vec<String>,
    fail_matching: Option<(String, String)>,
    delay_matching: Option<(String, Duration)>,
    canned: Vec<(String, QueryOutput)>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any statement containing `needle` fails with `message`.
    pub fn fail_on(mut self, needle: &str, message: &str) -> Self {
        self.fail_matching = Some((needle.to_string(), message.to_string()));
        self
    }

    /// Any statement containing `needle` sleeps for `delay` before returning.
    pub fn delay_on(mut self, needle: &str, delay: Duration) -> Self {
        self.delay_matching = Some((needle.to_string(), delay));
        self
    }

    /// Any statement containing `needle` returns `output`.
    pub fn respond_with(mut self, needle: &str, output: QueryOutput) -> Self {
        self.canned.push((needle.to_string(), output));
        self
    }

    fn injected_failure(&self, sql: &str) -> Option<FreightError> {
        self.fail_matching.as_ref().and_then(|(needle, message)| {
            sql.contains(needle.as_str())
                .then(|| FreightError::Database(sqlx::Error::Protocol(message.clone())))
        })
    }
}

#[async_trait]
impl StatementExecutor for ScriptedExecutor {
    async fn run_sql(&mut self, sql: &str) -> Result<QueryOutput> {
        self.calls.push(sql.to_string());

        if let Some((needle, delay)) = &self.delay_matching {
            if sql.contains(needle.as_str()) {
                tokio::time::sleep(*delay).await;
            }
        }
        if let Some(error) = self.injected_failure(sql) {
            return Err(error);
        }
        for (needle, output) in &self.canned {
            if sql.contains(needle.as_str()) {
                return Ok(output.clone());
            }
        }
        Ok(QueryOutput::default())
    }

    async fn run_batch(&mut self, sql: &str) -> Result<()> {
        self.calls.push(sql.to_string());
        if let Some(error) = self.injected_failure(sql) {
            return Err(error);
        }
        Ok(())
    }
}
