/// Statement Execution Module
///
/// This module defines the execution contract between the runner/catalog
/// layers and the database: one SQL statement in, rows (as display strings)
/// out, or a driver error. Keeping the contract behind a trait lets tests
/// exercise the runner with a scripted stand-in instead of a live server.
use crate::core::db::connection::PgExecutor;
use crate::core::Result;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Column, Executor, Row, TypeInfo};

/// Represents the result of a SQL statement execution
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    /// Column names from the query result
    pub columns: Vec<String>,
    /// Rows of data as string values
    pub rows: Vec<Vec<String>>,
    /// Number of rows returned
    pub row_count: usize,
}

impl QueryOutput {
    /// Creates a new QueryOutput from column names and row data
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let row_count = rows.len();
        QueryOutput {
            columns,
            rows,
            row_count,
        }
    }
}

/// The execution seam a migration run operates against.
///
/// A run owns exactly one implementor for its whole duration; statements are
/// submitted strictly one at a time. `run_batch` exists for the reset path,
/// which sends its DROP statements as a single multi-statement round trip.
#[async_trait]
pub trait StatementExecutor: Send {
    /// Executes a single SQL statement and returns its rows.
    async fn run_sql(&mut self, sql: &str) -> Result<QueryOutput>;

    /// Executes a multi-statement SQL batch, discarding any rows.
    async fn run_batch(&mut self, sql: &str) -> Result<()>;
}

#[async_trait]
impl StatementExecutor for PgExecutor {
    async fn run_sql(&mut self, sql: &str) -> Result<QueryOutput> {
        let rows = sqlx::query(sql).fetch_all(self.connection()).await?;

        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| (0..row.len()).map(|i| format_cell(row, i)).collect())
            .collect();

        Ok(QueryOutput::new(columns, rows))
    }

    async fn run_batch(&mut self, sql: &str) -> Result<()> {
        // Plain string execution goes over the simple query protocol, which
        // accepts multiple statements in one round trip.
        self.connection().execute(sql).await?;
        Ok(())
    }
}

/// Formats a Postgres value for display
///
/// Decoding is attempted against the handful of types the tool actually
/// reads back (catalog names, counts, probe timestamps); anything else is
/// rendered as its type name.
fn format_cell(row: &PgRow, idx: usize) -> String {
    if let Ok(value) = row.try_get::<Option<i64>, _>(idx) {
        return render_nullable(value);
    }
    if let Ok(value) = row.try_get::<Option<i32>, _>(idx) {
        return render_nullable(value);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(idx) {
        return render_nullable(value);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(idx) {
        return render_nullable(value);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(idx) {
        return value.unwrap_or_else(|| "NULL".to_string());
    }
    if let Ok(value) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx) {
        return value.map_or_else(|| "NULL".to_string(), |v| v.to_rfc3339());
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return render_nullable(value);
    }
    format!("<{}>", row.column(idx).type_info().name())
}

fn render_nullable<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "NULL".to_string(), |v| v.to_string())
}
