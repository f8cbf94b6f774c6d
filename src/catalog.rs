/// Catalog Module
///
/// Manifest-driven schema maintenance: dropping the known objects for a
/// reset, verifying that the expected tables exist after a run, and
/// reporting per-table row counts. The manifest is supplied by
/// configuration rather than baked into the runner.
use crate::core::db::query::StatementExecutor;
use crate::core::{FreightError, Result};
use serde::{Deserialize, Serialize};

/// Ordered table and view names for one application schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaManifest {
    pub tables: Vec<String>,
    pub views: Vec<String>,
}

impl SchemaManifest {
    /// The schema objects behind the freight brokerage app.
    pub fn freight_default() -> Self {
        SchemaManifest {
            tables: vec![
                "shipments".to_string(),
                "emails".to_string(),
                "quotes".to_string(),
                "chat_messages".to_string(),
                "tracking_events".to_string(),
            ],
            views: vec!["active_shipments".to_string(), "shipment_inbox".to_string()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.views.is_empty()
    }
}

/// Quotes a name as a Postgres identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Drops every manifest table and view as one multi-statement batch.
///
/// `IF EXISTS` makes the batch idempotent and `CASCADE` leaves dependent
/// objects (foreign keys, views) to the engine, so the manifest order does
/// not need to encode drop dependencies.
pub async fn drop_objects(
    executor: &mut impl StatementExecutor,
    manifest: &SchemaManifest,
) -> Result<()> {
    if manifest.is_empty() {
        return Ok(());
    }

    let mut batch = String::new();
    for table in &manifest.tables {
        batch.push_str(&format!(
            "DROP TABLE IF EXISTS {} CASCADE;\n",
            quote_ident(table)
        ));
    }
    for view in &manifest.views {
        batch.push_str(&format!(
            "DROP VIEW IF EXISTS {} CASCADE;\n",
            quote_ident(view)
        ));
    }

    executor.run_batch(&batch).await
}

/// What table verification found.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    /// Base tables present in the public schema, alphabetically
    pub found: Vec<String>,
    /// Expected names with no matching table, in expected order
    pub missing: Vec<String>,
}

impl VerifyReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

const LIST_TABLES_SQL: &str = "SELECT table_name \
     FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
     ORDER BY table_name";

/// Lists base tables in the public schema and reports which expected names
/// are absent. A mismatch is information for the caller, not an error.
pub async fn verify_tables(
    executor: &mut impl StatementExecutor,
    expected: &[String],
) -> Result<VerifyReport> {
    let output = executor.run_sql(LIST_TABLES_SQL).await?;

    let found: Vec<String> = output
        .rows
        .iter()
        .filter_map(|row| row.first().cloned())
        .collect();
    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !found.contains(name))
        .cloned()
        .collect();

    Ok(VerifyReport { found, missing })
}

/// One table's row count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: i64,
}

/// Counts rows in every listed table with a single query (one sub-select
/// per table). The whole call fails when any table is missing; there are
/// no partial counts.
pub async fn count_rows(
    executor: &mut impl StatementExecutor,
    tables: &[String],
) -> Result<Vec<TableCount>> {
    if tables.is_empty() {
        return Ok(Vec::new());
    }

    let selects: Vec<String> = tables
        .iter()
        .map(|table| {
            format!(
                "(SELECT COUNT(*) FROM {ident}) AS {ident}",
                ident = quote_ident(table)
            )
        })
        .collect();
    let sql = format!("SELECT {}", selects.join(", "));

    let output = executor.run_sql(&sql).await?;
    let row = output
        .rows
        .first()
        .ok_or_else(|| FreightError::Catalog("row count query returned no rows".to_string()))?;
    if row.len() != tables.len() {
        return Err(FreightError::Catalog(format!(
            "row count query returned {} columns for {} tables",
            row.len(),
            tables.len()
        )));
    }

    tables
        .iter()
        .zip(row.iter())
        .map(|(table, value)| {
            let rows = value.parse::<i64>().map_err(|_| {
                FreightError::Catalog(format!("unexpected count for {}: {}", table, value))
            })?;
            Ok(TableCount {
                table: table.clone(),
                rows,
            })
        })
        .collect()
}
