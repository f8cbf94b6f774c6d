/// Report Rendering Module
///
/// Human-readable summaries for the terminal plus JSON lines for
/// automation. The human output is the default; `--json` additionally
/// emits each report as one self-describing JSON object per line.
use crate::catalog::{TableCount, VerifyReport};
use crate::core::Result;
use crate::runner::RunReport;
use serde::Serialize;
use serde_json::{json, Value};

pub fn render_run(report: &RunReport) -> String {
    let mut out = String::new();
    match &report.failed {
        None => {
            out.push_str(&format!(
                "{}: {}/{} statements applied\n",
                report.script, report.succeeded, report.total_statements
            ));
        }
        Some(failure) => {
            out.push_str(&format!(
                "{}: failed at statement {} of {}\n",
                report.script,
                failure.index + 1,
                report.total_statements
            ));
            out.push_str(&format!("  error: {}\n", failure.message));
            out.push_str(&format!("  statement: {}\n", failure.excerpt));
            out.push_str(&format!(
                "  {}/{} statements applied\n",
                report.succeeded, report.total_statements
            ));
        }
    }
    out
}

pub fn render_verify(report: &VerifyReport) -> String {
    let mut out = format!("Found {} tables:\n", report.found.len());
    for table in &report.found {
        out.push_str(&format!("   - {}\n", table));
    }
    if !report.missing.is_empty() {
        out.push_str(&format!("Missing tables: {}\n", report.missing.join(", ")));
    }
    out
}

pub fn render_counts(counts: &[TableCount]) -> String {
    let mut out = String::from("Row counts:\n");
    let width = counts.iter().map(|c| c.table.len()).max().unwrap_or(0);
    for count in counts {
        out.push_str(&format!(
            "   {:width$}  {}\n",
            count.table,
            count.rows,
            width = width
        ));
    }
    out
}

/// Serializes a report as one JSON line tagged with its kind.
pub fn json_line<T: Serialize>(kind: &str, value: &T) -> Result<String> {
    let mut value = serde_json::to_value(value)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("kind".to_string(), Value::String(kind.to_string()));
        Ok(value.to_string())
    } else {
        Ok(json!({ "kind": kind, "data": value }).to_string())
    }
}
