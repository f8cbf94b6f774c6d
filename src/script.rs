/// SQL Script Module
///
/// Loads script files and splits them into individually executable
/// statements. Splitting goes through the SQL parser first so semicolons
/// inside string literals, quoted identifiers and dollar-quoted blocks do
/// not break a statement apart; a script the parser cannot handle falls
/// back to plain textual splitting on `;`.
use crate::core::{FreightError, Result};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::fs;
use std::path::Path;

/// The raw text of one SQL file, immutable once loaded.
#[derive(Debug, Clone)]
pub struct Script {
    name: String,
    source: String,
}

impl Script {
    /// Reads a script from disk. A missing or unreadable file is an error
    /// raised before any statement executes.
    pub fn load(path: &Path) -> Result<Script> {
        let source = fs::read_to_string(path).map_err(|source| FreightError::Script {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Script { name, source })
    }

    /// Builds a script from in-memory text.
    pub fn from_source(name: &str, source: &str) -> Script {
        Script {
            name: name.to_string(),
            source: source.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The executable statements of this script, in source order.
    pub fn statements(&self) -> Vec<String> {
        split_statements(&self.source)
    }
}

/// Splits SQL text into statements.
///
/// Parses with the Postgres dialect so statement boundaries respect string
/// literals and dollar quoting. When the script does not parse (exotic DDL,
/// engine-specific syntax), falls back to [`split_textually`] so the run
/// can still proceed with the documented textual semantics.
pub fn split_statements(sql: &str) -> Vec<String> {
    match Parser::parse_sql(&PostgreSqlDialect {}, sql) {
        Ok(parsed) => parsed
            .into_iter()
            .map(|statement| statement.to_string())
            .collect(),
        Err(e) => {
            tracing::warn!("SQL parsing failed, using textual semicolon splitting: {}", e);
            split_textually(sql)
        }
    }
}

/// Splits SQL text on the statement terminator, textually.
///
/// Fragments are trimmed; fragments that are empty or begin with `--` or
/// `/*` are discarded. This does not understand terminators inside string
/// literals or comments, which is why the parser path is preferred.
pub fn split_textually(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|fragment| {
            !fragment.is_empty() && !fragment.starts_with("--") && !fragment.starts_with("/*")
        })
        .map(str::to_string)
        .collect()
}
