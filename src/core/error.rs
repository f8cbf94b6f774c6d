/// freightdb Error Module
///
/// This module defines the error types used across freightdb. It provides
/// structured error handling with proper error propagation and
/// user-friendly error messages.
use thiserror::Error;

/// Error type covering every failure scenario in freightdb:
/// - Configuration resolution (missing connection string, bad TOML)
/// - Script loading (missing or unreadable SQL files)
/// - Database operations (connectivity, statement execution)
/// - Transaction bracketing in atomic runs
/// - Catalog queries (verification, row counts)
#[derive(Error, Debug)]
pub enum FreightError {
    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A SQL script file could not be read
    #[error("Script error: {path}: {source}")]
    Script {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Database-related errors from the Postgres driver
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Transaction-related errors (atomic-mode BEGIN/COMMIT/ROLLBACK)
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Catalog-related errors (verification and row-count queries)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors for structured report output
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result to use FreightError as the error type.
///
/// This provides a consistent error type across the entire application
/// instead of using `Result<T, String>` or mixed error types.
pub type Result<T> = std::result::Result<T, FreightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = FreightError::Config("DATABASE_URL is not set".to_string());
        assert!(config_err.to_string().contains("Configuration error"));

        let catalog_err = FreightError::Catalog("unexpected row shape".to_string());
        assert!(catalog_err.to_string().contains("Catalog error"));

        let tx_err = FreightError::Transaction("COMMIT failed".to_string());
        assert!(tx_err.to_string().contains("Transaction error"));
    }

    #[test]
    fn test_script_error_names_the_file() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = FreightError::Script {
            path: "database/schema.sql".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("database/schema.sql"));
    }

    #[test]
    fn test_error_conversion() {
        // Test IO error conversion
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let freight_err: FreightError = io_err.into();
        match freight_err {
            FreightError::Io(_) => {}
            _ => panic!("Expected IO error"),
        }

        // Test JSON error conversion
        let json_str = "{ invalid json }";
        let json_err: std::result::Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str(json_str);
        let freight_err: FreightError = json_err.unwrap_err().into();
        match freight_err {
            FreightError::Json(_) => {}
            _ => panic!("Expected JSON error"),
        }
    }
}
