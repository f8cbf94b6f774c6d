/// Database Module
///
/// This module provides the database access layer for freightdb,
/// organized into focused submodules:
/// - **Connection Management** (`connection.rs`): opens the single Postgres
///   session a run owns, probes connectivity, and masks credentials for display
/// - **Statement Execution** (`query.rs`): the `StatementExecutor` seam the
///   runner and catalog operate against, plus result formatting
///
/// All database operations use the standardized `FreightError` type for
/// consistent error propagation.
pub mod connection;
pub mod query;

pub use connection::*;
pub use query::*;
