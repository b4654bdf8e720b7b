//! # schema-diff
//!
//! Cross-engine database schema differencing library.
//!
//! Given two live databases of the same engine family (PostgreSQL, MySQL,
//! SQL Server, or SQLite), this library introspects their structural
//! metadata, computes a normalized diff, and synthesizes a forward migration
//! script plus a structured report:
//!
//! - **Normalized schema model** shared by all four engines
//! - **Engine back-ends** reading each catalog into that model
//! - **Deterministic comparison** at table, column, constraint, and index
//!   granularity
//! - **Migration synthesis** in the engine's DDL dialect
//!
//! ## Example
//!
//! ```rust,no_run
//! use schema_diff::{DatabaseType, DiffConfig, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), schema_diff::DiffError> {
//!     let config = DiffConfig::new(
//!         "sqlite:source.db",
//!         "sqlite:target.db",
//!         DatabaseType::Sqlite,
//!         "schema_migration_20240301_120000",
//!     );
//!     let outcome = Orchestrator::new(config)?.run(CancellationToken::new()).await?;
//!     println!("{} differences", outcome.comparison.summary.differences_found);
//!     Ok(())
//! }
//! ```

pub mod compare;
pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod migrate;
pub mod orchestrator;
pub mod report;

// Re-exports for convenient access
pub use compare::{
    compare, DiffSummary, ModifiedColumn, ModifiedConstraint, ModifiedIndex, SchemaComparison,
    TableDiff,
};
pub use config::DiffConfig;
pub use crate::core::schema::{Column, Constraint, ConstraintKind, Index, Schema, Table, View};
pub use crate::core::traits::{DatabaseType, ReadOptions, SchemaReader};
pub use crate::core::validate::validate_schema;
pub use drivers::SchemaReaderImpl;
pub use error::{DiffError, Result};
pub use migrate::synthesize;
pub use orchestrator::{DiffOutcome, Orchestrator};
pub use report::{Report, ReportMetadata};
