//! Core abstractions for database-agnostic schema introspection.
//!
//! This module defines the primary abstraction used by the comparison engine:
//!
//! - [`SchemaReader`]: reads a full [`Schema`] snapshot from one database
//! - [`ReadOptions`]: what to retain from the catalog read
//! - [`DatabaseType`]: the supported engine family tags
//!
//! Drivers implement [`SchemaReader`]; dispatch happens once through the
//! `SchemaReaderImpl` enum in the `drivers` module, never per call.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::schema::Schema;
use crate::error::{DiffError, Result};

/// Supported database engine families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Postgres,
    MySql,
    SqlServer,
    Sqlite,
}

impl DatabaseType {
    /// Engine tag used in generated artifacts and display names.
    pub fn tag(&self) -> &'static str {
        match self {
            DatabaseType::Postgres => "postgres",
            DatabaseType::MySql => "mysql",
            DatabaseType::SqlServer => "sqlserver",
            DatabaseType::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DatabaseType {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DatabaseType::Postgres),
            "mysql" | "mariadb" => Ok(DatabaseType::MySql),
            "sqlserver" | "mssql" | "sql_server" => Ok(DatabaseType::SqlServer),
            "sqlite" | "sqlite3" => Ok(DatabaseType::Sqlite),
            other => Err(DiffError::Validation(format!(
                "Unknown database type: '{}'. Supported types: postgres, mysql, sqlserver, sqlite",
                other
            ))),
        }
    }
}

/// Options controlling what a schema read retains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// If non-empty, only these fully-qualified table names are retained.
    pub include_tables: Vec<String>,

    /// Table names or `*` patterns to drop.
    pub exclude_tables: Vec<String>,

    /// Schema-namespace whitelist. `None` = all non-system namespaces.
    pub include_schemas: Option<Vec<String>>,

    /// Whether to read views.
    pub include_views: bool,

    /// Whether to read indexes.
    pub include_indexes: bool,

    /// Whether to read foreign keys.
    pub include_foreign_keys: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
            include_schemas: None,
            include_views: true,
            include_indexes: true,
            include_foreign_keys: true,
        }
    }
}

/// Read schema metadata from one live database.
///
/// Implementations are constructed from a connection string without
/// performing I/O; every operation below dials exactly one connection and
/// releases it on all exit paths. The returned [`Schema`] is self-contained
/// and holds no reference to the connection.
#[async_trait]
pub trait SchemaReader: Send + Sync {
    /// Read a fully populated schema snapshot.
    ///
    /// Fails with [`DiffError::Connection`] on authentication or network
    /// failure, [`DiffError::Permission`] when the catalog rejects a query,
    /// and [`DiffError::Catalog`] on unexpected catalog shapes.
    async fn read_schema(&self, opts: &ReadOptions) -> Result<Schema>;

    /// Attempt connect-and-close. Never errors, only reports success.
    async fn test_connection(&self) -> bool;

    /// Redacted display form of the connection string. Never errors; at most
    /// the first two characters of the username appear.
    fn display_name(&self) -> String;

    /// The engine family this reader speaks to.
    fn engine(&self) -> DatabaseType;
}
