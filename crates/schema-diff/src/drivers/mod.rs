//! Database driver implementations.
//!
//! One module per engine family, each implementing [`SchemaReader`]:
//!
//! - [`postgres`]: PostgreSQL (tokio-postgres)
//! - [`mysql`]: MySQL/MariaDB (sqlx)
//! - [`mssql`]: SQL Server (tiberius)
//! - [`sqlite`]: SQLite (sqlx)
//! - [`common`]: shared utilities (redaction, filtering, TLS)
//!
//! Dispatch uses an enum with a manual trait impl instead of `Box<dyn
//! SchemaReader>`; the orchestrator selects the variant once from the engine
//! tag and never branches per call.

pub mod common;
pub mod mssql;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mssql::MssqlIntrospector;
pub use mysql::MysqlIntrospector;
pub use postgres::PostgresIntrospector;
pub use sqlite::SqliteIntrospector;

use async_trait::async_trait;

use crate::core::schema::Schema;
use crate::core::traits::{DatabaseType, ReadOptions, SchemaReader};
use crate::error::Result;

/// Enum-based static dispatch over the engine readers.
#[derive(Debug)]
pub enum SchemaReaderImpl {
    Postgres(PostgresIntrospector),
    MySql(MysqlIntrospector),
    SqlServer(MssqlIntrospector),
    Sqlite(SqliteIntrospector),
}

impl SchemaReaderImpl {
    /// Create a reader for the given engine from a connection string.
    ///
    /// The string is parsed eagerly; no I/O happens until a read or
    /// connection test is requested.
    pub fn from_connection_string(engine: DatabaseType, conn: &str) -> Result<Self> {
        match engine {
            DatabaseType::Postgres => Ok(SchemaReaderImpl::Postgres(PostgresIntrospector::new(conn)?)),
            DatabaseType::MySql => Ok(SchemaReaderImpl::MySql(MysqlIntrospector::new(conn)?)),
            DatabaseType::SqlServer => Ok(SchemaReaderImpl::SqlServer(MssqlIntrospector::new(conn)?)),
            DatabaseType::Sqlite => Ok(SchemaReaderImpl::Sqlite(SqliteIntrospector::new(conn)?)),
        }
    }
}

#[async_trait]
impl SchemaReader for SchemaReaderImpl {
    async fn read_schema(&self, opts: &ReadOptions) -> Result<Schema> {
        match self {
            SchemaReaderImpl::Postgres(r) => r.read_schema(opts).await,
            SchemaReaderImpl::MySql(r) => r.read_schema(opts).await,
            SchemaReaderImpl::SqlServer(r) => r.read_schema(opts).await,
            SchemaReaderImpl::Sqlite(r) => r.read_schema(opts).await,
        }
    }

    async fn test_connection(&self) -> bool {
        match self {
            SchemaReaderImpl::Postgres(r) => r.test_connection().await,
            SchemaReaderImpl::MySql(r) => r.test_connection().await,
            SchemaReaderImpl::SqlServer(r) => r.test_connection().await,
            SchemaReaderImpl::Sqlite(r) => r.test_connection().await,
        }
    }

    fn display_name(&self) -> String {
        match self {
            SchemaReaderImpl::Postgres(r) => r.display_name(),
            SchemaReaderImpl::MySql(r) => r.display_name(),
            SchemaReaderImpl::SqlServer(r) => r.display_name(),
            SchemaReaderImpl::Sqlite(r) => r.display_name(),
        }
    }

    fn engine(&self) -> DatabaseType {
        match self {
            SchemaReaderImpl::Postgres(r) => r.engine(),
            SchemaReaderImpl::MySql(r) => r.engine(),
            SchemaReaderImpl::SqlServer(r) => r.engine(),
            SchemaReaderImpl::Sqlite(r) => r.engine(),
        }
    }
}
