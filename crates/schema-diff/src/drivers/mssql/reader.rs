//! SQL Server schema introspection.
//!
//! Reads tables from `sys.tables` joined to `sys.schemas`, columns from
//! `sys.columns`/`sys.types`/`sys.default_constraints`, key and foreign-key
//! constraints from `sys.key_constraints`/`sys.foreign_keys`, views from
//! `sys.views` + `sys.sql_modules`, and indexes from `sys.indexes`. Ordered
//! column lists are aggregated server-side with STUFF/FOR XML PATH and split
//! on the client.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tiberius::{Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::core::schema::{Column, Constraint, ConstraintKind, Index, Schema, Table, View};
use crate::core::traits::{DatabaseType, ReadOptions, SchemaReader};
use crate::drivers::common;
use crate::error::{DiffError, Result};

type MssqlClient = Client<Compat<TcpStream>>;

/// SQL Server schema reader.
#[derive(Debug)]
pub struct MssqlIntrospector {
    config: Config,
    raw: String,
}

impl MssqlIntrospector {
    /// Parse an ADO.NET-style connection string. Performs no I/O.
    pub fn new(conn: &str) -> Result<Self> {
        let config = Config::from_ado_string(conn).map_err(|e| {
            DiffError::Validation(format!("invalid SQL Server connection string: {}", e))
        })?;
        Ok(Self {
            config,
            raw: conn.to_string(),
        })
    }

    async fn connect(&self) -> Result<MssqlClient> {
        let tcp = TcpStream::connect(self.config.get_addr())
            .await
            .map_err(|e| DiffError::connection(e.to_string(), "connecting to SQL Server"))?;
        tcp.set_nodelay(true).ok();

        Client::connect(self.config.clone(), tcp.compat_write())
            .await
            .map_err(|e| classify(e, "authenticating to SQL Server"))
    }

    async fn query_rows(
        &self,
        client: &mut MssqlClient,
        sql: &str,
        context: &str,
    ) -> Result<Vec<tiberius::Row>> {
        client
            .simple_query(sql)
            .await
            .map_err(|e| classify(e, context))?
            .into_first_result()
            .await
            .map_err(|e| classify(e, context))
    }

    async fn load_tables(&self, client: &mut MssqlClient, schema: &mut Schema) -> Result<()> {
        let sql = r#"
            SELECT s.name, t.name
            FROM sys.tables t
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            ORDER BY s.name, t.name
        "#;

        for row in self.query_rows(client, sql, "reading sys.tables").await? {
            let namespace = row.get::<&str, _>(0).unwrap_or_default().to_string();
            let name = row.get::<&str, _>(1).unwrap_or_default().to_string();
            schema.tables.push(Table::new(namespace, name));
        }

        debug!("Read {} tables", schema.tables.len());
        Ok(())
    }

    async fn load_columns(&self, client: &mut MssqlClient, schema: &mut Schema) -> Result<()> {
        let sql = r#"
            SELECT s.name, t.name, c.name, ty.name,
                   c.is_nullable, c.is_identity, c.is_computed,
                   CAST(c.max_length AS INT),
                   CAST(c.precision AS INT),
                   CAST(c.scale AS INT),
                   dc.definition
            FROM sys.tables t
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            JOIN sys.columns c ON c.object_id = t.object_id
            JOIN sys.types ty ON ty.user_type_id = c.user_type_id
            LEFT JOIN sys.default_constraints dc
              ON dc.parent_object_id = t.object_id AND dc.parent_column_id = c.column_id
            ORDER BY s.name, t.name, c.column_id
        "#;

        let by_table = table_index(schema);
        for row in self.query_rows(client, sql, "reading sys.columns").await? {
            let namespace = row.get::<&str, _>(0).unwrap_or_default().to_string();
            let table_name = row.get::<&str, _>(1).unwrap_or_default().to_string();
            let Some(&idx) = by_table.get(&(namespace, table_name)) else {
                continue;
            };

            let data_type = row.get::<&str, _>(3).unwrap_or_default().to_string();
            let max_length = row.get::<i32, _>(7).unwrap_or(0);
            let precision = row.get::<i32, _>(8).unwrap_or(0);
            let scale = row.get::<i32, _>(9).unwrap_or(0);

            let column = Column {
                name: row.get::<&str, _>(2).unwrap_or_default().to_string(),
                is_nullable: row.get::<bool, _>(4).unwrap_or(true),
                is_identity: row.get::<bool, _>(5).unwrap_or(false),
                is_computed: row.get::<bool, _>(6).unwrap_or(false),
                max_length: char_length(&data_type, max_length),
                precision: numeric_part(&data_type, precision),
                scale: numeric_part(&data_type, scale),
                default_value: row.get::<&str, _>(10).map(str::to_string),
                data_type,
                properties: BTreeMap::new(),
            };
            schema.tables[idx].columns.push(column);
        }
        Ok(())
    }

    async fn load_key_constraints(
        &self,
        client: &mut MssqlClient,
        schema: &mut Schema,
    ) -> Result<()> {
        let sql = r#"
            SELECT s.name, t.name, kc.name, kc.type,
                   STUFF((SELECT ',' + c.name
                          FROM sys.index_columns ic
                          JOIN sys.columns c
                            ON c.object_id = ic.object_id AND c.column_id = ic.column_id
                          WHERE ic.object_id = kc.parent_object_id
                            AND ic.index_id = kc.unique_index_id
                          ORDER BY ic.key_ordinal
                          FOR XML PATH('')), 1, 1, '')
            FROM sys.key_constraints kc
            JOIN sys.tables t ON t.object_id = kc.parent_object_id
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            ORDER BY s.name, t.name, kc.name
        "#;

        let by_table = table_index(schema);
        for row in self
            .query_rows(client, sql, "reading sys.key_constraints")
            .await?
        {
            let namespace = row.get::<&str, _>(0).unwrap_or_default().to_string();
            let table_name = row.get::<&str, _>(1).unwrap_or_default().to_string();
            let Some(&idx) = by_table.get(&(namespace.clone(), table_name.clone())) else {
                continue;
            };
            let Some(kind) =
                ConstraintKind::from_catalog(row.get::<&str, _>(3).unwrap_or_default())
            else {
                continue;
            };

            let mut constraint = Constraint::new(
                row.get::<&str, _>(2).unwrap_or_default(),
                kind,
                namespace,
                table_name,
            );
            constraint.columns = split_column_list(row.get::<&str, _>(4));
            schema.tables[idx].constraints.push(constraint);
        }
        Ok(())
    }

    async fn load_foreign_keys(
        &self,
        client: &mut MssqlClient,
        schema: &mut Schema,
    ) -> Result<()> {
        let sql = r#"
            SELECT s.name, t.name, fk.name, rt.name,
                   STUFF((SELECT ',' + pc.name
                          FROM sys.foreign_key_columns fkc
                          JOIN sys.columns pc
                            ON pc.object_id = fkc.parent_object_id
                           AND pc.column_id = fkc.parent_column_id
                          WHERE fkc.constraint_object_id = fk.object_id
                          ORDER BY fkc.constraint_column_id
                          FOR XML PATH('')), 1, 1, ''),
                   STUFF((SELECT ',' + rc.name
                          FROM sys.foreign_key_columns fkc
                          JOIN sys.columns rc
                            ON rc.object_id = fkc.referenced_object_id
                           AND rc.column_id = fkc.referenced_column_id
                          WHERE fkc.constraint_object_id = fk.object_id
                          ORDER BY fkc.constraint_column_id
                          FOR XML PATH('')), 1, 1, '')
            FROM sys.foreign_keys fk
            JOIN sys.tables t ON t.object_id = fk.parent_object_id
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            JOIN sys.tables rt ON rt.object_id = fk.referenced_object_id
            ORDER BY s.name, t.name, fk.name
        "#;

        let by_table = table_index(schema);
        for row in self
            .query_rows(client, sql, "reading sys.foreign_keys")
            .await?
        {
            let namespace = row.get::<&str, _>(0).unwrap_or_default().to_string();
            let table_name = row.get::<&str, _>(1).unwrap_or_default().to_string();
            let Some(&idx) = by_table.get(&(namespace.clone(), table_name.clone())) else {
                continue;
            };

            let mut constraint = Constraint::new(
                row.get::<&str, _>(2).unwrap_or_default(),
                ConstraintKind::ForeignKey,
                namespace,
                table_name,
            );
            constraint.referenced_table = row.get::<&str, _>(3).map(str::to_string);
            constraint.columns = split_column_list(row.get::<&str, _>(4));
            constraint.referenced_columns = Some(split_column_list(row.get::<&str, _>(5)));
            schema.tables[idx].constraints.push(constraint);
        }
        Ok(())
    }

    async fn load_check_constraints(
        &self,
        client: &mut MssqlClient,
        schema: &mut Schema,
    ) -> Result<()> {
        let sql = r#"
            SELECT s.name, t.name, cc.name, cc.definition
            FROM sys.check_constraints cc
            JOIN sys.tables t ON t.object_id = cc.parent_object_id
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            ORDER BY s.name, t.name, cc.name
        "#;

        let by_table = table_index(schema);
        for row in self
            .query_rows(client, sql, "reading sys.check_constraints")
            .await?
        {
            let namespace = row.get::<&str, _>(0).unwrap_or_default().to_string();
            let table_name = row.get::<&str, _>(1).unwrap_or_default().to_string();
            let Some(&idx) = by_table.get(&(namespace.clone(), table_name.clone())) else {
                continue;
            };

            let mut constraint = Constraint::new(
                row.get::<&str, _>(2).unwrap_or_default(),
                ConstraintKind::Check,
                namespace,
                table_name,
            );
            if let Some(definition) = row.get::<&str, _>(3) {
                constraint
                    .properties
                    .insert("Definition".to_string(), definition.to_string());
            }
            schema.tables[idx].constraints.push(constraint);
        }
        Ok(())
    }

    async fn load_views(&self, client: &mut MssqlClient, schema: &mut Schema) -> Result<()> {
        let sql = r#"
            SELECT s.name, v.name, COALESCE(m.definition, '')
            FROM sys.views v
            JOIN sys.schemas s ON s.schema_id = v.schema_id
            LEFT JOIN sys.sql_modules m ON m.object_id = v.object_id
            ORDER BY s.name, v.name
        "#;

        for row in self.query_rows(client, sql, "reading sys.views").await? {
            schema.views.push(View {
                schema: row.get::<&str, _>(0).unwrap_or_default().to_string(),
                name: row.get::<&str, _>(1).unwrap_or_default().to_string(),
                definition: row.get::<&str, _>(2).unwrap_or_default().to_string(),
                properties: BTreeMap::new(),
            });
        }
        Ok(())
    }

    async fn load_indexes(&self, client: &mut MssqlClient, schema: &mut Schema) -> Result<()> {
        let sql = r#"
            SELECT s.name, t.name, i.name, i.is_unique, i.is_primary_key,
                   STUFF((SELECT ',' + c.name
                          FROM sys.index_columns ic
                          JOIN sys.columns c
                            ON c.object_id = ic.object_id AND c.column_id = ic.column_id
                          WHERE ic.object_id = i.object_id
                            AND ic.index_id = i.index_id
                            AND ic.is_included_column = 0
                          ORDER BY ic.key_ordinal
                          FOR XML PATH('')), 1, 1, '')
            FROM sys.indexes i
            JOIN sys.tables t ON t.object_id = i.object_id
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            WHERE i.name IS NOT NULL
            ORDER BY s.name, t.name, i.name
        "#;

        for row in self.query_rows(client, sql, "reading sys.indexes").await? {
            schema.indexes.push(Index {
                schema: row.get::<&str, _>(0).unwrap_or_default().to_string(),
                table: row.get::<&str, _>(1).unwrap_or_default().to_string(),
                name: row.get::<&str, _>(2).unwrap_or_default().to_string(),
                is_unique: row.get::<bool, _>(3).unwrap_or(false),
                is_primary_key: row.get::<bool, _>(4).unwrap_or(false),
                columns: split_column_list(row.get::<&str, _>(5)),
                properties: BTreeMap::new(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaReader for MssqlIntrospector {
    async fn read_schema(&self, opts: &ReadOptions) -> Result<Schema> {
        let mut client = self.connect().await?;

        let rows = self
            .query_rows(&mut client, "SELECT DB_NAME()", "reading DB_NAME()")
            .await?;
        let database = rows
            .first()
            .and_then(|row| row.get::<&str, _>(0))
            .unwrap_or_default()
            .to_string();

        let mut schema = Schema::new(database);
        schema.metadata.insert(
            "engine".to_string(),
            DatabaseType::SqlServer.tag().to_string(),
        );

        self.load_tables(&mut client, &mut schema).await?;
        self.load_columns(&mut client, &mut schema).await?;
        self.load_key_constraints(&mut client, &mut schema).await?;
        if opts.include_foreign_keys {
            self.load_foreign_keys(&mut client, &mut schema).await?;
        }
        self.load_check_constraints(&mut client, &mut schema).await?;
        if opts.include_views {
            self.load_views(&mut client, &mut schema).await?;
        }
        if opts.include_indexes {
            self.load_indexes(&mut client, &mut schema).await?;
        }

        common::apply_read_options(&mut schema, opts);
        info!(
            "Read SQL Server schema '{}': {} tables, {} views, {} indexes",
            schema.database,
            schema.tables.len(),
            schema.views.len(),
            schema.indexes.len()
        );
        Ok(schema)
    }

    async fn test_connection(&self) -> bool {
        match self.connect().await {
            Ok(mut client) => client.simple_query("SELECT 1").await.is_ok(),
            Err(_) => false,
        }
    }

    fn display_name(&self) -> String {
        common::display_name(DatabaseType::SqlServer, &self.raw)
    }

    fn engine(&self) -> DatabaseType {
        DatabaseType::SqlServer
    }
}

/// Index tables by (schema namespace, name) for row attachment.
fn table_index(schema: &Schema) -> BTreeMap<(String, String), usize> {
    schema
        .tables
        .iter()
        .enumerate()
        .map(|(idx, t)| ((t.schema.clone(), t.name.clone()), idx))
        .collect()
}

/// Split a STUFF-aggregated ",a,b,c" column list.
fn split_column_list(list: Option<&str>) -> Vec<String> {
    match list {
        Some(list) if !list.is_empty() => list.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// `sys.columns.max_length` is bytes, -1 for MAX; only meaningful for
/// character and binary types.
fn char_length(data_type: &str, max_length: i32) -> Option<i64> {
    let lower = data_type.to_ascii_lowercase();
    if max_length <= 0 || !(lower.contains("char") || lower.contains("binary")) {
        return None;
    }
    // nchar/nvarchar report byte counts; the catalog stores 2 bytes per char.
    if lower.starts_with('n') {
        Some(i64::from(max_length / 2))
    } else {
        Some(i64::from(max_length))
    }
}

/// Precision and scale are only meaningful for exact numerics.
fn numeric_part(data_type: &str, value: i32) -> Option<i64> {
    let lower = data_type.to_ascii_lowercase();
    if value > 0 && (lower == "decimal" || lower == "numeric") {
        Some(i64::from(value))
    } else {
        None
    }
}

/// Map a driver error onto the diff taxonomy.
fn classify(err: tiberius::error::Error, context: &str) -> DiffError {
    match &err {
        tiberius::error::Error::Server(token) => match token.code() {
            // The server permission-denied family.
            229 | 230 | 262 | 297 | 300 => {
                DiffError::Permission(format!("{}: {}", context, token.message()))
            }
            // Login / database-access failures.
            916 | 4060 | 18452 | 18456 => {
                DiffError::connection(token.message().to_string(), context)
            }
            _ => DiffError::Catalog(format!("{}: {}", context, err)),
        },
        tiberius::error::Error::Io { .. } | tiberius::error::Error::Tls(_) => {
            DiffError::connection(err.to_string(), context)
        }
        tiberius::error::Error::Routing { host, port } => DiffError::connection(
            format!("server requested rerouting to {}:{}", host, port),
            context,
        ),
        _ => DiffError::Catalog(format!("{}: {}", context, err)),
    }
}
