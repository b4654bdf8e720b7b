//! SQLite schema introspection.
//!
//! Tables and views come from `sqlite_master`; columns, keys, and indexes
//! come from the pragma table-valued functions (`pragma_table_info`,
//! `pragma_foreign_key_list`, `pragma_index_list`, `pragma_index_info`),
//! which accept the table name as a bound parameter.
//!
//! SQLite declares column types freely, so the declared text is normalized:
//! `VARCHAR(100)` becomes type `VARCHAR` with max-length 100, and
//! `DECIMAL(10,2)` becomes type `DECIMAL` with precision 10 and scale 2. An
//! empty declared type gets SQLite's untyped-column affinity, `BLOB`.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row};
use tracing::{debug, info};

use crate::core::schema::{
    Column, Constraint, ConstraintKind, Index, Schema, Table, View, INDEX_DEFINITION_PROPERTY,
};
use crate::core::traits::{DatabaseType, ReadOptions, SchemaReader};
use crate::drivers::common;
use crate::error::{DiffError, Result};

/// SQLite schema reader.
#[derive(Debug)]
pub struct SqliteIntrospector {
    options: SqliteConnectOptions,
    path: String,
}

impl SqliteIntrospector {
    /// Accepts `sqlite:` URLs or bare file paths. Performs no I/O; the file
    /// must exist by the time a connection is opened.
    pub fn new(conn: &str) -> Result<Self> {
        let path = conn
            .strip_prefix("sqlite://")
            .or_else(|| conn.strip_prefix("sqlite:"))
            .unwrap_or(conn)
            .to_string();

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))
            .map_err(|e| {
                DiffError::Validation(format!("invalid SQLite connection string: {}", e))
            })?
            .read_only(true);

        Ok(Self { options, path })
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        self.options
            .connect()
            .await
            .map_err(|e| classify(e, "opening SQLite database"))
    }

    /// Database name shown in reports: the file stem, or `main` for
    /// in-memory databases.
    fn database_name(&self) -> String {
        Path::new(&self.path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty() && *stem != ":memory:")
            .unwrap_or("main")
            .to_string()
    }

    async fn load_table_names(&self, conn: &mut SqliteConnection) -> Result<Vec<String>> {
        let rows: Vec<SqliteRow> = sqlx::query(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| classify(e, "reading sqlite_master"))?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<String, _>("name")
                    .map_err(|e| classify(e, "decoding sqlite_master row"))
            })
            .collect()
    }

    async fn load_table(&self, conn: &mut SqliteConnection, name: &str) -> Result<Table> {
        let rows: Vec<SqliteRow> = sqlx::query(
            r#"
            SELECT name, type, "notnull", dflt_value, pk
            FROM pragma_table_info(?)
            ORDER BY cid
            "#,
        )
        .bind(name)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| classify(e, "reading table_info pragma"))?;

        if rows.is_empty() {
            return Err(DiffError::Catalog(format!(
                "table '{}' vanished between sqlite_master and table_info reads",
                name
            )));
        }

        let mut table = Table::new("", name);
        let mut pk_columns: Vec<(i64, String)> = Vec::new();

        for row in rows {
            let column_name: String = row
                .try_get("name")
                .map_err(|e| classify(e, "decoding table_info row"))?;
            let declared: String = row
                .try_get("type")
                .map_err(|e| classify(e, "decoding table_info row"))?;
            let notnull: i64 = row
                .try_get("notnull")
                .map_err(|e| classify(e, "decoding table_info row"))?;
            let default_value: Option<String> = row
                .try_get("dflt_value")
                .map_err(|e| classify(e, "decoding table_info row"))?;
            let pk: i64 = row
                .try_get("pk")
                .map_err(|e| classify(e, "decoding table_info row"))?;

            let (data_type, max_length, precision, scale) = parse_declared_type(&declared);
            if pk > 0 {
                pk_columns.push((pk, column_name.clone()));
            }

            table.columns.push(Column {
                name: column_name,
                data_type,
                is_nullable: notnull == 0,
                default_value,
                max_length,
                precision,
                scale,
                is_identity: pk == 1,
                is_computed: false,
                properties: BTreeMap::new(),
            });
        }

        if !pk_columns.is_empty() {
            pk_columns.sort_by_key(|(ordinal, _)| *ordinal);
            let mut constraint = Constraint::new(
                format!("pk_{}", name),
                ConstraintKind::PrimaryKey,
                "",
                name,
            );
            constraint.columns = pk_columns.into_iter().map(|(_, col)| col).collect();
            table.constraints.push(constraint);
        }

        Ok(table)
    }

    async fn load_foreign_keys(
        &self,
        conn: &mut SqliteConnection,
        table: &mut Table,
    ) -> Result<()> {
        let rows: Vec<SqliteRow> = sqlx::query(
            r#"
            SELECT id, "table", "from", "to"
            FROM pragma_foreign_key_list(?)
            ORDER BY id, seq
            "#,
        )
        .bind(&table.name)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| classify(e, "reading foreign_key_list pragma"))?;

        for row in rows {
            let id: i64 = row
                .try_get("id")
                .map_err(|e| classify(e, "decoding foreign_key_list row"))?;
            let referenced_table: String = row
                .try_get("table")
                .map_err(|e| classify(e, "decoding foreign_key_list row"))?;
            let from: String = row
                .try_get("from")
                .map_err(|e| classify(e, "decoding foreign_key_list row"))?;
            let to: Option<String> = row
                .try_get("to")
                .map_err(|e| classify(e, "decoding foreign_key_list row"))?;

            let name = format!("fk_{}_{}", table.name, id);
            let position = match table.constraints.iter().position(|c| c.name == name) {
                Some(position) => position,
                None => {
                    let mut constraint =
                        Constraint::new(&name, ConstraintKind::ForeignKey, "", &table.name);
                    constraint.referenced_table = Some(referenced_table);
                    constraint.referenced_columns = Some(Vec::new());
                    table.constraints.push(constraint);
                    table.constraints.len() - 1
                }
            };
            let constraint = &mut table.constraints[position];

            constraint.columns.push(from);
            // A FK referencing an implicit primary key carries no "to"
            // column; leave the referenced list partial in that case.
            if let (Some(referenced), Some(to)) = (constraint.referenced_columns.as_mut(), to) {
                referenced.push(to);
            }
        }
        Ok(())
    }

    async fn load_unique_constraints(
        &self,
        conn: &mut SqliteConnection,
        table: &mut Table,
    ) -> Result<()> {
        for (index_name, _, origin) in self.index_list(conn, &table.name).await? {
            if origin != "u" {
                continue;
            }
            let mut constraint =
                Constraint::new(&index_name, ConstraintKind::Unique, "", &table.name);
            constraint.columns = self.index_columns(conn, &index_name).await?;
            table.constraints.push(constraint);
        }
        Ok(())
    }

    async fn load_indexes(
        &self,
        conn: &mut SqliteConnection,
        table_name: &str,
        definitions: &BTreeMap<String, String>,
        out: &mut Vec<Index>,
    ) -> Result<()> {
        for (index_name, unique, origin) in self.index_list(conn, table_name).await? {
            if index_name.starts_with("sqlite_") {
                continue;
            }
            let mut properties = BTreeMap::new();
            if let Some(sql) = definitions.get(&index_name) {
                properties.insert(INDEX_DEFINITION_PROPERTY.to_string(), sql.clone());
            }
            out.push(Index {
                columns: self.index_columns(conn, &index_name).await?,
                name: index_name,
                table: table_name.to_string(),
                schema: String::new(),
                is_unique: unique,
                is_primary_key: origin == "pk",
                properties,
            });
        }
        Ok(())
    }

    /// (name, unique, origin) triples from the index_list pragma, name order.
    async fn index_list(
        &self,
        conn: &mut SqliteConnection,
        table_name: &str,
    ) -> Result<Vec<(String, bool, String)>> {
        let rows: Vec<SqliteRow> = sqlx::query(
            r#"
            SELECT name, "unique", origin
            FROM pragma_index_list(?)
            ORDER BY name
            "#,
        )
        .bind(table_name)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| classify(e, "reading index_list pragma"))?;

        rows.into_iter()
            .map(|row| {
                let name: String = row
                    .try_get("name")
                    .map_err(|e| classify(e, "decoding index_list row"))?;
                let unique: i64 = row
                    .try_get("unique")
                    .map_err(|e| classify(e, "decoding index_list row"))?;
                let origin: String = row
                    .try_get("origin")
                    .map_err(|e| classify(e, "decoding index_list row"))?;
                Ok((name, unique == 1, origin))
            })
            .collect()
    }

    async fn index_columns(
        &self,
        conn: &mut SqliteConnection,
        index_name: &str,
    ) -> Result<Vec<String>> {
        let rows: Vec<SqliteRow> = sqlx::query(
            r#"
            SELECT name FROM pragma_index_info(?) ORDER BY seqno
            "#,
        )
        .bind(index_name)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| classify(e, "reading index_info pragma"))?;

        let mut columns = Vec::new();
        for row in rows {
            // Expression index members have no column name.
            if let Some(name) = row
                .try_get::<Option<String>, _>("name")
                .map_err(|e| classify(e, "decoding index_info row"))?
            {
                columns.push(name);
            }
        }
        Ok(columns)
    }

    async fn load_views(&self, conn: &mut SqliteConnection, schema: &mut Schema) -> Result<()> {
        let rows: Vec<SqliteRow> = sqlx::query(
            r#"
            SELECT name, COALESCE(sql, '') AS sql
            FROM sqlite_master
            WHERE type = 'view'
            ORDER BY name
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| classify(e, "reading views from sqlite_master"))?;

        for row in rows {
            schema.views.push(View {
                name: row
                    .try_get("name")
                    .map_err(|e| classify(e, "decoding view row"))?,
                schema: String::new(),
                definition: row
                    .try_get("sql")
                    .map_err(|e| classify(e, "decoding view row"))?,
                properties: BTreeMap::new(),
            });
        }
        Ok(())
    }

    /// Raw CREATE INDEX text by index name, for the Definition property.
    async fn index_definitions(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<BTreeMap<String, String>> {
        let rows: Vec<SqliteRow> = sqlx::query(
            r#"
            SELECT name, COALESCE(sql, '') AS sql
            FROM sqlite_master
            WHERE type = 'index'
            ORDER BY name
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| classify(e, "reading index definitions from sqlite_master"))?;

        let mut definitions = BTreeMap::new();
        for row in rows {
            let name: String = row
                .try_get("name")
                .map_err(|e| classify(e, "decoding index definition row"))?;
            let sql: String = row
                .try_get("sql")
                .map_err(|e| classify(e, "decoding index definition row"))?;
            if !sql.is_empty() {
                definitions.insert(name, sql);
            }
        }
        Ok(definitions)
    }
}

#[async_trait]
impl SchemaReader for SqliteIntrospector {
    async fn read_schema(&self, opts: &ReadOptions) -> Result<Schema> {
        let mut conn = self.connect().await?;
        let mut schema = Schema::new(self.database_name());
        schema
            .metadata
            .insert("engine".to_string(), DatabaseType::Sqlite.tag().to_string());

        let result: Result<()> = async {
            let names = self.load_table_names(&mut conn).await?;
            let definitions = if opts.include_indexes {
                self.index_definitions(&mut conn).await?
            } else {
                BTreeMap::new()
            };

            for name in &names {
                let mut table = self.load_table(&mut conn, name).await?;
                if opts.include_foreign_keys {
                    self.load_foreign_keys(&mut conn, &mut table).await?;
                }
                self.load_unique_constraints(&mut conn, &mut table).await?;
                if opts.include_indexes {
                    self.load_indexes(&mut conn, name, &definitions, &mut schema.indexes)
                        .await?;
                }
                schema.tables.push(table);
            }

            if opts.include_views {
                self.load_views(&mut conn, &mut schema).await?;
            }
            Ok(())
        }
        .await;

        conn.close().await.ok();
        result?;

        common::apply_read_options(&mut schema, opts);
        info!(
            "Read SQLite schema '{}': {} tables, {} views, {} indexes",
            schema.database,
            schema.tables.len(),
            schema.views.len(),
            schema.indexes.len()
        );
        debug!("SQLite database file: {}", self.path);
        Ok(schema)
    }

    async fn test_connection(&self) -> bool {
        match self.connect().await {
            Ok(mut conn) => {
                let ok = sqlx::query("SELECT 1").fetch_one(&mut conn).await.is_ok();
                conn.close().await.ok();
                ok
            }
            Err(_) => false,
        }
    }

    fn display_name(&self) -> String {
        common::display_name(DatabaseType::Sqlite, &self.path)
    }

    fn engine(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }
}

/// Normalize a declared SQLite column type.
///
/// Returns (base type, max-length, precision, scale). Two parenthesized
/// arguments are precision/scale; a single argument is a max-length for
/// character types and a precision otherwise. Unparseable argument lists
/// leave the declared text untouched.
fn parse_declared_type(declared: &str) -> (String, Option<i64>, Option<i64>, Option<i64>) {
    let declared = declared.trim();
    if declared.is_empty() {
        // Untyped columns take BLOB affinity.
        return ("BLOB".to_string(), None, None, None);
    }

    let Some((base, rest)) = declared.split_once('(') else {
        return (declared.to_string(), None, None, None);
    };
    let Some(args) = rest.strip_suffix(')') else {
        return (declared.to_string(), None, None, None);
    };

    let base = base.trim().to_string();
    let parsed: Option<Vec<i64>> = args
        .split(',')
        .map(|arg| arg.trim().parse::<i64>().ok())
        .collect();
    let Some(parsed) = parsed else {
        return (declared.to_string(), None, None, None);
    };

    match parsed.as_slice() {
        [single] => {
            if base.to_ascii_uppercase().contains("CHAR") {
                (base, Some(*single), None, None)
            } else {
                (base, None, Some(*single), None)
            }
        }
        [precision, scale] => (base, None, Some(*precision), Some(*scale)),
        _ => (declared.to_string(), None, None, None),
    }
}

/// Map a driver error onto the diff taxonomy.
fn classify(err: sqlx::Error, context: &str) -> DiffError {
    match &err {
        sqlx::Error::Database(db) => {
            let message = db.message();
            if message.contains("unable to open") || message.contains("not a database") {
                DiffError::connection(message.to_string(), context)
            } else {
                DiffError::Catalog(format!("{}: {}", context, err))
            }
        }
        sqlx::Error::Io(_) | sqlx::Error::Protocol(_) => {
            DiffError::connection(err.to_string(), context)
        }
        _ => DiffError::Catalog(format!("{}: {}", context, err)),
    }
}
