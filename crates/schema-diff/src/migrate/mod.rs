//! Migration script synthesis.
//!
//! Converts a [`SchemaComparison`] into an engine-dialect forward migration
//! script. Only additive changes are expressed: missing tables become CREATE
//! TABLE statements, missing columns become ADD COLUMN, and modified columns
//! become the engine's ALTER/MODIFY form. Extra objects and constraint/index
//! differences are reported but never synthesized, and no DROP statements are
//! ever emitted.

use chrono::{DateTime, Utc};

use crate::compare::{SchemaComparison, TableDiff};
use crate::core::schema::{Column, Table};
use crate::core::traits::DatabaseType;

/// Tool signature placed in the script header.
const TOOL_SIGNATURE: &str = concat!("schema-diff v", env!("CARGO_PKG_VERSION"));

/// Advisory comment closing every script.
const TRAILER: &str = "-- Review this script before applying it to the target database.";

/// Synthesize a forward migration script for the given engine.
///
/// The wall-clock timestamp is injected so callers (and tests) control it;
/// everything else in the output is a pure function of the diff.
pub fn synthesize(
    diff: &SchemaComparison,
    engine: DatabaseType,
    migration_name: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let mut script = String::new();

    script.push_str(&format!("-- Migration: {}\n", migration_name));
    script.push_str(&format!(
        "-- Generated: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    script.push_str(&format!("-- Engine: {}\n", engine));
    script.push_str(&format!("-- Generated by {}\n", TOOL_SIGNATURE));
    script.push('\n');
    script.push_str("BEGIN TRANSACTION;\n");

    for table in &diff.missing_tables {
        script.push('\n');
        script.push_str(&render_create_table(table));
    }

    for table_diff in &diff.modified_tables {
        let block = render_table_alterations(table_diff, engine);
        if !block.is_empty() {
            script.push('\n');
            script.push_str(&block);
        }
    }

    script.push('\n');
    script.push_str("COMMIT;\n");
    script.push('\n');
    script.push_str(TRAILER);
    script.push('\n');

    script
}

/// Render a CREATE TABLE statement with one column per line, source order.
fn render_create_table(table: &Table) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("    {}", render_column_definition(c)))
        .collect();

    format!(
        "CREATE TABLE {} (\n{}\n);\n",
        table.full_name(),
        columns.join(",\n")
    )
}

/// Render the ADD COLUMN / modify block for one table diff.
fn render_table_alterations(diff: &TableDiff, engine: DatabaseType) -> String {
    let mut block = String::new();

    for column in &diff.missing_columns {
        block.push_str(&format!(
            "ALTER TABLE {} ADD COLUMN {};\n",
            diff.table,
            render_column_definition(column)
        ));
    }

    for modified in &diff.modified_columns {
        block.push_str(&render_column_modification(
            &diff.table,
            &modified.target,
            engine,
        ));
    }

    block
}

/// Render the dialect-specific statement for a modified column.
fn render_column_modification(table: &str, target: &Column, engine: DatabaseType) -> String {
    match engine {
        DatabaseType::Postgres => format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {};\n",
            table,
            target.name,
            render_type(target)
        ),
        DatabaseType::MySql => format!(
            "ALTER TABLE {} MODIFY COLUMN {};\n",
            table,
            render_column_definition(target)
        ),
        DatabaseType::SqlServer => format!(
            "ALTER TABLE {} ALTER COLUMN {};\n",
            table,
            render_column_definition(target)
        ),
        DatabaseType::Sqlite => format!(
            "-- SQLite does not support ALTER COLUMN. Manual migration required for {}.{}\n",
            table, target.name
        ),
    }
}

/// Render a full column definition:
/// `<name> <type>[(<max-length>)] [(<precision>,<scale>)] [NOT NULL] [DEFAULT <expr>]`.
pub fn render_column_definition(column: &Column) -> String {
    let mut definition = format!("{} {}", column.name, render_type(column));

    if !column.is_nullable {
        definition.push_str(" NOT NULL");
    }
    if let Some(default) = column.default_value.as_deref() {
        if !default.is_empty() {
            definition.push_str(&format!(" DEFAULT {}", default));
        }
    }

    definition
}

/// Render the type portion of a column definition.
///
/// The parenthesized length is appended only for VARCHAR-family types;
/// precision/scale only when both are present.
fn render_type(column: &Column) -> String {
    let mut rendered = column.data_type.clone();

    if let Some(max_length) = column.max_length {
        if column.data_type.to_uppercase().contains("VARCHAR") {
            rendered.push_str(&format!("({})", max_length));
        }
    }
    if let (Some(precision), Some(scale)) = (column.precision, column.scale) {
        rendered.push_str(&format!("({},{})", precision, scale));
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use crate::core::schema::Schema;
    use chrono::TimeZone;

    fn pinned_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn varchar(name: &str, length: i64) -> Column {
        let mut col = Column::new(name, "VARCHAR");
        col.max_length = Some(length);
        col
    }

    fn schema_with(tables: Vec<Table>) -> Schema {
        let mut schema = Schema::new("app");
        schema.tables = tables;
        schema
    }

    #[test]
    fn test_empty_diff_still_emits_envelope() {
        let schema = schema_with(vec![]);
        let diff = compare(&schema, &schema);
        let script = synthesize(&diff, DatabaseType::Sqlite, "noop", pinned_time());

        assert!(script.contains("-- Migration: noop"));
        assert!(script.contains("-- Engine: sqlite"));
        assert!(script.contains("BEGIN TRANSACTION;"));
        assert!(script.contains("COMMIT;"));
        assert!(script.contains("Review this script"));
        assert!(!script.contains("CREATE TABLE"));
        assert!(!script.contains("ALTER TABLE"));
    }

    #[test]
    fn test_create_table_for_missing_table() {
        let mut users = Table::new("", "users");
        let mut id = Column::new("id", "INTEGER");
        id.is_nullable = false;
        users.columns.push(id);
        users.columns.push(varchar("name", 100));

        let source = schema_with(vec![users]);
        let target = schema_with(vec![]);
        let diff = compare(&source, &target);

        let script = synthesize(&diff, DatabaseType::Sqlite, "add_users", pinned_time());
        assert!(script.contains("CREATE TABLE users (\n    id INTEGER NOT NULL,\n    name VARCHAR(100)\n);"));
    }

    #[test]
    fn test_varchar_length_only_for_varchar_types() {
        let mut text_col = Column::new("body", "TEXT");
        text_col.max_length = Some(500);
        assert_eq!(render_column_definition(&text_col), "body TEXT");

        let mut nvarchar = Column::new("title", "NVARCHAR");
        nvarchar.max_length = Some(80);
        assert_eq!(render_column_definition(&nvarchar), "title NVARCHAR(80)");
    }

    #[test]
    fn test_precision_and_scale_require_both() {
        let mut price = Column::new("price", "DECIMAL");
        price.precision = Some(10);
        assert_eq!(render_column_definition(&price), "price DECIMAL");

        price.scale = Some(2);
        assert_eq!(render_column_definition(&price), "price DECIMAL(10,2)");
    }

    #[test]
    fn test_default_appended_when_nonempty() {
        let mut col = Column::new("state", "INTEGER");
        col.default_value = Some("0".into());
        assert_eq!(render_column_definition(&col), "state INTEGER DEFAULT 0");

        col.default_value = Some(String::new());
        assert_eq!(render_column_definition(&col), "state INTEGER");

        col.default_value = Some("0".into());
        col.is_nullable = false;
        assert_eq!(
            render_column_definition(&col),
            "state INTEGER NOT NULL DEFAULT 0"
        );
    }

    #[test]
    fn test_add_column_statement() {
        let mut users_src = Table::new("", "users");
        users_src.columns.push(varchar("phone", 20));
        let users_tgt = Table::new("", "users");

        let diff = compare(&schema_with(vec![users_src]), &schema_with(vec![users_tgt]));
        let script = synthesize(&diff, DatabaseType::Sqlite, "m", pinned_time());
        assert!(script.contains("ALTER TABLE users ADD COLUMN phone VARCHAR(20);"));
    }

    #[test]
    fn test_modify_column_dialects() {
        let mut src_table = Table::new("", "users");
        src_table.columns.push(varchar("name", 100));
        let mut tgt_table = Table::new("", "users");
        tgt_table.columns.push(varchar("name", 120));

        let diff = compare(
            &schema_with(vec![src_table]),
            &schema_with(vec![tgt_table]),
        );

        let pg = synthesize(&diff, DatabaseType::Postgres, "m", pinned_time());
        assert!(pg.contains("ALTER TABLE users ALTER COLUMN name TYPE VARCHAR(120);"));

        let mysql = synthesize(&diff, DatabaseType::MySql, "m", pinned_time());
        assert!(mysql.contains("ALTER TABLE users MODIFY COLUMN name VARCHAR(120);"));

        let mssql = synthesize(&diff, DatabaseType::SqlServer, "m", pinned_time());
        assert!(mssql.contains("ALTER TABLE users ALTER COLUMN name VARCHAR(120);"));

        let sqlite = synthesize(&diff, DatabaseType::Sqlite, "m", pinned_time());
        assert!(sqlite.contains(
            "-- SQLite does not support ALTER COLUMN. Manual migration required for users.name"
        ));
    }

    #[test]
    fn test_extra_tables_are_not_synthesized() {
        let extra = Table::new("", "categories");
        let diff = compare(&schema_with(vec![]), &schema_with(vec![extra]));
        let script = synthesize(&diff, DatabaseType::Sqlite, "m", pinned_time());
        assert!(!script.contains("CREATE TABLE"));
        assert!(!script.contains("DROP"));
    }

    #[test]
    fn test_script_is_deterministic_under_pinned_clock() {
        let mut src_table = Table::new("", "users");
        src_table.columns.push(varchar("name", 100));
        let source = schema_with(vec![src_table]);
        let target = schema_with(vec![]);

        let diff = compare(&source, &target);
        let first = synthesize(&diff, DatabaseType::Postgres, "m", pinned_time());
        let second = synthesize(&diff, DatabaseType::Postgres, "m", pinned_time());
        assert_eq!(first, second);
    }
}
