//! End-to-end comparison scenarios over live SQLite databases.
//!
//! SQLite needs no server, so these tests exercise the full pipeline:
//! introspection, validation, comparison, and migration synthesis.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tokio_util::sync::CancellationToken;

use schema_diff::{
    ConstraintKind, DatabaseType, DiffConfig, DiffOutcome, Orchestrator, ReadOptions,
    SchemaReader,
};
use schema_diff::drivers::SqliteIntrospector;

async fn create_db(path: &Path, statements: &[&str]) {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .unwrap()
        .create_if_missing(true);
    let mut conn = options.connect().await.unwrap();
    for statement in statements {
        sqlx::query(statement).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();
}

async fn run_diff(source: &Path, target: &Path) -> DiffOutcome {
    let config = DiffConfig::new(
        format!("sqlite:{}", source.display()),
        format!("sqlite:{}", target.display()),
        DatabaseType::Sqlite,
        "scenario_migration",
    );
    Orchestrator::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn scenario_a_varchar_length_widened() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.db");
    let target = dir.path().join("target.db");

    create_db(
        &source,
        &["CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(100) NOT NULL)"],
    )
    .await;
    create_db(
        &target,
        &["CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(120) NOT NULL)"],
    )
    .await;

    let outcome = run_diff(&source, &target).await;
    let comparison = &outcome.comparison;

    assert_eq!(comparison.summary.differences_found, 1);
    assert_eq!(comparison.modified_tables.len(), 1);
    let table_diff = &comparison.modified_tables[0];
    assert_eq!(table_diff.table, "users");
    assert_eq!(table_diff.modified_columns.len(), 1);

    let modified = &table_diff.modified_columns[0];
    assert_eq!(modified.source.name, "name");
    assert_eq!(
        modified.changes,
        vec!["MaxLength changed from 100 to 120"]
    );

    assert!(outcome.migration_script.contains(
        "-- SQLite does not support ALTER COLUMN. Manual migration required for users.name"
    ));
}

#[tokio::test]
async fn scenario_b_new_column_in_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.db");
    let target = dir.path().join("target.db");

    create_db(
        &source,
        &["CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, email TEXT, created_at TEXT, phone VARCHAR(20))"],
    )
    .await;
    create_db(
        &target,
        &["CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, email TEXT, created_at TEXT)"],
    )
    .await;

    let outcome = run_diff(&source, &target).await;
    let table_diff = &outcome.comparison.modified_tables[0];

    assert_eq!(table_diff.table, "users");
    assert_eq!(table_diff.missing_columns.len(), 1);
    assert_eq!(table_diff.missing_columns[0].name, "phone");
    assert!(table_diff.extra_columns.is_empty());

    assert!(outcome
        .migration_script
        .contains("ALTER TABLE users ADD COLUMN phone VARCHAR(20);"));
}

#[tokio::test]
async fn scenario_c_extra_table_reported_not_synthesized() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.db");
    let target = dir.path().join("target.db");

    let users = "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)";
    let products = "CREATE TABLE products (id INTEGER PRIMARY KEY, title TEXT)";
    let categories =
        "CREATE TABLE categories (id INTEGER PRIMARY KEY, name TEXT, description TEXT)";

    create_db(&source, &[users, products]).await;
    create_db(&target, &[users, products, categories]).await;

    let outcome = run_diff(&source, &target).await;
    let comparison = &outcome.comparison;

    assert!(comparison.missing_tables.is_empty());
    assert_eq!(comparison.extra_tables.len(), 1);
    assert_eq!(comparison.extra_tables[0].name, "categories");
    assert!(!outcome.migration_script.contains("CREATE TABLE"));
}

#[tokio::test]
async fn scenario_d_missing_table_synthesized_in_source_order() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.db");
    let target = dir.path().join("target.db");

    let users = "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)";
    let products = "CREATE TABLE products (id INTEGER PRIMARY KEY, title TEXT)";
    let categories =
        "CREATE TABLE categories (id INTEGER PRIMARY KEY, name TEXT, description TEXT)";

    create_db(&source, &[users, products, categories]).await;
    create_db(&target, &[users, products]).await;

    let outcome = run_diff(&source, &target).await;
    let comparison = &outcome.comparison;

    assert_eq!(comparison.missing_tables.len(), 1);
    assert_eq!(comparison.missing_tables[0].name, "categories");

    let script = &outcome.migration_script;
    assert!(script.contains("CREATE TABLE categories ("));
    // Columns appear in catalog order.
    let id_pos = script.find("id INTEGER").unwrap();
    let name_pos = script.find("name TEXT").unwrap();
    let description_pos = script.find("description TEXT").unwrap();
    assert!(id_pos < name_pos && name_pos < description_pos);
}

#[tokio::test]
async fn scenario_e_precision_change_without_scale_change() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.db");
    let target = dir.path().join("target.db");

    create_db(
        &source,
        &["CREATE TABLE products (id INTEGER PRIMARY KEY, price DECIMAL(10,2))"],
    )
    .await;
    create_db(
        &target,
        &["CREATE TABLE products (id INTEGER PRIMARY KEY, price DECIMAL(12,2))"],
    )
    .await;

    let outcome = run_diff(&source, &target).await;
    let modified = &outcome.comparison.modified_tables[0].modified_columns[0];

    assert_eq!(modified.source.name, "price");
    assert_eq!(modified.changes, vec!["Precision changed from 10 to 12"]);
    assert!(!modified.changes.iter().any(|c| c.starts_with("Scale")));
}

#[tokio::test]
async fn scenario_f_identical_schemas_yield_empty_diff() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.db");
    let target = dir.path().join("target.db");

    let statements = [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(50) NOT NULL, email TEXT UNIQUE)",
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL REFERENCES users(id))",
        "CREATE INDEX ix_orders_user ON orders(user_id)",
    ];
    create_db(&source, &statements).await;
    create_db(&target, &statements).await;

    let outcome = run_diff(&source, &target).await;
    let comparison = &outcome.comparison;

    assert!(comparison.is_empty());
    assert_eq!(comparison.summary.differences_found, 0);
    assert_eq!(comparison.summary.missing_tables, 0);
    assert_eq!(comparison.summary.extra_tables, 0);
    assert_eq!(comparison.summary.modified_tables, 0);

    let script = &outcome.migration_script;
    assert!(script.contains("BEGIN TRANSACTION;"));
    assert!(script.contains("COMMIT;"));
    assert!(!script.contains("CREATE TABLE"));
    assert!(!script.contains("ALTER TABLE"));
}

#[tokio::test]
async fn comparison_is_deterministic_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.db");
    let target = dir.path().join("target.db");

    create_db(
        &source,
        &[
            "CREATE TABLE a (x INTEGER, y VARCHAR(10))",
            "CREATE TABLE b (x INTEGER)",
        ],
    )
    .await;
    create_db(
        &target,
        &[
            "CREATE TABLE a (x INTEGER, y VARCHAR(20))",
            "CREATE TABLE c (x INTEGER)",
        ],
    )
    .await;

    let first = run_diff(&source, &target).await;
    let second = run_diff(&source, &target).await;

    assert_eq!(first.comparison, second.comparison);
    assert_eq!(
        serde_json::to_string(&first.comparison).unwrap(),
        serde_json::to_string(&second.comparison).unwrap()
    );
}

#[tokio::test]
async fn sqlite_introspection_normalizes_the_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("app.db");

    create_db(
        &db,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT UNIQUE, name VARCHAR(50) NOT NULL DEFAULT 'anon')",
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL REFERENCES users(id))",
            "CREATE INDEX ix_orders_user ON orders(user_id)",
            "CREATE VIEW v_users AS SELECT id, name FROM users",
        ],
    )
    .await;

    let reader = SqliteIntrospector::new(&format!("sqlite:{}", db.display())).unwrap();
    let schema = reader.read_schema(&ReadOptions::default()).await.unwrap();

    assert_eq!(schema.database, "app");
    // Tables come back sorted by name.
    let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["orders", "users"]);

    let users = schema.table("users").unwrap();
    let id = users.column("id").unwrap();
    assert!(id.is_identity);
    assert_eq!(id.data_type, "INTEGER");

    let name = users.column("name").unwrap();
    assert!(!name.is_nullable);
    assert_eq!(name.data_type, "VARCHAR");
    assert_eq!(name.max_length, Some(50));
    assert_eq!(name.default_value.as_deref(), Some("'anon'"));

    let pk = users
        .constraints
        .iter()
        .find(|c| c.kind == ConstraintKind::PrimaryKey)
        .unwrap();
    assert_eq!(pk.columns, vec!["id"]);

    // UNIQUE on email surfaces through its backing autoindex.
    assert!(users
        .constraints
        .iter()
        .any(|c| c.kind == ConstraintKind::Unique && c.columns == vec!["email"]));

    let orders = schema.table("orders").unwrap();
    let fk = orders
        .constraints
        .iter()
        .find(|c| c.kind == ConstraintKind::ForeignKey)
        .unwrap();
    assert_eq!(fk.columns, vec!["user_id"]);
    assert_eq!(fk.referenced_table.as_deref(), Some("users"));
    assert_eq!(fk.referenced_columns.as_ref().unwrap(), &vec!["id"]);

    // The explicit index is kept; the internal autoindex is not.
    assert_eq!(schema.indexes.len(), 1);
    assert_eq!(schema.indexes[0].name, "ix_orders_user");
    assert_eq!(schema.indexes[0].columns, vec!["user_id"]);
    assert!(!schema.indexes[0].is_unique);

    assert_eq!(schema.views.len(), 1);
    assert_eq!(schema.views[0].name, "v_users");
    assert!(schema.views[0].definition.contains("SELECT id, name FROM users"));
}

#[tokio::test]
async fn read_options_disable_views_and_indexes() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("opts.db");

    create_db(
        &db,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
            "CREATE INDEX ix_users_name ON users(name)",
            "CREATE VIEW v_users AS SELECT id FROM users",
        ],
    )
    .await;

    let reader = SqliteIntrospector::new(&format!("sqlite:{}", db.display())).unwrap();
    let opts = ReadOptions {
        include_views: false,
        include_indexes: false,
        ..Default::default()
    };
    let schema = reader.read_schema(&opts).await.unwrap();

    assert_eq!(schema.tables.len(), 1);
    assert!(schema.views.is_empty());
    assert!(schema.indexes.is_empty());
}

#[tokio::test]
async fn exclude_patterns_drop_tables_consistently() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.db");
    let target = dir.path().join("target.db");

    create_db(
        &source,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY)",
            "CREATE TABLE users_tmp (id INTEGER PRIMARY KEY)",
        ],
    )
    .await;
    create_db(&target, &["CREATE TABLE users (id INTEGER PRIMARY KEY)"]).await;

    let mut config = DiffConfig::new(
        format!("sqlite:{}", source.display()),
        format!("sqlite:{}", target.display()),
        DatabaseType::Sqlite,
        "scenario_migration",
    );
    config.read_options.exclude_tables = vec!["*_tmp".to_string()];

    let outcome = Orchestrator::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.comparison.summary.differences_found, 0);
}
