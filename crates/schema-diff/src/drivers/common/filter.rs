//! Post-read filtering shared by every back-end.
//!
//! Catalog queries stay static; include/exclude rules are applied to the
//! populated schema so all four engines filter identically.

use crate::core::schema::Schema;
use crate::core::traits::ReadOptions;

/// Match a name against a pattern where `*` matches any run of characters.
/// Comparison is case-insensitive.
pub fn name_matches(pattern: &str, name: &str) -> bool {
    fn matches(pattern: &[u8], name: &[u8]) -> bool {
        match (pattern.first(), name.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                matches(&pattern[1..], name) || (!name.is_empty() && matches(pattern, &name[1..]))
            }
            (Some(p), Some(n)) => p.eq_ignore_ascii_case(n) && matches(&pattern[1..], &name[1..]),
            _ => false,
        }
    }
    matches(pattern.as_bytes(), name.as_bytes())
}

fn matches_any(patterns: &[String], table_name: &str, full_name: &str) -> bool {
    patterns
        .iter()
        .any(|p| name_matches(p, full_name) || name_matches(p, table_name))
}

fn schema_allowed(whitelist: Option<&Vec<String>>, namespace: &str) -> bool {
    match whitelist {
        Some(schemas) => schemas.iter().any(|s| s.eq_ignore_ascii_case(namespace)),
        None => true,
    }
}

/// Apply include/exclude rules to a populated schema.
///
/// Indexes riding on a dropped table are dropped with it; views follow the
/// namespace whitelist only.
pub fn apply_read_options(schema: &mut Schema, opts: &ReadOptions) {
    if let Some(whitelist) = opts.include_schemas.as_ref() {
        schema
            .tables
            .retain(|t| schema_allowed(Some(whitelist), &t.schema));
        schema
            .views
            .retain(|v| schema_allowed(Some(whitelist), &v.schema));
        schema
            .indexes
            .retain(|i| schema_allowed(Some(whitelist), &i.schema));
    }

    if !opts.include_tables.is_empty() {
        schema
            .tables
            .retain(|t| matches_any(&opts.include_tables, &t.name, &t.full_name()));
    }

    if !opts.exclude_tables.is_empty() {
        schema
            .tables
            .retain(|t| !matches_any(&opts.exclude_tables, &t.name, &t.full_name()));
    }

    // Keep only indexes whose owning table survived.
    let retained: std::collections::HashSet<(String, String)> = schema
        .tables
        .iter()
        .map(|t| (t.schema.clone(), t.name.clone()))
        .collect();
    schema
        .indexes
        .retain(|i| retained.contains(&(i.schema.clone(), i.table.clone())));

    if !opts.include_views {
        schema.views.clear();
    }
    if !opts.include_indexes {
        schema.indexes.clear();
    }
    if !opts.include_foreign_keys {
        for table in &mut schema.tables {
            table
                .constraints
                .retain(|c| c.kind != crate::core::schema::ConstraintKind::ForeignKey);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Constraint, ConstraintKind, Index, Table};

    fn sample_schema() -> Schema {
        let mut schema = Schema::new("app");
        for (ns, name) in [
            ("public", "users"),
            ("public", "orders"),
            ("audit", "users_log"),
        ] {
            let mut table = Table::new(ns, name);
            if name == "orders" {
                let mut fk = Constraint::new("fk_orders_users", ConstraintKind::ForeignKey, ns, name);
                fk.columns = vec!["user_id".into()];
                fk.referenced_table = Some("users".into());
                table.constraints.push(fk);
            }
            schema.tables.push(table);
        }
        schema.indexes.push(Index {
            name: "ix_orders_user".into(),
            table: "orders".into(),
            schema: "public".into(),
            columns: vec!["user_id".into()],
            is_unique: false,
            is_primary_key: false,
            properties: Default::default(),
        });
        schema
    }

    #[test]
    fn test_name_matches_wildcards() {
        assert!(name_matches("users", "users"));
        assert!(name_matches("USERS", "users"));
        assert!(name_matches("user*", "users"));
        assert!(name_matches("*_log", "users_log"));
        assert!(name_matches("*user*", "public.users"));
        assert!(!name_matches("user", "users"));
        assert!(!name_matches("*_tmp", "users"));
    }

    #[test]
    fn test_include_tables_retains_only_listed() {
        let mut schema = sample_schema();
        let opts = ReadOptions {
            include_tables: vec!["public.users".into()],
            ..Default::default()
        };
        apply_read_options(&mut schema, &opts);
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.tables[0].full_name(), "public.users");
        // Index on the dropped orders table goes with it.
        assert!(schema.indexes.is_empty());
    }

    #[test]
    fn test_exclude_tables_with_pattern() {
        let mut schema = sample_schema();
        let opts = ReadOptions {
            exclude_tables: vec!["*_log".into()],
            ..Default::default()
        };
        apply_read_options(&mut schema, &opts);
        assert!(schema.tables.iter().all(|t| t.name != "users_log"));
        assert_eq!(schema.tables.len(), 2);
    }

    #[test]
    fn test_schema_whitelist() {
        let mut schema = sample_schema();
        let opts = ReadOptions {
            include_schemas: Some(vec!["audit".into()]),
            ..Default::default()
        };
        apply_read_options(&mut schema, &opts);
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.tables[0].schema, "audit");
    }

    #[test]
    fn test_disable_indexes_and_foreign_keys() {
        let mut schema = sample_schema();
        let opts = ReadOptions {
            include_indexes: false,
            include_foreign_keys: false,
            ..Default::default()
        };
        apply_read_options(&mut schema, &opts);
        assert!(schema.indexes.is_empty());
        assert!(schema
            .tables
            .iter()
            .all(|t| t.constraints.iter().all(|c| c.kind != ConstraintKind::ForeignKey)));
    }
}
