//! Difference rules for columns, indexes, and constraints.
//!
//! Each rule set emits one human-readable string per differing predicate, in
//! a fixed order. The message shape `<Field> changed from <src> to <tgt>` and
//! the predicate order are contractual; report consumers and tests depend on
//! both.

use crate::core::schema::{Column, Constraint, Index};

/// Render an optional integer for a difference message.
fn fmt_opt_int(value: Option<i64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "NULL".to_string(),
    }
}

/// Render an optional string for a difference message.
fn fmt_opt_str(value: Option<&str>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "NULL".to_string(),
    }
}

/// Render an ordered column-name list for a difference message.
fn fmt_columns(columns: &[String]) -> String {
    format!("[{}]", columns.join(", "))
}

fn changed(field: &str, from: impl std::fmt::Display, to: impl std::fmt::Display) -> String {
    format!("{} changed from {} to {}", field, from, to)
}

/// Default values compare with NULL and empty-string treated as equal.
fn defaults_equal(src: Option<&str>, tgt: Option<&str>) -> bool {
    src.unwrap_or("") == tgt.unwrap_or("")
}

/// Compute the ordered difference list for a column present in both schemas.
///
/// Predicate order: DataType, IsNullable, DefaultValue, MaxLength, Precision,
/// Scale, IsIdentity.
pub fn column_changes(src: &Column, tgt: &Column) -> Vec<String> {
    let mut changes = Vec::new();

    if src.data_type != tgt.data_type {
        changes.push(changed("DataType", &src.data_type, &tgt.data_type));
    }
    if src.is_nullable != tgt.is_nullable {
        changes.push(changed("IsNullable", src.is_nullable, tgt.is_nullable));
    }
    if !defaults_equal(src.default_value.as_deref(), tgt.default_value.as_deref()) {
        changes.push(changed(
            "DefaultValue",
            fmt_opt_str(src.default_value.as_deref()),
            fmt_opt_str(tgt.default_value.as_deref()),
        ));
    }
    if src.max_length != tgt.max_length {
        changes.push(changed(
            "MaxLength",
            fmt_opt_int(src.max_length),
            fmt_opt_int(tgt.max_length),
        ));
    }
    if src.precision != tgt.precision {
        changes.push(changed(
            "Precision",
            fmt_opt_int(src.precision),
            fmt_opt_int(tgt.precision),
        ));
    }
    if src.scale != tgt.scale {
        changes.push(changed(
            "Scale",
            fmt_opt_int(src.scale),
            fmt_opt_int(tgt.scale),
        ));
    }
    if src.is_identity != tgt.is_identity {
        changes.push(changed("IsIdentity", src.is_identity, tgt.is_identity));
    }

    changes
}

/// Compute the ordered difference list for an index present in both schemas.
///
/// Predicate order: TableName, Columns (position-sensitive), IsUnique,
/// IsPrimaryKey.
pub fn index_changes(src: &Index, tgt: &Index) -> Vec<String> {
    let mut changes = Vec::new();

    let src_table = qualified_table(&src.schema, &src.table);
    let tgt_table = qualified_table(&tgt.schema, &tgt.table);
    if src_table != tgt_table {
        changes.push(changed("TableName", &src_table, &tgt_table));
    }
    if src.columns != tgt.columns {
        changes.push(changed(
            "Columns",
            fmt_columns(&src.columns),
            fmt_columns(&tgt.columns),
        ));
    }
    if src.is_unique != tgt.is_unique {
        changes.push(changed("IsUnique", src.is_unique, tgt.is_unique));
    }
    if src.is_primary_key != tgt.is_primary_key {
        changes.push(changed("IsPrimaryKey", src.is_primary_key, tgt.is_primary_key));
    }

    changes
}

/// Compute the ordered difference list for a constraint present in both
/// tables.
///
/// Predicate order: Type, Columns (position-sensitive), ReferencedTable,
/// ReferencedColumns (checked only when both sides carry them).
pub fn constraint_changes(src: &Constraint, tgt: &Constraint) -> Vec<String> {
    let mut changes = Vec::new();

    if src.kind != tgt.kind {
        changes.push(changed("Type", src.kind, tgt.kind));
    }
    if src.columns != tgt.columns {
        changes.push(changed(
            "Columns",
            fmt_columns(&src.columns),
            fmt_columns(&tgt.columns),
        ));
    }
    if src.referenced_table != tgt.referenced_table {
        changes.push(changed(
            "ReferencedTable",
            fmt_opt_str(src.referenced_table.as_deref()),
            fmt_opt_str(tgt.referenced_table.as_deref()),
        ));
    }
    if let (Some(src_cols), Some(tgt_cols)) =
        (&src.referenced_columns, &tgt.referenced_columns)
    {
        if src_cols != tgt_cols {
            changes.push(changed(
                "ReferencedColumns",
                fmt_columns(src_cols),
                fmt_columns(tgt_cols),
            ));
        }
    }

    changes
}

fn qualified_table(schema: &str, table: &str) -> String {
    if schema.is_empty() {
        table.to_string()
    } else {
        format!("{}.{}", schema, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ConstraintKind;

    #[test]
    fn test_identical_columns_produce_no_changes() {
        let col = Column::new("name", "varchar");
        assert!(column_changes(&col, &col).is_empty());
    }

    #[test]
    fn test_column_change_message_shape() {
        let src = Column::new("name", "varchar");
        let mut tgt = src.clone();
        tgt.data_type = "text".into();

        let changes = column_changes(&src, &tgt);
        assert_eq!(changes, vec!["DataType changed from varchar to text"]);
    }

    #[test]
    fn test_column_changes_fixed_order() {
        let mut src = Column::new("price", "decimal");
        src.is_nullable = false;
        src.precision = Some(10);
        src.scale = Some(2);

        let mut tgt = Column::new("price", "numeric");
        tgt.is_nullable = true;
        tgt.precision = Some(12);
        tgt.scale = Some(2);
        tgt.is_identity = true;

        let changes = column_changes(&src, &tgt);
        assert_eq!(
            changes,
            vec![
                "DataType changed from decimal to numeric",
                "IsNullable changed from false to true",
                "Precision changed from 10 to 12",
                "IsIdentity changed from false to true",
            ]
        );
    }

    #[test]
    fn test_null_and_empty_default_are_equal() {
        let mut src = Column::new("name", "varchar");
        src.default_value = None;
        let mut tgt = src.clone();
        tgt.default_value = Some(String::new());

        assert!(column_changes(&src, &tgt).is_empty());
    }

    #[test]
    fn test_default_value_change_renders_null() {
        let mut src = Column::new("state", "int");
        src.default_value = None;
        let mut tgt = src.clone();
        tgt.default_value = Some("0".into());

        let changes = column_changes(&src, &tgt);
        assert_eq!(changes, vec!["DefaultValue changed from NULL to 0"]);
    }

    #[test]
    fn test_max_length_change() {
        let mut src = Column::new("name", "VARCHAR");
        src.max_length = Some(100);
        let mut tgt = src.clone();
        tgt.max_length = Some(120);

        let changes = column_changes(&src, &tgt);
        assert_eq!(changes, vec!["MaxLength changed from 100 to 120"]);
    }

    #[test]
    fn test_index_column_order_is_significant() {
        let src = Index {
            name: "ix_users".into(),
            table: "users".into(),
            schema: String::new(),
            columns: vec!["a".into(), "b".into()],
            is_unique: false,
            is_primary_key: false,
            properties: Default::default(),
        };
        let mut tgt = src.clone();
        tgt.columns = vec!["b".into(), "a".into()];

        let changes = index_changes(&src, &tgt);
        assert_eq!(changes, vec!["Columns changed from [a, b] to [b, a]"]);
    }

    #[test]
    fn test_index_changes_fixed_order() {
        let src = Index {
            name: "ix_users".into(),
            table: "users".into(),
            schema: "public".into(),
            columns: vec!["a".into()],
            is_unique: false,
            is_primary_key: false,
            properties: Default::default(),
        };
        let mut tgt = src.clone();
        tgt.table = "accounts".into();
        tgt.is_unique = true;

        let changes = index_changes(&src, &tgt);
        assert_eq!(
            changes,
            vec![
                "TableName changed from public.users to public.accounts",
                "IsUnique changed from false to true",
            ]
        );
    }

    #[test]
    fn test_constraint_type_change() {
        let src = Constraint::new("c_users", ConstraintKind::Unique, "public", "users");
        let mut tgt = src.clone();
        tgt.kind = ConstraintKind::PrimaryKey;

        let changes = constraint_changes(&src, &tgt);
        assert_eq!(changes, vec!["Type changed from UNIQUE to PRIMARY KEY"]);
    }

    #[test]
    fn test_referenced_columns_checked_only_when_both_present() {
        let mut src = Constraint::new("fk_orders", ConstraintKind::ForeignKey, "", "orders");
        src.referenced_table = Some("users".into());
        src.referenced_columns = Some(vec!["id".into()]);

        let mut tgt = src.clone();
        tgt.referenced_columns = None;

        // One side missing its referenced-column list: predicate is skipped.
        assert!(constraint_changes(&src, &tgt).is_empty());

        tgt.referenced_columns = Some(vec!["user_id".into()]);
        let changes = constraint_changes(&src, &tgt);
        assert_eq!(
            changes,
            vec!["ReferencedColumns changed from [id] to [user_id]"]
        );
    }
}
