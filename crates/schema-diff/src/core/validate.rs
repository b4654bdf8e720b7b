//! Schema integrity validation.
//!
//! The orchestrator runs this gate on every schema before it reaches the
//! comparator. No partial or malformed schema is ever compared.

use std::collections::HashSet;

use crate::core::schema::Schema;
use crate::error::{DiffError, Result};

/// Validate a schema snapshot before comparison.
///
/// Checks: non-empty database name; every table has a non-empty name; every
/// column has a non-empty name and a non-empty data type; table full-names,
/// index names, and per-table column/constraint names are unique.
pub fn validate_schema(schema: &Schema) -> Result<()> {
    if schema.database.is_empty() {
        return Err(DiffError::Validation(
            "schema has an empty database name".into(),
        ));
    }

    let mut table_names = HashSet::new();
    for table in &schema.tables {
        if table.name.is_empty() {
            return Err(DiffError::Validation(format!(
                "database '{}' contains a table with an empty name",
                schema.database
            )));
        }

        let full_name = table.full_name();
        if !table_names.insert(full_name.clone()) {
            return Err(DiffError::Validation(format!(
                "duplicate table name '{}' in database '{}'",
                full_name, schema.database
            )));
        }

        let mut column_names = HashSet::new();
        for column in &table.columns {
            if column.name.is_empty() {
                return Err(DiffError::Validation(format!(
                    "table '{}' contains a column with an empty name",
                    full_name
                )));
            }
            if column.data_type.is_empty() {
                return Err(DiffError::Validation(format!(
                    "column '{}.{}' has an empty data type",
                    full_name, column.name
                )));
            }
            if !column_names.insert(column.name.as_str()) {
                return Err(DiffError::Validation(format!(
                    "duplicate column name '{}' in table '{}'",
                    column.name, full_name
                )));
            }
        }

        let mut constraint_names = HashSet::new();
        for constraint in &table.constraints {
            if !constraint_names.insert(constraint.name.as_str()) {
                return Err(DiffError::Validation(format!(
                    "duplicate constraint name '{}' in table '{}'",
                    constraint.name, full_name
                )));
            }
        }
    }

    let mut index_names = HashSet::new();
    for index in &schema.indexes {
        if !index_names.insert(index.name.as_str()) {
            return Err(DiffError::Validation(format!(
                "duplicate index name '{}' in database '{}'",
                index.name, schema.database
            )));
        }
    }

    Ok(())
}
