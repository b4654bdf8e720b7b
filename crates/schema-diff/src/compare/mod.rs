//! Schema comparator.
//!
//! [`compare`] is a pure function over two validated [`Schema`] snapshots.
//! It never performs I/O, holds no state, and is deterministic: equal inputs
//! produce equal diffs including every list ordering. Missing/modified
//! partitions preserve source iteration order; extra partitions preserve
//! target iteration order.

pub mod rules;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::schema::{Column, Constraint, Index, Schema, Table};

/// Summary counters for one comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    /// Total number of tables seen across both schemas.
    pub tables_compared: usize,

    /// Missing + extra + modified table counts.
    pub differences_found: usize,

    /// Tables present in source only.
    pub missing_tables: usize,

    /// Tables present in target only.
    pub extra_tables: usize,

    /// Tables present in both with at least one difference.
    pub modified_tables: usize,
}

/// A column present in both schemas whose definitions differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedColumn {
    pub source: Column,
    pub target: Column,
    /// Ordered human-readable difference list (contractual, see
    /// [`rules::column_changes`]).
    pub changes: Vec<String>,
}

/// A constraint present in both tables whose definitions differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedConstraint {
    pub source: Constraint,
    pub target: Constraint,
    pub changes: Vec<String>,
}

/// An index present in both schemas whose definitions differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedIndex {
    pub source: Index,
    pub target: Index,
    pub changes: Vec<String>,
}

/// Differences for a table present in both schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDiff {
    /// Full name of the table.
    pub table: String,

    pub missing_columns: Vec<Column>,
    pub extra_columns: Vec<Column>,
    pub modified_columns: Vec<ModifiedColumn>,

    pub missing_constraints: Vec<Constraint>,
    pub extra_constraints: Vec<Constraint>,
    pub modified_constraints: Vec<ModifiedConstraint>,
}

impl TableDiff {
    /// True when every partition is empty.
    pub fn is_empty(&self) -> bool {
        self.missing_columns.is_empty()
            && self.extra_columns.is_empty()
            && self.modified_columns.is_empty()
            && self.missing_constraints.is_empty()
            && self.extra_constraints.is_empty()
            && self.modified_constraints.is_empty()
    }
}

/// Result of comparing two schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaComparison {
    pub summary: DiffSummary,

    /// Tables present in source only (source order).
    pub missing_tables: Vec<Table>,

    /// Tables present in target only (target order).
    pub extra_tables: Vec<Table>,

    /// Tables present in both with differences (source order).
    pub modified_tables: Vec<TableDiff>,

    /// Indexes present in source only, keyed by index name alone.
    pub missing_indexes: Vec<Index>,

    /// Indexes present in target only.
    pub extra_indexes: Vec<Index>,

    /// Indexes present in both with differences.
    pub modified_indexes: Vec<ModifiedIndex>,
}

impl SchemaComparison {
    /// True when the schemas were structurally identical.
    pub fn is_empty(&self) -> bool {
        self.missing_tables.is_empty()
            && self.extra_tables.is_empty()
            && self.modified_tables.is_empty()
            && self.missing_indexes.is_empty()
            && self.extra_indexes.is_empty()
            && self.modified_indexes.is_empty()
    }
}

/// Compare two validated schemas.
pub fn compare(source: &Schema, target: &Schema) -> SchemaComparison {
    let source_tables: HashMap<String, &Table> = source
        .tables
        .iter()
        .map(|t| (t.full_name(), t))
        .collect();
    let target_tables: HashMap<String, &Table> = target
        .tables
        .iter()
        .map(|t| (t.full_name(), t))
        .collect();

    let missing_tables: Vec<Table> = source
        .tables
        .iter()
        .filter(|t| !target_tables.contains_key(&t.full_name()))
        .cloned()
        .collect();

    let extra_tables: Vec<Table> = target
        .tables
        .iter()
        .filter(|t| !source_tables.contains_key(&t.full_name()))
        .cloned()
        .collect();

    let modified_tables: Vec<TableDiff> = source
        .tables
        .iter()
        .filter_map(|src| {
            let tgt = target_tables.get(&src.full_name())?;
            let diff = compare_tables(src, tgt);
            (!diff.is_empty()).then_some(diff)
        })
        .collect();

    // Indexes are matched by name alone, not scoped by table.
    let source_indexes: HashMap<&str, &Index> =
        source.indexes.iter().map(|i| (i.name.as_str(), i)).collect();
    let target_indexes: HashMap<&str, &Index> =
        target.indexes.iter().map(|i| (i.name.as_str(), i)).collect();

    let missing_indexes: Vec<Index> = source
        .indexes
        .iter()
        .filter(|i| !target_indexes.contains_key(i.name.as_str()))
        .cloned()
        .collect();

    let extra_indexes: Vec<Index> = target
        .indexes
        .iter()
        .filter(|i| !source_indexes.contains_key(i.name.as_str()))
        .cloned()
        .collect();

    let modified_indexes: Vec<ModifiedIndex> = source
        .indexes
        .iter()
        .filter_map(|src| {
            let tgt = target_indexes.get(src.name.as_str())?;
            let changes = rules::index_changes(src, tgt);
            (!changes.is_empty()).then(|| ModifiedIndex {
                source: src.clone(),
                target: (*tgt).clone(),
                changes,
            })
        })
        .collect();

    let summary = DiffSummary {
        tables_compared: source.tables.len() + target.tables.len(),
        differences_found: missing_tables.len() + extra_tables.len() + modified_tables.len(),
        missing_tables: missing_tables.len(),
        extra_tables: extra_tables.len(),
        modified_tables: modified_tables.len(),
    };

    SchemaComparison {
        summary,
        missing_tables,
        extra_tables,
        modified_tables,
        missing_indexes,
        extra_indexes,
        modified_indexes,
    }
}

/// Compare two tables with the same full name.
fn compare_tables(src: &Table, tgt: &Table) -> TableDiff {
    let src_columns: HashMap<&str, &Column> =
        src.columns.iter().map(|c| (c.name.as_str(), c)).collect();
    let tgt_columns: HashMap<&str, &Column> =
        tgt.columns.iter().map(|c| (c.name.as_str(), c)).collect();

    let missing_columns: Vec<Column> = src
        .columns
        .iter()
        .filter(|c| !tgt_columns.contains_key(c.name.as_str()))
        .cloned()
        .collect();

    let extra_columns: Vec<Column> = tgt
        .columns
        .iter()
        .filter(|c| !src_columns.contains_key(c.name.as_str()))
        .cloned()
        .collect();

    let modified_columns: Vec<ModifiedColumn> = src
        .columns
        .iter()
        .filter_map(|s| {
            let t = tgt_columns.get(s.name.as_str())?;
            let changes = rules::column_changes(s, t);
            (!changes.is_empty()).then(|| ModifiedColumn {
                source: s.clone(),
                target: (*t).clone(),
                changes,
            })
        })
        .collect();

    let src_constraints: HashMap<&str, &Constraint> =
        src.constraints.iter().map(|c| (c.name.as_str(), c)).collect();
    let tgt_constraints: HashMap<&str, &Constraint> =
        tgt.constraints.iter().map(|c| (c.name.as_str(), c)).collect();

    let missing_constraints: Vec<Constraint> = src
        .constraints
        .iter()
        .filter(|c| !tgt_constraints.contains_key(c.name.as_str()))
        .cloned()
        .collect();

    let extra_constraints: Vec<Constraint> = tgt
        .constraints
        .iter()
        .filter(|c| !src_constraints.contains_key(c.name.as_str()))
        .cloned()
        .collect();

    let modified_constraints: Vec<ModifiedConstraint> = src
        .constraints
        .iter()
        .filter_map(|s| {
            let t = tgt_constraints.get(s.name.as_str())?;
            let changes = rules::constraint_changes(s, t);
            (!changes.is_empty()).then(|| ModifiedConstraint {
                source: s.clone(),
                target: (*t).clone(),
                changes,
            })
        })
        .collect();

    TableDiff {
        table: src.full_name(),
        missing_columns,
        extra_columns,
        modified_columns,
        missing_constraints,
        extra_constraints,
        modified_constraints,
    }
}
