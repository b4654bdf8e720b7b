//! Report builder.
//!
//! Assembles the structured payload consumed by the external renderers
//! (console, JSON, Markdown). Field names and partition ordering are stable:
//! renderers may format freely but never reorder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compare::{DiffSummary, ModifiedIndex, SchemaComparison, TableDiff};
use crate::core::schema::{Index, Table};
use crate::core::traits::DatabaseType;
use crate::error::Result;

/// Report header fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,

    /// Migration name the run was invoked with.
    pub migration_name: String,

    /// Engine family of both endpoints.
    pub engine: DatabaseType,
}

/// Structured comparison report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: DiffSummary,

    /// Tables present in source only, with their full definitions.
    pub missing_tables: Vec<Table>,

    /// Tables present in target only.
    pub extra_tables: Vec<Table>,

    /// Tables present in both, with nested column/constraint partitions.
    pub modified_tables: Vec<TableDiff>,

    pub missing_indexes: Vec<Index>,
    pub extra_indexes: Vec<Index>,
    pub modified_indexes: Vec<ModifiedIndex>,
}

impl Report {
    /// Build a report from a comparison, preserving its partition ordering.
    pub fn build(comparison: &SchemaComparison, metadata: ReportMetadata) -> Self {
        Self {
            metadata,
            summary: comparison.summary.clone(),
            missing_tables: comparison.missing_tables.clone(),
            extra_tables: comparison.extra_tables.clone(),
            modified_tables: comparison.modified_tables.clone(),
            missing_indexes: comparison.missing_indexes.clone(),
            extra_indexes: comparison.extra_indexes.clone(),
            modified_indexes: comparison.modified_indexes.clone(),
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
