//! Schema and metadata types for database tables, columns, constraints,
//! indexes, and views.
//!
//! These types provide a database-agnostic representation of schema metadata.
//! Back-ends normalize their catalog rows into this model; the comparator and
//! synthesizer operate on it exclusively and never touch a live connection.
//!
//! All collections are ordered (`Vec`) and all property maps are `BTreeMap`,
//! so two structurally equal schemas iterate identically.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Property-bag type used on every schema object.
pub type Properties = BTreeMap<String, String>;

/// Normalized representation of one database schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Database name.
    pub database: String,

    /// Tables, ordered by (schema namespace, name).
    pub tables: Vec<Table>,

    /// Views, ordered by (schema namespace, name).
    pub views: Vec<View>,

    /// Indexes across all tables, ordered by (schema namespace, table, name).
    pub indexes: Vec<Index>,

    /// Free-form metadata (engine version, read timestamp, ...).
    pub metadata: Properties,
}

impl Schema {
    /// Create an empty schema for a database.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            tables: Vec::new(),
            views: Vec::new(),
            indexes: Vec::new(),
            metadata: Properties::new(),
        }
    }

    /// Find a table by its full name.
    pub fn table(&self, full_name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.full_name() == full_name)
    }
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Schema namespace (`public`, `dbo`, ...). Empty for engines without
    /// namespaces (SQLite, MySQL scoped to one database).
    pub schema: String,

    /// Column definitions in catalog ordinal order.
    pub columns: Vec<Column>,

    /// Constraints owned by this table.
    pub constraints: Vec<Constraint>,

    /// Engine-specific properties.
    pub properties: Properties,
}

impl Table {
    /// Create a table with no columns or constraints.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
            properties: Properties::new(),
        }
    }

    /// Fully qualified name: `schema.name` when the namespace is non-empty,
    /// else just `name`.
    pub fn full_name(&self) -> String {
        if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }

    /// Find a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Data type in the engine's native spelling (e.g. "character varying",
    /// "varchar", "VARCHAR").
    pub data_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Default-value expression in raw engine form, if any.
    pub default_value: Option<String>,

    /// Maximum length for string types.
    pub max_length: Option<i64>,

    /// Numeric precision.
    pub precision: Option<i64>,

    /// Numeric scale.
    pub scale: Option<i64>,

    /// Whether the column is an identity/auto-increment column.
    pub is_identity: bool,

    /// Whether the column is computed/generated.
    pub is_computed: bool,

    /// Engine-specific properties.
    pub properties: Properties,
}

impl Column {
    /// Create a column with the given name and type; everything else takes
    /// the neutral default (nullable, no length/precision, not identity).
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default_value: None,
            max_length: None,
            precision: None,
            scale: None,
            is_identity: false,
            is_computed: false,
            properties: Properties::new(),
        }
    }
}

/// The closed set of constraint kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
    Default,
    NotNull,
}

impl ConstraintKind {
    /// Parse an engine catalog label into a constraint kind.
    ///
    /// Every driver funnels its catalog spelling through here so the mapping
    /// lives in exactly one place. Returns `None` for labels outside the
    /// closed set (engines report exotic kinds we do not model).
    pub fn from_catalog(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "PRIMARY KEY" | "PK" => Some(ConstraintKind::PrimaryKey),
            "FOREIGN KEY" | "F" | "FK" => Some(ConstraintKind::ForeignKey),
            "UNIQUE" | "UQ" => Some(ConstraintKind::Unique),
            "CHECK" | "C" => Some(ConstraintKind::Check),
            "DEFAULT" | "D" => Some(ConstraintKind::Default),
            "NOT NULL" => Some(ConstraintKind::NotNull),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConstraintKind::PrimaryKey => "PRIMARY KEY",
            ConstraintKind::ForeignKey => "FOREIGN KEY",
            ConstraintKind::Unique => "UNIQUE",
            ConstraintKind::Check => "CHECK",
            ConstraintKind::Default => "DEFAULT",
            ConstraintKind::NotNull => "NOT NULL",
        };
        f.write_str(label)
    }
}

/// Constraint metadata.
///
/// Foreign keys carry the referenced table *name*, never a pointer into the
/// schema graph, so the model stays an acyclic value tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    /// Constraint name.
    pub name: String,

    /// Constraint kind.
    pub kind: ConstraintKind,

    /// Owning table name.
    pub table: String,

    /// Schema namespace of the owning table.
    pub schema: String,

    /// Column names involved, in constraint ordinal order.
    pub columns: Vec<String>,

    /// Referenced table name (foreign keys only).
    pub referenced_table: Option<String>,

    /// Referenced column names in ordinal order (foreign keys only).
    pub referenced_columns: Option<Vec<String>>,

    /// Engine-specific properties (e.g. a check expression).
    pub properties: Properties,
}

impl Constraint {
    /// Create a constraint with no columns.
    pub fn new(
        name: impl Into<String>,
        kind: ConstraintKind,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            table: table.into(),
            schema: schema.into(),
            columns: Vec::new(),
            referenced_table: None,
            referenced_columns: None,
            properties: Properties::new(),
        }
    }
}

/// Index metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Owning table name.
    pub table: String,

    /// Schema namespace of the owning table.
    pub schema: String,

    /// Indexed column names in index position order.
    pub columns: Vec<String>,

    /// Whether the index is unique.
    pub is_unique: bool,

    /// Whether the index backs the primary key.
    pub is_primary_key: bool,

    /// Engine-specific properties. The raw definition text, when the engine
    /// surfaces one, is stored under the key "Definition".
    pub properties: Properties,
}

/// Property key holding an index's raw definition text.
pub const INDEX_DEFINITION_PROPERTY: &str = "Definition";

/// View metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    /// View name.
    pub name: String,

    /// Schema namespace.
    pub schema: String,

    /// View definition text.
    pub definition: String,

    /// Engine-specific properties.
    pub properties: Properties,
}
