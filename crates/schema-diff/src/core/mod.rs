//! Core abstractions for engine-agnostic schema comparison.
//!
//! - [`schema`]: normalized schema metadata types
//! - [`traits`]: the [`SchemaReader`] capability set and read options
//! - [`validate`]: the integrity gate schemas pass before comparison
//!
//! The core module defines database-agnostic types that driver modules
//! (`drivers/postgres`, `drivers/mysql`, ...) populate. The comparator and
//! migration synthesizer consume these types only.

pub mod schema;
pub mod traits;
pub mod validate;

pub use schema::{
    Column, Constraint, ConstraintKind, Index, Properties, Schema, Table, View,
    INDEX_DEFINITION_PROPERTY,
};
pub use traits::{DatabaseType, ReadOptions, SchemaReader};
pub use validate::validate_schema;
