//! Run configuration and boundary validation.
//!
//! Every rule here is enforced before any I/O happens: a config that fails
//! validation never opens a connection.

use serde::{Deserialize, Serialize};

use crate::core::traits::{DatabaseType, ReadOptions};
use crate::error::{DiffError, Result};

/// Maximum accepted connection-string length.
pub const MAX_CONNECTION_STRING_LEN: usize = 2000;

/// Characters rejected in migration names (invalid in filesystem paths).
const INVALID_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Configuration for one comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Source connection string.
    pub source: String,

    /// Target connection string.
    pub target: String,

    /// Engine family of both endpoints.
    pub engine: DatabaseType,

    /// Migration name used for the script header and output file names.
    pub migration_name: String,

    /// What the schema reads retain.
    #[serde(default)]
    pub read_options: ReadOptions,
}

impl DiffConfig {
    /// Create a config with default read options.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        engine: DatabaseType,
        migration_name: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            engine,
            migration_name: migration_name.into(),
            read_options: ReadOptions::default(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_connection_string("source", &self.source)?;
        validate_connection_string("target", &self.target)?;
        validate_migration_name(&self.migration_name)?;
        Ok(())
    }
}

fn validate_connection_string(label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DiffError::Validation(format!(
            "{} connection string is required",
            label
        )));
    }
    if value.len() > MAX_CONNECTION_STRING_LEN {
        return Err(DiffError::Validation(format!(
            "{} connection string exceeds {} characters",
            label, MAX_CONNECTION_STRING_LEN
        )));
    }
    Ok(())
}

fn validate_migration_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DiffError::Validation("migration name is required".into()));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| INVALID_NAME_CHARS.contains(c) || c.is_control())
    {
        return Err(DiffError::Validation(format!(
            "migration name contains character {:?} which is invalid in a file name",
            bad
        )));
    }
    Ok(())
}
