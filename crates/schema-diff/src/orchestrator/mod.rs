//! Comparison orchestrator - main workflow coordinator.
//!
//! Sequences the pipeline: boundary validation, connection validation with
//! retry, source read, target read, schema validation, comparison, and
//! artifact synthesis. Control flow is strictly forward; the two schema reads
//! never interleave, and the cancellation token is honored between and during
//! every awaited step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::compare::{compare, SchemaComparison};
use crate::config::DiffConfig;
use crate::core::schema::Schema;
use crate::core::traits::SchemaReader;
use crate::core::validate::validate_schema;
use crate::drivers::SchemaReaderImpl;
use crate::error::{DiffError, Result};
use crate::migrate::synthesize;
use crate::report::{Report, ReportMetadata};

/// Window covering both connection-validation probes.
const CONNECTION_VALIDATION_WINDOW: Duration = Duration::from_secs(30);

/// Window for each schema read.
const SCHEMA_READ_WINDOW: Duration = Duration::from_secs(300);

/// Connection probes per endpoint before giving up.
const CONNECT_ATTEMPTS: u32 = 3;

/// First retry backoff; doubles per attempt.
const CONNECT_BACKOFF_START: Duration = Duration::from_secs(1);

/// Comparison orchestrator.
pub struct Orchestrator {
    config: DiffConfig,
}

/// Result of one comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffOutcome {
    /// Unique run identifier.
    pub run_id: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Redacted source endpoint.
    pub source_display: String,

    /// Redacted target endpoint.
    pub target_display: String,

    /// The computed diff.
    pub comparison: SchemaComparison,

    /// Structured report payload.
    pub report: Report,

    /// Forward migration script.
    pub migration_script: String,
}

impl Orchestrator {
    /// Create an orchestrator, validating the configuration up front.
    /// A config that fails validation never opens a connection.
    pub fn new(config: DiffConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the comparison pipeline.
    pub async fn run(&self, cancel: CancellationToken) -> Result<DiffOutcome> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        let source =
            SchemaReaderImpl::from_connection_string(self.config.engine, &self.config.source)?;
        let target =
            SchemaReaderImpl::from_connection_string(self.config.engine, &self.config.target)?;

        info!(
            "Comparing {} -> {} ({})",
            source.display_name(),
            target.display_name(),
            self.config.engine
        );

        self.validate_connections(&cancel, &source, &target).await?;

        let source_schema = self.read_one(&cancel, &source, "source").await?;
        // The target read starts only after the source read has fully
        // completed; back-ends hold per-connection resources.
        let target_schema = self.read_one(&cancel, &target, "target").await?;

        validate_schema(&source_schema)?;
        validate_schema(&target_schema)?;

        let comparison = compare(&source_schema, &target_schema);
        info!(
            "Compared {} tables: {} differences",
            comparison.summary.tables_compared, comparison.summary.differences_found
        );

        let generated_at = Utc::now();
        let migration_script = synthesize(
            &comparison,
            self.config.engine,
            &self.config.migration_name,
            generated_at,
        );
        let report = Report::build(
            &comparison,
            ReportMetadata {
                generated_at,
                migration_name: self.config.migration_name.clone(),
                engine: self.config.engine,
            },
        );

        let completed_at = Utc::now();
        Ok(DiffOutcome {
            run_id,
            started_at,
            completed_at,
            duration_seconds: (completed_at - started_at).num_milliseconds() as f64 / 1000.0,
            source_display: source.display_name(),
            target_display: target.display_name(),
            comparison,
            report,
            migration_script,
        })
    }

    /// Probe both endpoints inside one bounded window.
    async fn validate_connections(
        &self,
        cancel: &CancellationToken,
        source: &SchemaReaderImpl,
        target: &SchemaReaderImpl,
    ) -> Result<()> {
        let probes = async {
            ensure_reachable(source, "source").await?;
            ensure_reachable(target, "target").await
        };

        match with_cancel(cancel, tokio::time::timeout(CONNECTION_VALIDATION_WINDOW, probes))
            .await?
        {
            Ok(result) => result,
            Err(_) => Err(DiffError::Timeout(format!(
                "connection validation exceeded {} seconds",
                CONNECTION_VALIDATION_WINDOW.as_secs()
            ))),
        }
    }

    /// Read one schema inside the per-read window.
    async fn read_one(
        &self,
        cancel: &CancellationToken,
        reader: &SchemaReaderImpl,
        label: &str,
    ) -> Result<Schema> {
        let read = reader.read_schema(&self.config.read_options);
        let schema = match with_cancel(cancel, tokio::time::timeout(SCHEMA_READ_WINDOW, read))
            .await?
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(DiffError::Timeout(format!(
                    "{} schema read exceeded {} seconds",
                    label,
                    SCHEMA_READ_WINDOW.as_secs()
                )))
            }
        };

        info!(
            "Read {} schema '{}' ({} tables)",
            label,
            schema.database,
            schema.tables.len()
        );
        Ok(schema)
    }
}

/// Race a future against cancellation.
async fn with_cancel<F, T>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(DiffError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Probe an endpoint with retry and exponential backoff.
async fn ensure_reachable(reader: &SchemaReaderImpl, label: &str) -> Result<()> {
    let mut backoff = CONNECT_BACKOFF_START;
    for attempt in 1..=CONNECT_ATTEMPTS {
        if reader.test_connection().await {
            return Ok(());
        }
        warn!(
            "Connection attempt {}/{} to {} endpoint {} failed",
            attempt,
            CONNECT_ATTEMPTS,
            label,
            reader.display_name()
        );
        if attempt < CONNECT_ATTEMPTS {
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }
    }
    Err(DiffError::connection(
        format!(
            "could not reach {} after {} attempts",
            reader.display_name(),
            CONNECT_ATTEMPTS
        ),
        format!("validating {} endpoint", label),
    ))
}
