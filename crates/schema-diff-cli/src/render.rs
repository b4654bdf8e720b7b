//! Output rendering: console trees plus the sql/json/markdown artifacts.
//!
//! Formatting only; every value rendered here comes from the report payload
//! and the synthesized script, in the ordering the comparator produced.

use std::fmt::Write as _;
use std::str::FromStr;

use schema_diff::{DiffError, DiffOutcome, TableDiff};

/// Output artifact selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Console,
    Sql,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, DiffError> {
        match s.to_lowercase().as_str() {
            "console" => Ok(OutputFormat::Console),
            "sql" => Ok(OutputFormat::Sql),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(DiffError::Validation(format!(
                "Unknown output format: '{}'. Supported formats: console, sql, json, markdown",
                other
            ))),
        }
    }
}

/// Emit the requested artifact for a completed run.
pub fn emit(format: OutputFormat, outcome: &DiffOutcome) -> Result<(), DiffError> {
    let name = &outcome.report.metadata.migration_name;
    match format {
        OutputFormat::Console => {
            print!("{}", render_console(outcome));
            Ok(())
        }
        OutputFormat::Sql => {
            let path = format!("{}.sql", name);
            std::fs::write(&path, &outcome.migration_script)?;
            println!("Migration script written to {}", path);
            Ok(())
        }
        OutputFormat::Json => {
            let path = format!("{}.json", name);
            std::fs::write(&path, render_json(outcome)?)?;
            println!("Report written to {}", path);
            Ok(())
        }
        OutputFormat::Markdown => {
            let path = format!("{}.md", name);
            std::fs::write(&path, render_markdown(outcome))?;
            println!("Report written to {}", path);
            Ok(())
        }
    }
}

/// Report payload plus the migration script under `migrationScript`.
fn render_json(outcome: &DiffOutcome) -> Result<String, DiffError> {
    let mut value = serde_json::to_value(&outcome.report)?;
    if let Some(object) = value.as_object_mut() {
        object.insert(
            "migrationScript".to_string(),
            serde_json::Value::String(outcome.migration_script.clone()),
        );
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

fn render_console(outcome: &DiffOutcome) -> String {
    let summary = &outcome.comparison.summary;
    let mut out = String::new();

    let _ = writeln!(out, "Schema comparison ({})", outcome.report.metadata.engine);
    let _ = writeln!(out, "  Source: {}", outcome.source_display);
    let _ = writeln!(out, "  Target: {}", outcome.target_display);
    let _ = writeln!(out, "  Tables compared: {}", summary.tables_compared);
    let _ = writeln!(out, "  Differences found: {}", summary.differences_found);

    if !outcome.comparison.missing_tables.is_empty() {
        let _ = writeln!(out, "\nMissing tables (present in source only):");
        for table in &outcome.comparison.missing_tables {
            let _ = writeln!(out, "  - {}", table.full_name());
        }
    }

    if !outcome.comparison.extra_tables.is_empty() {
        let _ = writeln!(out, "\nExtra tables (present in target only):");
        for table in &outcome.comparison.extra_tables {
            let _ = writeln!(out, "  + {}", table.full_name());
        }
    }

    if !outcome.comparison.modified_tables.is_empty() {
        let _ = writeln!(out, "\nModified tables:");
        for diff in &outcome.comparison.modified_tables {
            render_console_table(&mut out, diff);
        }
    }

    if !outcome.comparison.missing_indexes.is_empty()
        || !outcome.comparison.extra_indexes.is_empty()
        || !outcome.comparison.modified_indexes.is_empty()
    {
        let _ = writeln!(out, "\nIndexes:");
        for index in &outcome.comparison.missing_indexes {
            let _ = writeln!(out, "  - {} (on {})", index.name, index.table);
        }
        for index in &outcome.comparison.extra_indexes {
            let _ = writeln!(out, "  + {} (on {})", index.name, index.table);
        }
        for modified in &outcome.comparison.modified_indexes {
            let _ = writeln!(out, "  ~ {}", modified.source.name);
            for change in &modified.changes {
                let _ = writeln!(out, "      {}", change);
            }
        }
    }

    out
}

fn render_console_table(out: &mut String, diff: &TableDiff) {
    let _ = writeln!(out, "  ~ {}", diff.table);
    for column in &diff.missing_columns {
        let _ = writeln!(out, "      - column {}", column.name);
    }
    for column in &diff.extra_columns {
        let _ = writeln!(out, "      + column {}", column.name);
    }
    for modified in &diff.modified_columns {
        let _ = writeln!(out, "      ~ column {}:", modified.source.name);
        for change in &modified.changes {
            let _ = writeln!(out, "          {}", change);
        }
    }
    for constraint in &diff.missing_constraints {
        let _ = writeln!(out, "      - constraint {}", constraint.name);
    }
    for constraint in &diff.extra_constraints {
        let _ = writeln!(out, "      + constraint {}", constraint.name);
    }
    for modified in &diff.modified_constraints {
        let _ = writeln!(out, "      ~ constraint {}:", modified.source.name);
        for change in &modified.changes {
            let _ = writeln!(out, "          {}", change);
        }
    }
}

fn render_markdown(outcome: &DiffOutcome) -> String {
    let metadata = &outcome.report.metadata;
    let summary = &outcome.comparison.summary;
    let mut out = String::new();

    let _ = writeln!(out, "# Schema Comparison Report\n");
    let _ = writeln!(out, "- **Migration**: {}", metadata.migration_name);
    let _ = writeln!(
        out,
        "- **Generated**: {}",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "- **Engine**: {}", metadata.engine);
    let _ = writeln!(out, "- **Source**: {}", outcome.source_display);
    let _ = writeln!(out, "- **Target**: {}\n", outcome.target_display);

    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "| Metric | Count |");
    let _ = writeln!(out, "|--------|-------|");
    let _ = writeln!(out, "| Tables compared | {} |", summary.tables_compared);
    let _ = writeln!(out, "| Differences found | {} |", summary.differences_found);
    let _ = writeln!(out, "| Missing tables | {} |", summary.missing_tables);
    let _ = writeln!(out, "| Extra tables | {} |", summary.extra_tables);
    let _ = writeln!(out, "| Modified tables | {} |", summary.modified_tables);

    if !outcome.comparison.missing_tables.is_empty() {
        let _ = writeln!(out, "\n## Missing Tables\n");
        for table in &outcome.comparison.missing_tables {
            let _ = writeln!(out, "- `{}`", table.full_name());
        }
    }

    if !outcome.comparison.extra_tables.is_empty() {
        let _ = writeln!(out, "\n## Extra Tables\n");
        for table in &outcome.comparison.extra_tables {
            let _ = writeln!(out, "- `{}`", table.full_name());
        }
    }

    if !outcome.comparison.modified_tables.is_empty() {
        let _ = writeln!(out, "\n## Modified Tables\n");
        for diff in &outcome.comparison.modified_tables {
            let _ = writeln!(out, "### `{}`\n", diff.table);
            for column in &diff.missing_columns {
                let _ = writeln!(out, "- Missing column `{}`", column.name);
            }
            for column in &diff.extra_columns {
                let _ = writeln!(out, "- Extra column `{}`", column.name);
            }
            for modified in &diff.modified_columns {
                for change in &modified.changes {
                    let _ = writeln!(out, "- `{}`: {}", modified.source.name, change);
                }
            }
            let _ = writeln!(out);
        }
    }

    let _ = writeln!(out, "\n## Migration Script\n");
    let _ = writeln!(out, "```sql\n{}```", outcome.migration_script);

    out
}
