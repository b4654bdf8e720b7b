//! schema-diff CLI - compare two database schemas and generate a migration.

use clap::Parser;
use schema_diff::{DatabaseType, DiffConfig, DiffError, Orchestrator};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser)]
#[command(name = "schema-diff")]
#[command(about = "Compare two database schemas and generate a forward migration script")]
#[command(version)]
struct Cli {
    /// Source connection string
    #[arg(long)]
    source: String,

    /// Target connection string
    #[arg(long)]
    target: String,

    /// Database engine: postgres, mysql, sqlserver, or sqlite
    #[arg(long = "type")]
    engine: String,

    /// Output format: console, sql, json, or markdown
    #[arg(long, default_value = "console")]
    output: String,

    /// Comma-separated list of tables to include
    #[arg(long)]
    tables: Option<String>,

    /// Comma-separated table names or patterns to exclude
    #[arg(long)]
    ignore: Option<String>,

    /// Migration name (default: schema_migration_<yyyyMMdd_HHmmss>)
    #[arg(long)]
    migration_name: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DiffError> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // The output format is validated before any connection is attempted.
    let format: render::OutputFormat = cli.output.parse()?;
    let engine: DatabaseType = cli.engine.parse()?;
    let migration_name = cli
        .migration_name
        .clone()
        .unwrap_or_else(default_migration_name);

    let mut config = DiffConfig::new(&cli.source, &cli.target, engine, &migration_name);
    if let Some(tables) = cli.tables.as_deref() {
        config.read_options.include_tables = split_csv(tables);
    }
    if let Some(ignore) = cli.ignore.as_deref() {
        config.read_options.exclude_tables = split_csv(ignore);
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            // First signal requests cooperative shutdown; a second aborts.
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Aborted");
                std::process::exit(130);
            }
        });
    }

    let orchestrator = Orchestrator::new(config)?;
    let outcome = orchestrator.run(cancel).await?;

    render::emit(format, &outcome)
}

fn default_migration_name() -> String {
    format!(
        "schema_migration_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
