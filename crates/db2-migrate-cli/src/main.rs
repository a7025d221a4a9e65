//! db2-migrate CLI - apply DDL migration plans to IBM DB2.

use clap::{Parser, Subcommand};
use db2_migrate::{
    Config, Connection, DryRunConnection, MigrateError, MigrationPlan, Orchestrator, PlanResult,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "db2-migrate")]
#[command(about = "DDL orchestration for IBM DB2 schema migrations")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a migration plan
    Apply {
        /// Path to YAML migration plan
        #[arg(short, long)]
        plan: PathBuf,

        /// Dry run: read the catalog but only print the DDL that would run
        #[arg(long)]
        dry_run: bool,
    },

    /// Reorganize every table left in reorg-pending state
    Reorg,

    /// Test the database connection and report server capabilities
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<u8, MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Apply { plan, dry_run } => {
            let plan = MigrationPlan::load(&plan)?;
            info!("Loaded plan with {} operations", plan.operations.len());

            let conn = connect(&config).await?;
            let (orchestrator, dry) = if dry_run {
                let dry = Arc::new(DryRunConnection::new(conn));
                (Orchestrator::new(dry.clone()), Some(dry))
            } else {
                (Orchestrator::new(conn), None)
            };

            let result = plan.apply(&orchestrator).await;
            let recorded = match &dry {
                Some(dry) => Some(dry.recorded().await),
                None => None,
            };

            if cli.output_json {
                let mut output = serde_json::to_value(&result)?;
                if let Some(statements) = &recorded {
                    output["dry_run_statements"] = serde_json::json!(statements);
                }
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_plan_result(&result, recorded.as_deref());
            }

            if let Some(failure) = &result.failure {
                eprintln!(
                    "Operation {} ({}) failed: {}",
                    failure.index + 1,
                    failure.operation,
                    failure.error
                );
                return Ok(failure.exit_code);
            }
        }

        Commands::Reorg => {
            let orchestrator = Orchestrator::new(connect(&config).await?);
            let reorganized = orchestrator.reorg_pending().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&reorganized)?);
            } else if reorganized.is_empty() {
                println!("No tables are reorg-pending");
            } else {
                println!("Reorganized {} tables:", reorganized.len());
                for table in &reorganized {
                    println!("  {}.{}", table.schema, table.table);
                }
            }
        }

        Commands::HealthCheck => {
            let start = Instant::now();
            let orchestrator = Orchestrator::new(connect(&config).await?);
            let info = orchestrator.dialect_info().await?;
            let version = orchestrator.server_version_info().await?;
            let nullable_unique = orchestrator.supports_nullable_unique_constraints().await?;
            let pending = orchestrator.pending_reorgs().await?;
            let latency_ms = start.elapsed().as_millis() as u64;

            if cli.output_json {
                let output = serde_json::json!({
                    "connected": true,
                    "latency_ms": latency_ms,
                    "dbms_name": info.dbms_name,
                    "dbms_ver": info.dbms_ver,
                    "server_version": version,
                    "nullable_unique_as_index": nullable_unique,
                    "transactional_ddl": orchestrator.transactional_ddl(),
                    "reorg_pending": pending,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("Health Check Results:");
                println!("  Connection: OK ({}ms)", latency_ms);
                println!(
                    "  Server: {} {}",
                    info.dbms_name.as_deref().unwrap_or("unknown"),
                    info.dbms_ver.as_deref().unwrap_or("unknown")
                );
                println!(
                    "  Unique constraints over nullable columns: {}",
                    if nullable_unique {
                        "unique indexes (EXCLUDE NULL KEYS)"
                    } else {
                        "constraints"
                    }
                );
                println!("  Reorg-pending tables: {}", pending.len());
            }
        }
    }

    Ok(0)
}

fn print_plan_result(result: &PlanResult, recorded: Option<&[String]>) {
    if let Some(statements) = recorded {
        println!("\nDry run, statements that would run:");
        for sql in statements {
            println!("  {};", sql);
        }
    }

    println!(
        "\nPlan {}: {}/{} operations",
        result.status, result.operations_applied, result.operations_total
    );
    println!("  Statements: {}", result.statements_executed);
    println!("  Duration: {:.2}s", result.duration_seconds);
}

#[cfg(feature = "odbc")]
async fn connect(config: &Config) -> Result<Arc<dyn Connection>, MigrateError> {
    let conn = db2_migrate::OdbcConnection::connect(&config.connection, &config.dialect).await?;
    Ok(Arc::new(conn))
}

#[cfg(not(feature = "odbc"))]
async fn connect(config: &Config) -> Result<Arc<dyn Connection>, MigrateError> {
    Err(MigrateError::Config(format!(
        "cannot connect to {}: db2-migrate was built without ODBC support \
         (rebuild with `--features odbc`)",
        config.connection.describe()
    )))
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
