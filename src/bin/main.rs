//! relbridge CLI - inspect and query a relational source
//!
//! Usage:
//!   relbridge [--db <file> | --worker <bin> --model <model>] models
//!   relbridge [...] query <sql>
//!   relbridge [...] explain <sql>
//!   relbridge normalize <type> [--sqlite] [--column <name>]
//!
//! Examples:
//!   relbridge --db shop.db models
//!   relbridge --db shop.db query "select * from orders where status = __UTF8__open__UTF8__"
//!   relbridge normalize "VARCHAR(65536)" --sqlite --column order_date

use clap::{Parser, Subcommand};
use relbridge::config::{ModelDescriptor, Settings};
use relbridge::connection::Session;
use relbridge::logging;
use relbridge::observe::ExecContext;
use relbridge::types::{normalize, SourceDialect, TypeContext};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "relbridge")]
#[command(about = "relbridge - uniform metadata and query access to relational sources")]
#[command(version)]
struct Cli {
    /// Path to a relbridge.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the configured connection)
    #[arg(long, global = true, conflicts_with = "worker")]
    db: Option<String>,

    /// Engine worker binary (overrides the configured connection)
    #[arg(long, global = true, requires = "model")]
    worker: Option<String>,

    /// Model passed to the engine worker
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schema snapshot as JSON
    Models,

    /// Run a query and print its rows
    Query {
        /// SQL with sentinel-wrapped string literals
        sql: String,

        /// Fields every row must carry (comma separated)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Print the source's plan for a query
    Explain {
        /// SQL with sentinel-wrapped string literals
        sql: String,
    },

    /// Normalize a vendor type name
    Normalize {
        /// Vendor type, e.g. "VARCHAR(65536) NOT NULL"
        vendor_type: String,

        /// Treat the column as living in a SQLite source
        #[arg(long)]
        sqlite: bool,

        /// Column name, for the SQLite date override
        #[arg(long, default_value = "")]
        column: String,

        /// Table name, for diagnostics
        #[arg(long, default_value = "")]
        table: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_ref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.logging);

    match cli.command {
        Commands::Normalize {
            ref vendor_type,
            sqlite,
            ref column,
            ref table,
        } => cmd_normalize(vendor_type, sqlite, table, column),
        Commands::Models => {
            let Some(mut session) = open_session(&cli, &settings).await else {
                return ExitCode::FAILURE;
            };
            match session.models_json().await {
                Ok(models) => print_json(&models),
                Err(e) => {
                    eprintln!("Metadata error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Query { ref sql, ref fields } => {
            let Some(mut session) = open_session(&cli, &settings).await else {
                return ExitCode::FAILURE;
            };
            let rows = session.query_models_with_fields(sql, fields).await;
            print_envelope(&rows)
        }
        Commands::Explain { ref sql } => {
            let Some(mut session) = open_session(&cli, &settings).await else {
                return ExitCode::FAILURE;
            };
            let plan = session.explain(sql).await;
            print_envelope(&plan)
        }
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, relbridge::config::SettingsError> {
    match path {
        Some(p) => Settings::from_file(p),
        None => Settings::load(),
    }
}

fn descriptor(cli: &Cli, settings: &Settings) -> Result<ModelDescriptor, String> {
    if let Some(db) = &cli.db {
        return Ok(ModelDescriptor::sqlite(db.clone()));
    }
    if let (Some(worker), Some(model)) = (&cli.worker, &cli.model) {
        return Ok(ModelDescriptor::worker(worker.clone(), model.clone())
            .with_worker_args(settings.worker.args.clone())
            .with_timeout_secs(settings.worker.timeout_secs));
    }
    settings.descriptor().map_err(|e| e.to_string())
}

async fn open_session(cli: &Cli, settings: &Settings) -> Option<Session> {
    let descriptor = match descriptor(cli, settings) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("No connection: {}", e);
            return None;
        }
    };
    match Session::open(descriptor, ExecContext::default()).await {
        Ok(session) => Some(session.with_settings(&settings.query)),
        Err(e) => {
            eprintln!("Connection error: {}", e);
            None
        }
    }
}

fn cmd_normalize(vendor_type: &str, sqlite: bool, table: &str, column: &str) -> ExitCode {
    let dialect = if sqlite {
        SourceDialect::Sqlite
    } else {
        SourceDialect::Generic
    };
    let normalized = normalize(vendor_type, &TypeContext::new(dialect, table, column));
    let caps = normalized.scalar_type.capabilities();

    let output = json!({
        "vendorType": vendor_type,
        "scalarType": normalized.scalar_type,
        "representation": format!("{:?}", caps.representation),
        "comparisonOperators": caps
            .comparison_operators
            .iter()
            .map(|op| op.name())
            .collect::<Vec<_>>(),
        "aggregateFunctions": caps
            .aggregate_functions
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>(),
        "diagnostic": normalized.diagnostic.map(|d| d.to_string()),
    });
    print_json(&output)
}

/// Print a pipeline result, failing the process on an error envelope.
fn print_envelope(value: &Value) -> ExitCode {
    let code = print_json(value);
    if value.get("error").is_some() {
        ExitCode::FAILURE
    } else {
        code
    }
}

fn print_json(value: &Value) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error rendering output: {}", e);
            ExitCode::FAILURE
        }
    }
}
