//! db-envelope - run one SQL statement and print a JSON response envelope.

mod cli;

use cli::Cli;
use db_envelope::config::{Config, ConnectionConfig};
use db_envelope::db;
use db_envelope::error::{EnvelopeError, Result};
use db_envelope::logging;
use db_envelope::query::QueryExecutor;
use db_envelope::response::{Response, STATUS_INTERNAL_ERROR};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Load .env before anything reads RUST_LOG or PG* variables
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Ignoring .env file: {e}");
        }
    }

    match run(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Runs the statement and prints its envelope.
///
/// Returns `Ok(false)` when the statement failed and an error envelope was printed.
async fn run(cli: &Cli) -> Result<bool> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let connection = resolve_connection(cli, &config)?.ok_or_else(|| {
        EnvelopeError::config(
            "No database connection configured. Use --help for usage information.",
        )
    })?;

    let sql = cli.read_sql()?;

    info!("Connection: {}", connection.display_string());
    let mut conn = db::connect(&connection).await?;

    let outcome = QueryExecutor::new(conn.as_mut()).execute(&sql).await;

    if let Err(e) = conn.close().await {
        warn!("Error closing the database connection: {e}");
    }

    let response = outcome.unwrap_or_else(|e| {
        error!("Error executing the query: {e}");
        Response::error(STATUS_INTERNAL_ERROR, e.to_string())
    });

    let output = if cli.pretty {
        response.to_json_pretty()
    } else {
        response.to_json()
    };
    println!("{output}");

    Ok(!response.is_error())
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    // Start with CLI connection config if provided
    let mut connection = cli.to_connection_config()?;

    // If no CLI connection, try named connection from config
    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(EnvelopeError::config(format!(
                    "Connection '{}' not found in config file",
                    name
                )));
            }
        }
    }

    // If still no connection, try default from config
    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    // With nothing configured at all, the environment alone may describe a connection
    if connection.is_none() && std::env::var_os("PGDATABASE").is_some() {
        connection = Some(ConnectionConfig {
            port: db::DatabaseBackend::Postgres.default_port(),
            ..Default::default()
        });
    }

    // Apply environment variable defaults
    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
    }

    Ok(connection)
}
