//! Database abstraction layer for db-envelope.
//!
//! Provides a trait-based interface for connection providers, allowing
//! different database backends to be used interchangeably by the executor.

mod mock;
mod postgres;
mod types;

pub use mock::{MockConnection, MockTable};
pub use postgres::PostgresConnection;
pub use types::{RawValue, ResultSet, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::{EnvelopeError, Result};
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
}

impl DatabaseBackend {
    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }

    /// Returns the default port for this backend.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
        }
    }

    /// Returns the URL scheme for this backend.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
        }
    }
}

/// Opens a connection for the given configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let conn = PostgresConnection::connect(config).await?;
            Ok(Box::new(conn))
        }
    }
}

/// A single open connection that statements are sent to.
///
/// Methods take `&mut self`: one caller owns the connection for the duration
/// of a statement, and a cursor borrows it until dropped.
#[async_trait]
pub trait Connection: Send {
    /// Executes a statement that produces no result cursor.
    async fn execute_statement(&mut self, sql: &str) -> Result<()>;

    /// Executes a statement and returns a forward-only cursor over its rows.
    ///
    /// The caller must call [`Cursor::close`] before dropping the cursor.
    async fn execute_query<'a>(&'a mut self, sql: &'a str) -> Result<Box<dyn Cursor + 'a>>;

    /// Checks that the connection is still alive.
    async fn ping(&mut self) -> Result<()>;

    /// Closes the connection. Further statements fail.
    async fn close(&mut self) -> Result<()>;
}

/// A forward-only, single-pass handle over a result set.
#[async_trait]
pub trait Cursor: Send {
    /// Column names of the result, in order.
    fn columns(&self) -> Result<Vec<String>>;

    /// Moves to the next row. Returns false when the rows are exhausted or an
    /// error stopped iteration; check [`Cursor::take_error`] afterwards.
    async fn advance(&mut self) -> bool;

    /// Reads the current row, one raw value per column.
    fn scan(&self) -> Result<Vec<RawValue>>;

    /// Returns the error that ended iteration, if any.
    fn take_error(&mut self) -> Option<EnvelopeError>;

    /// Releases the cursor.
    async fn close(&mut self) -> Result<()>;
}
