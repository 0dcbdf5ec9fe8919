//! PostgreSQL connection provider.
//!
//! Provides `PostgresConnection`, which implements the `Connection` trait on
//! top of a single sqlx `PgConnection`. Statements go over the simple-query
//! protocol, so the server answers with text-format cells that surface as
//! [`RawValue::Bytes`]. When a query string holds several statements, only
//! the rows of the first result set are returned.

use crate::config::ConnectionConfig;
use crate::db::{Connection, Cursor, RawValue};
use crate::error::{EnvelopeError, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Stream, TryStreamExt};
use sqlx::postgres::{PgConnection, PgQueryResult, PgRow, PgValueFormat};
use sqlx::{
    Column as SqlxColumn, Connection as SqlxConnection, Either, Executor, Row as SqlxRow,
    TypeInfo, ValueRef,
};
use tracing::debug;

/// PostgreSQL connection.
#[derive(Debug)]
pub struct PostgresConnection {
    conn: Option<PgConnection>,
}

impl PostgresConnection {
    /// Opens a connection and verifies it with a ping.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        debug!("Connecting to {}", config.display_string());

        let mut conn = PgConnection::connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        conn.ping()
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to database");
        Ok(Self { conn: Some(conn) })
    }

    fn live(&mut self) -> Result<&mut PgConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| EnvelopeError::connection("connection is closed"))
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn execute_statement(&mut self, sql: &str) -> Result<()> {
        let conn = self.live()?;
        let result = Executor::execute(&mut *conn, sqlx::raw_sql(sql))
            .await
            .map_err(|e| EnvelopeError::query(format_query_error(e)))?;

        debug!("Statement affected {} rows", result.rows_affected());
        Ok(())
    }

    async fn execute_query<'a>(&'a mut self, sql: &'a str) -> Result<Box<dyn Cursor + 'a>> {
        let conn = self.live()?;
        let mut rows = FirstResultSet::new(sqlx::raw_sql(sql).fetch_many(conn));

        // Awaiting the first row surfaces statements the server rejects.
        let first = rows
            .next_row()
            .await
            .map_err(|e| EnvelopeError::query(format_query_error(e)))?;

        let columns = first.as_ref().map(column_names).unwrap_or_default();

        Ok(Box::new(PgCursor {
            columns,
            rows,
            pending: first,
            current: None,
            error: None,
        }))
    }

    async fn ping(&mut self) -> Result<()> {
        self.live()?
            .ping()
            .await
            .map_err(|e| EnvelopeError::connection(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await.map_err(|e| {
                EnvelopeError::connection(format!("Failed to close connection: {e}"))
            })?;
        }
        Ok(())
    }
}

type PgResultStream<'a> =
    BoxStream<'a, std::result::Result<Either<PgQueryResult, PgRow>, sqlx::Error>>;

/// Yields the rows of the first result set of a multi-statement stream.
///
/// The stream is dropped as soon as its first command completes or fails.
struct FirstResultSet<S> {
    stream: Option<S>,
}

impl<S, Q, R, E> FirstResultSet<S>
where
    S: Stream<Item = std::result::Result<Either<Q, R>, E>> + Unpin,
{
    fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    async fn next_row(&mut self) -> std::result::Result<Option<R>, E> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };

        match stream.try_next().await {
            Ok(Some(Either::Right(row))) => Ok(Some(row)),
            Ok(Some(Either::Left(_))) | Ok(None) => {
                self.stream = None;
                Ok(None)
            }
            Err(e) => {
                self.stream = None;
                Err(e)
            }
        }
    }

    fn release(&mut self) {
        self.stream = None;
    }
}

/// Cursor streaming rows off a borrowed `PgConnection`.
struct PgCursor<'a> {
    columns: Vec<String>,
    rows: FirstResultSet<PgResultStream<'a>>,
    /// First row, fetched while opening the cursor.
    pending: Option<PgRow>,
    current: Option<PgRow>,
    error: Option<EnvelopeError>,
}

#[async_trait]
impl<'a> Cursor for PgCursor<'a> {
    fn columns(&self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    async fn advance(&mut self) -> bool {
        self.current = self.pending.take();
        if self.current.is_some() {
            return true;
        }

        match self.rows.next_row().await {
            Ok(Some(row)) => {
                self.current = Some(row);
                true
            }
            Ok(None) => false,
            Err(e) => {
                self.error = Some(EnvelopeError::query(format_query_error(e)));
                false
            }
        }
    }

    fn scan(&self) -> Result<Vec<RawValue>> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| EnvelopeError::decode("scan called without a current row"))?;

        (0..row.len()).map(|index| raw_value(row, index)).collect()
    }

    fn take_error(&mut self) -> Option<EnvelopeError> {
        self.error.take()
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the stream releases the connection; sqlx discards any
        // unread messages before the next statement.
        self.rows.release();
        self.pending = None;
        self.current = None;
        Ok(())
    }
}

fn column_names(row: &PgRow) -> Vec<String> {
    row.columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect()
}

/// Reads one cell of a row without interpreting text-format data.
fn raw_value(row: &PgRow, index: usize) -> Result<RawValue> {
    let value = row
        .try_get_raw(index)
        .map_err(|e| EnvelopeError::decode(format!("Failed to read column {index}: {e}")))?;

    if value.is_null() {
        return Ok(RawValue::Null);
    }

    match value.format() {
        PgValueFormat::Text => value
            .as_bytes()
            .map(|bytes| RawValue::Bytes(bytes.to_vec()))
            .map_err(|e| EnvelopeError::decode(format!("Failed to read column {index}: {e}"))),
        // Simple-query results are always text; a binary cell has no
        // byte-level meaning the decoder can sniff.
        PgValueFormat::Binary => Ok(RawValue::Other(value.type_info().name().to_lowercase())),
    }
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> EnvelopeError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        EnvelopeError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        EnvelopeError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        EnvelopeError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        EnvelopeError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        EnvelopeError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        EnvelopeError::connection(error.to_string())
    }
}

/// Formats a query error, appending PostgreSQL detail fields when present.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        let fields = [
            ("DETAIL", pg_error.detail()),
            ("HINT", pg_error.hint()),
            ("TABLE", pg_error.table()),
            ("COLUMN", pg_error.column()),
            ("CONSTRAINT", pg_error.constraint()),
        ];

        for (label, value) in fields {
            if let Some(value) = value {
                result.push_str("\n  ");
                result.push_str(label);
                result.push_str(": ");
                result.push_str(value);
            }
        }
    }

    result
}
