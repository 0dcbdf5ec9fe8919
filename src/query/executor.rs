//! Statement execution.
//!
//! Classifies a statement, runs it on a connection, and wraps the outcome in
//! a [`Response`].

use std::time::Instant;

use tracing::{debug, warn};

use super::decoder::decode_rows;
use crate::classify::{classify_sql, CommandKind};
use crate::db::{Connection, ResultSet};
use crate::error::Result;
use crate::response::Response;

/// Runs statements on a borrowed connection.
pub struct QueryExecutor<'a> {
    conn: &'a mut dyn Connection,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new executor over `conn`.
    pub fn new(conn: &'a mut dyn Connection) -> Self {
        Self { conn }
    }

    /// Classifies and executes one statement.
    ///
    /// Unsupported statements never reach the connection. Connection and
    /// decode failures are returned as `Err`; the caller decides how to
    /// present them.
    pub async fn execute(&mut self, sql: &str) -> Result<Response> {
        let kind = classify_sql(sql);
        debug!("Executing {} statement", kind);

        let start = Instant::now();
        let response = match kind {
            CommandKind::Unsupported => {
                warn!("Rejecting unsupported statement: {}", sql.trim());
                return Ok(Response::unsupported());
            }
            CommandKind::Mutating => {
                self.conn.execute_statement(sql).await?;
                Response::executed()
            }
            CommandKind::Reading => {
                let rows = self.fetch_rows(sql).await?;
                if rows.is_empty() {
                    Response::no_data()
                } else {
                    Response::data(rows)
                }
            }
        };

        debug!(
            "Statement finished in {:?} with status {}",
            start.elapsed(),
            response.status_code()
        );
        Ok(response)
    }

    /// Opens a cursor, decodes it, and closes it whatever the decode outcome.
    async fn fetch_rows(&mut self, sql: &str) -> Result<ResultSet> {
        let mut cursor = self.conn.execute_query(sql).await?;
        let decoded = decode_rows(cursor.as_mut()).await;

        if let Err(e) = cursor.close().await {
            warn!("Error closing the rows: {e}");
        }

        decoded
    }
}
