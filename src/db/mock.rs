//! Mock connection provider for testing.
//!
//! Serves scripted result sets from memory and records what it was asked to
//! run, so executor behavior can be checked without a database.

use super::{Connection, Cursor, RawValue};
use crate::error::{EnvelopeError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A scripted result set returned for one query.
#[derive(Debug, Clone, Default)]
pub struct MockTable {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
    /// Iteration stops after this many rows with the given error.
    fail_after: Option<(usize, String)>,
    /// Scanning the row at this index fails.
    scan_error_at: Option<usize>,
}

impl MockTable {
    /// Creates an empty table with the given columns.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Appends a row of raw values.
    pub fn with_row(mut self, row: Vec<RawValue>) -> Self {
        self.rows.push(row);
        self
    }

    /// Makes the cursor stop with `message` once `rows` rows have been read.
    pub fn fail_after(mut self, rows: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((rows, message.into()));
        self
    }

    /// Makes scanning the row at `index` fail.
    pub fn fail_scan_at(mut self, index: usize) -> Self {
        self.scan_error_at = Some(index);
        self
    }
}

/// A mock connection that returns predefined results.
#[derive(Debug, Default)]
pub struct MockConnection {
    queries: HashMap<String, MockTable>,
    statement_error: Option<String>,
    executed: Arc<Mutex<Vec<String>>>,
    cursor_closes: Arc<AtomicUsize>,
    closed: bool,
}

impl MockConnection {
    /// Creates a mock connection with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the result set returned for `sql`.
    pub fn with_query(mut self, sql: impl Into<String>, table: MockTable) -> Self {
        self.queries.insert(sql.into().trim().to_string(), table);
        self
    }

    /// Makes every non-cursor statement fail with `message`.
    pub fn fail_statements(mut self, message: impl Into<String>) -> Self {
        self.statement_error = Some(message.into());
        self
    }

    /// Statements received so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Shared counter of cursor closes across all cursors this connection opened.
    pub fn cursor_closes(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.cursor_closes)
    }

    fn record(&self, sql: &str) -> Result<()> {
        if self.closed {
            return Err(EnvelopeError::connection("connection is closed"));
        }
        self.executed
            .lock()
            .map_err(|_| EnvelopeError::internal("statement log poisoned"))?
            .push(sql.to_string());
        Ok(())
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute_statement(&mut self, sql: &str) -> Result<()> {
        self.record(sql)?;
        match &self.statement_error {
            Some(message) => Err(EnvelopeError::query(message.clone())),
            None => Ok(()),
        }
    }

    async fn execute_query<'a>(&'a mut self, sql: &'a str) -> Result<Box<dyn Cursor + 'a>> {
        self.record(sql)?;
        let table = self.queries.get(sql.trim()).cloned().ok_or_else(|| {
            EnvelopeError::query(format!("no result scripted for: {}", sql.trim()))
        })?;

        Ok(Box::new(MockCursor {
            table,
            position: None,
            error: None,
            closes: Arc::clone(&self.cursor_closes),
        }))
    }

    async fn ping(&mut self) -> Result<()> {
        if self.closed {
            return Err(EnvelopeError::connection("connection is closed"));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Cursor over a [`MockTable`].
struct MockCursor {
    table: MockTable,
    position: Option<usize>,
    error: Option<EnvelopeError>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl Cursor for MockCursor {
    fn columns(&self) -> Result<Vec<String>> {
        Ok(self.table.columns.clone())
    }

    async fn advance(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);

        if let Some((limit, message)) = &self.table.fail_after {
            if next >= *limit {
                self.error = Some(EnvelopeError::query(message.clone()));
                return false;
            }
        }

        self.position = Some(next);
        next < self.table.rows.len()
    }

    fn scan(&self) -> Result<Vec<RawValue>> {
        let index = self
            .position
            .filter(|p| *p < self.table.rows.len())
            .ok_or_else(|| EnvelopeError::decode("scan called without a current row"))?;

        if self.table.scan_error_at == Some(index) {
            return Err(EnvelopeError::decode(format!(
                "failed to scan row {index}"
            )));
        }

        Ok(self.table.rows[index].clone())
    }

    fn take_error(&mut self) -> Option<EnvelopeError> {
        self.error.take()
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
