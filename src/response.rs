//! Response envelope.
//!
//! Every execution outcome is wrapped in a [`Response`] and serialized as
//!
//! ```json
//! {"status_code": 200, "message": "...", "data": [...], "error_message": "..."}
//! ```
//!
//! where only `status_code` is always present. `Response` is a sum type, so an
//! envelope cannot carry both rows and an error.

use serde::{Serialize, Serializer};
use tracing::error;

use crate::db::{ResultSet, Row};

/// Status code for a successful statement.
pub const STATUS_OK: u16 = 200;

/// Status code for a read that returned no rows.
pub const STATUS_NO_CONTENT: u16 = 204;

/// Status code for a statement the executor does not run.
pub const STATUS_BAD_REQUEST: u16 = 400;

/// Status code callers use when wrapping an execution failure.
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Message for a mutating statement that ran.
pub const MSG_EXECUTED: &str = "Query executed successfully.";

/// Message for a read with an empty result.
pub const MSG_NO_DATA: &str = "No data found.";

/// Message for an unrecognized leading keyword.
pub const MSG_UNSUPPORTED: &str = "Unsupported SQL command.";

/// The outcome of one execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Rows returned by a read.
    Data { status_code: u16, rows: ResultSet },
    /// An outcome described by a message only.
    Message { status_code: u16, message: String },
    /// A failure.
    Error { status_code: u16, error: String },
}

impl Response {
    /// A successful read with rows.
    pub fn data(rows: ResultSet) -> Self {
        Self::Data {
            status_code: STATUS_OK,
            rows,
        }
    }

    /// A message-only envelope.
    pub fn message(status_code: u16, message: impl Into<String>) -> Self {
        Self::Message {
            status_code,
            message: message.into(),
        }
    }

    /// An error envelope.
    pub fn error(status_code: u16, error: impl Into<String>) -> Self {
        Self::Error {
            status_code,
            error: error.into(),
        }
    }

    /// A mutating statement ran.
    pub fn executed() -> Self {
        Self::message(STATUS_OK, MSG_EXECUTED)
    }

    /// A read returned no rows.
    pub fn no_data() -> Self {
        Self::message(STATUS_NO_CONTENT, MSG_NO_DATA)
    }

    /// The statement was not recognized.
    pub fn unsupported() -> Self {
        Self::message(STATUS_BAD_REQUEST, MSG_UNSUPPORTED)
    }

    /// HTTP-style status code of the envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Data { status_code, .. }
            | Self::Message { status_code, .. }
            | Self::Error { status_code, .. } => *status_code,
        }
    }

    /// The message, for message-only envelopes.
    pub fn message_text(&self) -> Option<&str> {
        match self {
            Self::Message { message, .. } => Some(message),
            _ => None,
        }
    }

    /// The decoded rows, for data envelopes.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Data { rows, .. } => Some(rows),
            _ => None,
        }
    }

    /// The error text, for error envelopes.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Returns true for error envelopes.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Serializes the envelope to compact JSON.
    ///
    /// Returns an empty string if serialization fails; the failure is logged.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            error!("Error marshaling query response: {e}");
            String::new()
        })
    }

    /// Serializes the envelope to indented JSON, with the same failure
    /// handling as [`Response::to_json`].
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            error!("Error marshaling query response: {e}");
            String::new()
        })
    }
}

/// Field layout on the wire.
#[derive(Serialize)]
struct Envelope<'a> {
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a [Row]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
}

impl Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Envelope {
            status_code: self.status_code(),
            message: self.message_text().filter(|m| !m.is_empty()),
            data: self.rows(),
            error_message: self.error_message().filter(|e| !e.is_empty()),
        }
        .serialize(serializer)
    }
}
