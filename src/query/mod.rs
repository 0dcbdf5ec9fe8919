//! Query execution for db-envelope.
//!
//! Ties classification, row decoding, and envelope building together.

pub mod decoder;
pub mod executor;

pub use decoder::{coerce_value, decode_rows};
pub use executor::QueryExecutor;
