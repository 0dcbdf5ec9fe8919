//! db-envelope - run ad-hoc SQL and get a uniform JSON response envelope.
//!
//! This library exposes the core modules for use in integration tests.

pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod response;
