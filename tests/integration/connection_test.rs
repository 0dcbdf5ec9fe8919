//! Connection integration tests.
//!
//! Tests database connectivity and error handling.

use db_envelope::config::ConnectionConfig;
use db_envelope::db::{self, Connection, PostgresConnection};
use db_envelope::error::EnvelopeError;
use db_envelope::query::QueryExecutor;

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

#[tokio::test]
async fn test_connect_through_factory() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let config = ConnectionConfig::from_connection_string(&url).unwrap();
    let mut conn = db::connect(&config).await.unwrap();

    conn.ping().await.unwrap();
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_closed_connection_rejects_statements() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let config = ConnectionConfig::from_connection_string(&url).unwrap();
    let mut conn = PostgresConnection::connect(&config).await.unwrap();
    conn.close().await.unwrap();

    // Closing twice is harmless.
    conn.close().await.unwrap();

    let result = QueryExecutor::new(&mut conn).execute("SELECT 1").await;
    assert!(matches!(result, Err(EnvelopeError::Connection(_))));
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_with_invalid_host() {
    let config = ConnectionConfig {
        host: Some("invalid.host.that.does.not.exist.local".to_string()),
        port: 5432,
        database: Some("testdb".to_string()),
        user: Some("testuser".to_string()),
        password: Some("testpass".to_string()),
        ..Default::default()
    };

    let result = PostgresConnection::connect(&config).await;
    assert!(matches!(result, Err(EnvelopeError::Connection(_))));
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_with_invalid_port() {
    let config = ConnectionConfig {
        host: Some("localhost".to_string()),
        port: 59999,
        database: Some("testdb".to_string()),
        user: Some("testuser".to_string()),
        password: Some("testpass".to_string()),
        sslmode: Some("disable".to_string()),
        ..Default::default()
    };

    let result = PostgresConnection::connect(&config).await;
    assert!(matches!(result, Err(EnvelopeError::Connection(_))));
}

#[tokio::test]
async fn test_connect_without_database_name() {
    let config = ConnectionConfig {
        host: Some("localhost".to_string()),
        port: 5432,
        ..Default::default()
    };

    let result = db::connect(&config).await;
    assert!(matches!(result, Err(EnvelopeError::Config(_))));
}
