//! Statement execution against a live PostgreSQL server.
//!
//! Skipped unless DATABASE_URL is set.

use db_envelope::config::ConnectionConfig;
use db_envelope::db::{Connection, PostgresConnection, Value};
use db_envelope::query::QueryExecutor;
use db_envelope::response::Response;

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Helper to open a test connection.
async fn get_test_connection() -> Option<PostgresConnection> {
    let url = get_test_database_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    PostgresConnection::connect(&config).await.ok()
}

#[tokio::test]
async fn test_select_literals_are_coerced() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let response = QueryExecutor::new(&mut conn)
        .execute("SELECT 1 AS num, 'hello' AS greeting, NULL AS nothing, 2.5 AS ratio")
        .await
        .unwrap();

    assert_eq!(response.status_code(), 200);
    let rows = response.rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].columns(), ["num", "greeting", "nothing", "ratio"]);
    assert_eq!(rows[0].get("num"), Some(&Value::Integer(1)));
    assert_eq!(rows[0].get("greeting"), Some(&Value::from("hello")));
    assert_eq!(rows[0].get("nothing"), Some(&Value::Null));
    assert_eq!(rows[0].get("ratio"), Some(&Value::Float(2.5)));
    assert_eq!(
        response.to_json(),
        r#"{"status_code":200,"data":[{"num":1,"greeting":"hello","nothing":null,"ratio":2.5}]}"#
    );

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_booleans_arrive_as_text() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let response = QueryExecutor::new(&mut conn)
        .execute("SELECT true AS yes, false AS no")
        .await
        .unwrap();

    let rows = response.rows().unwrap();
    assert_eq!(rows[0].get("yes"), Some(&Value::from("t")));
    assert_eq!(rows[0].get("no"), Some(&Value::from("f")));

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_empty_result_is_no_content() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let response = QueryExecutor::new(&mut conn)
        .execute("SELECT 1 AS num WHERE false")
        .await
        .unwrap();

    assert_eq!(response, Response::no_data());

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_mutations_on_temp_table() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let mut executor = QueryExecutor::new(&mut conn);

    let statements = [
        "CREATE TEMP TABLE envelope_items (id INT PRIMARY KEY, label TEXT)",
        "INSERT INTO envelope_items VALUES (1, 'first'), (2, 'second')",
        "UPDATE envelope_items SET label = 'updated' WHERE id = 2",
        "DELETE FROM envelope_items WHERE id = 1",
    ];
    for sql in statements {
        assert_eq!(executor.execute(sql).await.unwrap(), Response::executed());
    }

    let response = executor
        .execute("select id, label from envelope_items")
        .await
        .unwrap();
    let rows = response.rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id"), Some(&Value::Integer(2)));
    assert_eq!(rows[0].get("label"), Some(&Value::from("updated")));

    assert_eq!(
        executor.execute("DROP TABLE envelope_items").await.unwrap(),
        Response::executed()
    );

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_syntax_error_is_returned() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = QueryExecutor::new(&mut conn)
        .execute("SELECT FROM WHERE")
        .await;
    assert!(result.is_err());

    // The connection stays usable after a rejected statement.
    let response = QueryExecutor::new(&mut conn)
        .execute("SELECT 1 AS num")
        .await
        .unwrap();
    assert_eq!(response.status_code(), 200);

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_table_error_includes_server_message() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = QueryExecutor::new(&mut conn)
        .execute("SELECT * FROM envelope_table_that_does_not_exist")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_unsupported_statement_is_not_sent() {
    let Some(mut conn) = get_test_connection().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // Valid SQL, but the leading keyword is not one the executor runs.
    let response = QueryExecutor::new(&mut conn)
        .execute("WITH t AS (SELECT 1) SELECT * FROM t")
        .await
        .unwrap();
    assert_eq!(response, Response::unsupported());

    conn.close().await.unwrap();
}
