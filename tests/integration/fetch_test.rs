//! Fetch tool integration tests.

use std::time::Duration;

use databricks_explorer::statement::{ScriptedStatementClient, StatementState, StatementStatus};
use databricks_explorer::tools::FetchResponse;
use serde_json::json;

use super::sample_explorer;

#[tokio::test]
async fn test_fetch_sql_from_search_stub() {
    let (explorer, statements, sleeper) = sample_explorer(
        ScriptedStatementClient::new()
            .then_status(StatementStatus::pending())
            .then_status(StatementStatus::with_state(StatementState::Running))
            .then_status(StatementStatus::succeeded(2, json!([["a"], ["b"]]))),
    );

    let stub = explorer.search("sql: SELECT name FROM main.sales.customers").await;
    let id = stub.hits().next().unwrap().id.clone();

    let response = explorer.fetch(&id).await;

    let found = response.as_found().unwrap();
    assert_eq!(found.text, "Returned 2 row(s)");
    assert_eq!(found.metadata["result"]["data_array"], json!([["a"], ["b"]]));

    let submitted = statements.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].statement, "SELECT name FROM main.sales.customers");
    assert_eq!(submitted[0].warehouse_id, "wh-integration");
    assert_eq!(submitted[0].wait_timeout, "15s");
    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(1); 2]);
}

#[tokio::test]
async fn test_fetch_sql_keeps_embedded_separators() {
    let (explorer, statements, _) = sample_explorer(
        ScriptedStatementClient::new().then_status(StatementStatus::succeeded(1, json!([["1"]]))),
    );

    explorer.fetch("query::SELECT '1'::int AS one FROM a.b.c").await;

    assert_eq!(
        statements.submitted()[0].statement,
        "SELECT '1'::int AS one FROM a.b.c"
    );
}

#[tokio::test]
async fn test_fetch_sql_failure() {
    let (explorer, _, _) = sample_explorer(
        ScriptedStatementClient::new().then_status(StatementStatus::failed("syntax error")),
    );

    assert_eq!(
        explorer.fetch("query::BAD").await,
        FetchResponse::error("SQL execution failed: syntax error")
    );
}

#[tokio::test]
async fn test_fetch_sql_timeout_uses_full_budget() {
    let (explorer, statements, sleeper) = sample_explorer(ScriptedStatementClient::new());

    let response = explorer.fetch("query::SELECT * FROM huge").await;

    assert_eq!(
        response.as_error(),
        Some("SQL execution failed: SQL timed out after wait_timeout")
    );
    assert_eq!(statements.poll_count(), 15);
    assert_eq!(sleeper.sleep_count(), 14);
}

#[tokio::test]
async fn test_fetch_metadata_errors() {
    let (explorer, _, _) = sample_explorer(ScriptedStatementClient::new());

    assert_eq!(
        explorer.fetch("table::c.s.unknown_table").await,
        FetchResponse::error("Resource 'table::c.s.unknown_table' not found")
    );
    assert_eq!(
        explorer.fetch("catalog::missing").await,
        FetchResponse::error("Resource 'catalog::missing' not found")
    );
    assert_eq!(
        explorer.fetch("garbage").await,
        FetchResponse::error("Bad ID format")
    );
}

#[tokio::test]
async fn test_fetch_response_shape() {
    let (explorer, _, _) = sample_explorer(ScriptedStatementClient::new());

    let response = explorer.fetch("schema::samples.nyctaxi").await;

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "id": "schema::samples.nyctaxi",
            "title": "Schema: samples.nyctaxi",
            "text": "",
            "metadata": {"name": "nyctaxi"}
        })
    );
}
