//! Search tool integration tests.
//!
//! Covers SQL detection through to executable ids, and metadata search output.

use databricks_explorer::resource::ResourceId;
use databricks_explorer::statement::ScriptedStatementClient;

use super::sample_explorer;

#[tokio::test]
async fn test_sql_search_id_round_trips() {
    let (explorer, statements, _) = sample_explorer(ScriptedStatementClient::new());

    let inputs = [
        ("SELECT 1", "SELECT 1"),
        ("  with t as (select 1) select * from t", "with t as (select 1) select * from t"),
        ("INSERT INTO main.sales.orders VALUES (1)", "INSERT INTO main.sales.orders VALUES (1)"),
        ("Update t SET a = b::int", "Update t SET a = b::int"),
        ("delete from t where x = 'a::b'", "delete from t where x = 'a::b'"),
        ("MERGE INTO t USING s ON t.id = s.id", "MERGE INTO t USING s ON t.id = s.id"),
        ("sql: DESCRIBE main.sales.orders", "DESCRIBE main.sales.orders"),
    ];

    for (input, normalized) in inputs {
        let response = explorer.search(input).await;
        assert_eq!(response.results.len(), 1, "{input}");

        let hit = response.hits().next().unwrap();
        assert_eq!(hit.id, format!("query::{normalized}"));
        assert_eq!(
            ResourceId::decode(&hit.id).unwrap(),
            ResourceId::query(normalized)
        );
    }

    assert!(statements.submitted().is_empty());
}

#[tokio::test]
async fn test_metadata_search_never_runs_statements() {
    let (explorer, statements, _) = sample_explorer(ScriptedStatementClient::new());

    for input in ["main", "sales", "nyctaxi", "nothing-here", "DESCRIBE"] {
        let response = explorer.search(input).await;
        assert!(response.error().is_none(), "{input}");
    }

    assert!(statements.submitted().is_empty());
    assert_eq!(statements.poll_count(), 0);
}

#[tokio::test]
async fn test_search_hits_are_fetchable() {
    let (explorer, _, _) = sample_explorer(ScriptedStatementClient::new());

    let response = explorer.search("sales").await;
    assert!(response.hits().count() >= 3);

    for hit in response.hits() {
        let fetched = explorer.fetch(&hit.id).await;
        let found = fetched.as_found().unwrap_or_else(|| panic!("{} not fetchable", hit.id));
        assert_eq!(found.title, hit.title);
        assert_eq!(found.metadata, hit.metadata);
    }
}
