//! End-to-end MCP session over the stdio line protocol.

use databricks_explorer::server::stdio::serve_lines;
use databricks_explorer::server::{JsonRpcResponse, McpServer};
use databricks_explorer::statement::{ScriptedStatementClient, StatementStatus};
use serde_json::{json, Value};

use super::sample_explorer;

fn line(message: Value) -> String {
    format!("{message}\n")
}

#[tokio::test]
async fn test_full_session() {
    let (explorer, _, _) = sample_explorer(
        ScriptedStatementClient::new().then_status(StatementStatus::succeeded(3, json!([[1], [2], [3]]))),
    );
    let server = McpServer::new(explorer);

    let input = [
        line(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
                    "params": {"protocolVersion": "2024-11-05", "capabilities": {}}})),
        line(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
        line(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})),
        line(json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                    "params": {"name": "search", "arguments": {"query": "SELECT 1"}}})),
        line(json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                    "params": {"name": "fetch", "arguments": {"id": "query::SELECT 1"}}})),
    ]
    .concat();
    let mut output = Vec::new();

    serve_lines(&server, input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<JsonRpcResponse> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 4);
    assert!(responses.iter().all(|r| r.error.is_none()));

    let instructions = responses[0].result.as_ref().unwrap()["instructions"]
        .as_str()
        .unwrap();
    for prefix in ["catalog::", "schema::", "table::", "query::"] {
        assert!(instructions.contains(prefix));
    }

    let search = &responses[2].result.as_ref().unwrap()["structuredContent"];
    assert_eq!(search["results"][0]["id"], json!("query::SELECT 1"));

    let fetch = &responses[3].result.as_ref().unwrap()["structuredContent"];
    assert_eq!(fetch["text"], json!("Returned 3 row(s)"));
}
