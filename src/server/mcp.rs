//! MCP JSON-RPC dispatch.
//!
//! Transport-independent: each transport hands raw JSON-RPC messages to
//! [`McpServer::handle_message`] and writes back whatever response it returns.
//! Notifications never produce a response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::tools::{tool_definitions, Explorer, INSTRUCTIONS};

/// Protocol revision answered when the client does not request one.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported on initialization.
pub const SERVER_NAME: &str = "Databricks Explorer MCP";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// An incoming JSON-RPC message.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Absent for notifications. An explicit `null` is kept as `Some(Null)`.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// An outgoing JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct FetchArgs {
    #[serde(alias = "rid")]
    id: String,
}

/// Serves the explorer's tools over MCP.
#[derive(Clone)]
pub struct McpServer {
    explorer: Explorer,
}

impl McpServer {
    pub fn new(explorer: Explorer) -> Self {
        Self { explorer }
    }

    /// Handles one raw message. Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable JSON-RPC message: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!("Invalid JSON-RPC request: {}", e);
                Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: {e}")),
                ))
            }
        }
    }

    /// Handles one decoded request. Returns `None` for notifications.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("JSON-RPC {}", request.method);
        let outcome = self.dispatch(&request.method, request.params).await;

        let id = request.id?;
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => Ok(initialize_result(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => self.call_tool(params).await,
            m if m.starts_with("notifications/") => Ok(Value::Null),
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        }
    }

    async fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let call: CallParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid tool call: {e}")))?;

        let output = match call.name.as_str() {
            "search" => {
                let args: SearchArgs = parse_arguments(call.arguments)?;
                to_value(&self.explorer.search(&args.query).await)?
            }
            "fetch" => {
                let args: FetchArgs = parse_arguments(call.arguments)?;
                to_value(&self.explorer.fetch(&args.id).await)?
            }
            other => {
                return Err(JsonRpcError::new(
                    INVALID_PARAMS,
                    format!("Unknown tool: {other}"),
                ))
            }
        };

        Ok(json!({
            "content": [{ "type": "text", "text": output.to_string() }],
            "structuredContent": output,
            "isError": false
        }))
    }
}

fn initialize_result(params: &Value) -> Value {
    let version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION);

    json!({
        "protocolVersion": version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
        "instructions": INSTRUCTIONS
    })
}

fn parse_arguments<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(arguments)
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid arguments: {e}")))
}

fn to_value<T: Serialize>(output: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(output)
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Unserializable result: {e}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog::MockCatalogClient;
    use crate::statement::{RecordingSleeper, ScriptedStatementClient, StatementEngine, StatementStatus};

    fn server() -> McpServer {
        let statements = ScriptedStatementClient::new()
            .then_status(StatementStatus::succeeded(1, json!([["1"]])));
        let engine = StatementEngine::new(Arc::new(statements), "wh")
            .with_sleeper(Arc::new(RecordingSleeper::new()));
        McpServer::new(Explorer::new(Arc::new(MockCatalogClient::sample()), engine))
    }

    async fn call(server: &McpServer, message: Value) -> JsonRpcResponse {
        server
            .handle_message(&message.to_string())
            .await
            .expect("request should produce a response")
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2025-03-26"}}),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], json!("2025-03-26"));
        assert_eq!(result["serverInfo"]["name"], json!(SERVER_NAME));
        assert!(result["instructions"].as_str().unwrap().contains("query::<SQL statement>"));
    }

    #[tokio::test]
    async fn test_initialize_default_version() {
        let response = call(&server(), json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})).await;
        assert_eq!(response.result.unwrap()["protocolVersion"], json!(PROTOCOL_VERSION));
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = call(&server(), json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"})).await;
        let tools = response.result.unwrap()["tools"].clone();
        assert_eq!(tools[0]["name"], json!("search"));
        assert_eq!(tools[1]["inputSchema"]["required"], json!(["id"]));
    }

    #[tokio::test]
    async fn test_call_search() {
        let response = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                   "params": {"name": "search", "arguments": {"query": "orders"}}}),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(
            result["structuredContent"]["results"][0]["id"],
            json!("table::main.sales.orders")
        );
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("table::main.sales.orders"));
    }

    #[tokio::test]
    async fn test_call_fetch_accepts_rid_alias() {
        let response = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "fetch", "arguments": {"rid": "query::SELECT 1"}}}),
        )
        .await;

        let content = &response.result.unwrap()["structuredContent"];
        assert_eq!(content["text"], json!("Returned 1 row(s)"));
    }

    #[tokio::test]
    async fn test_call_fetch_error_is_result_not_rpc_error() {
        let response = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                   "params": {"name": "fetch", "arguments": {"id": "garbage"}}}),
        )
        .await;

        assert!(response.error.is_none());
        assert_eq!(
            response.result.unwrap()["structuredContent"],
            json!({"error": "Bad ID format"})
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let response = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call",
                   "params": {"name": "drop_everything", "arguments": {}}}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_missing_argument() {
        let response = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call",
                   "params": {"name": "search", "arguments": {}}}),
        )
        .await;
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = call(&server(), json!({"jsonrpc": "2.0", "id": 7, "method": "resources/list"})).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert_eq!(response.id, json!(7));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = server().handle_message("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);
        assert_eq!(response.id, Value::Null);
    }

    #[tokio::test]
    async fn test_invalid_request_shape() {
        let response = call(&server(), json!({"jsonrpc": "2.0", "id": 8})).await;
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
        assert_eq!(response.id, json!(8));
    }

    #[tokio::test]
    async fn test_invalid_request_without_id_is_answered() {
        for raw in [r#"{"jsonrpc":"2.0"}"#, "[]", "42", r#""ping""#] {
            let response = server()
                .handle_message(raw)
                .await
                .unwrap_or_else(|| panic!("no response for {raw}"));
            assert_eq!(response.error.unwrap().code, INVALID_REQUEST, "message {raw}");
            assert_eq!(response.id, Value::Null);
        }
    }

    #[tokio::test]
    async fn test_null_id_is_a_request() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
            .await
            .expect("null id still gets a reply");
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.result, Some(json!({})));
    }

    #[test]
    fn test_request_id_presence() {
        let absent: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        let null: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();

        assert_eq!(absent.id, None);
        assert_eq!(null.id, Some(Value::Null));
    }
}
