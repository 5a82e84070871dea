//! Tool surface exposed to MCP clients.

pub mod http;
mod mcp;
pub mod sse;
pub mod stdio;

pub use mcp::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpServer, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, SERVER_NAME,
};
