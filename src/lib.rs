//! Databricks Explorer - Unity Catalog browsing and SQL execution over MCP.
//!
//! Two tools, `search` and `fetch`, cover everything: search finds catalog
//! objects or wraps SQL in a `query::` id, fetch executes or looks it up.

pub mod catalog;
pub mod config;
pub mod databricks;
pub mod error;
pub mod logging;
pub mod resource;
pub mod server;
pub mod sql;
pub mod statement;
pub mod tools;

use std::sync::Arc;

use config::Config;
use databricks::DatabricksClient;
use error::Result;
use server::McpServer;
use statement::StatementEngine;
use tools::Explorer;

/// Wires the production explorer: one HTTP client shared by the metadata
/// and statement paths.
pub fn build_server(config: Arc<Config>) -> Result<McpServer> {
    let client = Arc::new(DatabricksClient::new(Arc::clone(&config))?);
    let engine = StatementEngine::from_config(client.clone(), &config);
    Ok(McpServer::new(Explorer::new(client, engine)))
}
