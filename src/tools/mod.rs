//! The `search` and `fetch` tools.
//!
//! Both tools always return a well-formed value: failures become an
//! `{"error": "..."}` entry instead of propagating.

mod fetch;
mod search;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::catalog::{CatalogClient, CatalogObject};
use crate::resource::ResourceId;
use crate::statement::StatementEngine;

/// Usage notes sent to clients on initialization.
pub const INSTRUCTIONS: &str = "Use `search` to find Unity Catalog objects *or* to prepare a SQL query.\n\n\
If the search text looks like SQL (or starts with `sql:`) the tool returns \
a stub result whose ID is literally `query::<sql>`.\n\
Call `fetch` with that ID to execute the statement in the fixed warehouse.\n\n\
ID formats:\n  \
• catalog::<catalog>\n  \
• schema::<catalog>.<schema>\n  \
• table::<catalog>.<schema>.<table>\n  \
• query::<SQL statement>\n";

/// One search hit or fetched resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub text: String,
    pub metadata: Value,
}

impl SearchResult {
    /// Builds a result for a catalog object named by `id`.
    pub fn for_object(id: &ResourceId, object: &CatalogObject) -> Self {
        Self {
            id: id.encode(),
            title: format!("{}: {}", id.label(), id.qualified_name()),
            text: object.comment_text().to_string(),
            metadata: object.to_metadata(),
        }
    }
}

/// An error-shaped result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error: String,
}

impl ErrorResult {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// One entry of a search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchEntry {
    Hit(SearchResult),
    Error(ErrorResult),
}

impl SearchEntry {
    pub fn as_hit(&self) -> Option<&SearchResult> {
        match self {
            Self::Hit(result) => Some(result),
            Self::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&str> {
        match self {
            Self::Error(e) => Some(&e.error),
            Self::Hit(_) => None,
        }
    }
}

/// Value returned by `search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchEntry>,
}

impl SearchResponse {
    /// Successful hits, skipping error entries.
    pub fn hits(&self) -> impl Iterator<Item = &SearchResult> {
        self.results.iter().filter_map(SearchEntry::as_hit)
    }

    /// Message of the trailing error entry, if the search degraded.
    pub fn error(&self) -> Option<&str> {
        self.results.iter().find_map(SearchEntry::as_error)
    }
}

/// Value returned by `fetch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FetchResponse {
    Found(SearchResult),
    Error(ErrorResult),
}

impl FetchResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorResult::new(message))
    }

    pub fn as_found(&self) -> Option<&SearchResult> {
        match self {
            Self::Found(result) => Some(result),
            Self::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&str> {
        match self {
            Self::Error(e) => Some(&e.error),
            Self::Found(_) => None,
        }
    }
}

/// Tool description advertised to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Returns the two tool definitions.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "search".to_string(),
            description: "Normal text runs a case-insensitive substring search over catalog, \
                          schema and table names. SQL text (or text prefixed with `sql:`) \
                          returns one stub result with id `query::<sql>`; nothing is executed."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Name fragment to search for, or a SQL statement"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "fetch".to_string(),
            description: "`query::<sql>` runs the SQL on the fixed warehouse and returns the rows. \
                          `catalog::`, `schema::` and `table::` ids return the object's metadata."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "Identifier returned by search"
                    }
                },
                "required": ["id"]
            }),
        },
    ]
}

/// Entry point for both tools.
#[derive(Clone)]
pub struct Explorer {
    catalog: Arc<dyn CatalogClient>,
    engine: StatementEngine,
}

impl Explorer {
    pub fn new(catalog: Arc<dyn CatalogClient>, engine: StatementEngine) -> Self {
        Self { catalog, engine }
    }
}
