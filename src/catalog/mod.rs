//! Unity Catalog metadata access.
//!
//! The explorer only reads three listings: catalogs, the schemas of a
//! catalog, and the tables of a schema. Records keep every field the API
//! returns so results can expose the full object.

mod mock;

pub use mock::{FailingCatalogClient, MockCatalogClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// One catalog, schema, or table record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogObject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Every other field of the remote record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogObject {
    /// Creates a record with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            extra: Map::new(),
        }
    }

    /// Sets the descriptive comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Adds an extra field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns the comment, or an empty string when absent.
    pub fn comment_text(&self) -> &str {
        self.comment.as_deref().unwrap_or_default()
    }

    /// Returns the full record as JSON.
    pub fn to_metadata(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Response body of the catalog listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogList {
    #[serde(default)]
    pub catalogs: Vec<CatalogObject>,
}

/// Response body of the schema listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaList {
    #[serde(default)]
    pub schemas: Vec<CatalogObject>,
}

/// Response body of the table listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableList {
    #[serde(default)]
    pub tables: Vec<CatalogObject>,
}

/// Read-only metadata listings.
///
/// Implementations must be thread-safe (Send + Sync); both tools may run
/// concurrently against one shared client.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Lists every catalog visible to the credential.
    async fn list_catalogs(&self) -> Result<Vec<CatalogObject>>;

    /// Lists the schemas of a catalog.
    async fn list_schemas(&self, catalog: &str) -> Result<Vec<CatalogObject>>;

    /// Lists the tables of a schema.
    async fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<CatalogObject>>;
}
