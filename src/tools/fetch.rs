//! The `fetch` tool.

use tracing::{debug, warn};

use super::{Explorer, FetchResponse, SearchResult};
use crate::catalog::CatalogObject;
use crate::error::{ExplorerError, Result};
use crate::resource::{query_payload, ResourceId};

impl Explorer {
    /// Executes a `query::` id or looks up the catalog object an id names.
    ///
    /// Never fails: engine errors become `SQL execution failed: <message>`,
    /// everything else becomes the error's display string.
    pub async fn fetch(&self, id: &str) -> FetchResponse {
        if let Some(sql) = query_payload(id) {
            return self.fetch_query(id, sql).await;
        }

        match self.lookup(id).await {
            Ok(result) => FetchResponse::Found(result),
            Err(e) => {
                warn!("Fetch of '{}' failed: {}", id, e);
                FetchResponse::error(e.to_string())
            }
        }
    }

    async fn fetch_query(&self, id: &str, sql: &str) -> FetchResponse {
        match self.engine.execute(sql).await {
            Ok(execution) => {
                let metadata = execution
                    .result()
                    .map(|status| status.to_json())
                    .unwrap_or_default();
                FetchResponse::Found(SearchResult {
                    id: id.to_string(),
                    title: "SQL query result".to_string(),
                    text: format!("Returned {} row(s)", execution.row_count()),
                    metadata,
                })
            }
            Err(e) => {
                warn!("SQL execution for '{}' failed: {}", id, e);
                FetchResponse::error(format!("SQL execution failed: {e}"))
            }
        }
    }

    async fn lookup(&self, id: &str) -> Result<SearchResult> {
        let resource = ResourceId::decode(id)?;
        debug!("Looking up {} '{}'", resource.kind(), resource.qualified_name());

        let found = match &resource {
            ResourceId::Catalog(name) => find(self.catalog.list_catalogs().await?, name),
            ResourceId::Schema { catalog, schema } => {
                find(self.catalog.list_schemas(catalog).await?, schema)
            }
            ResourceId::Table {
                catalog,
                schema,
                table,
            } => find(self.catalog.list_tables(catalog, schema).await?, table),
            ResourceId::Query(_) => {
                return Err(ExplorerError::internal("query ids are executed, not looked up"))
            }
        };

        found
            .map(|object| SearchResult::for_object(&resource, &object))
            .ok_or_else(|| ExplorerError::not_found(id))
    }
}

fn find(objects: Vec<CatalogObject>, name: &str) -> Option<CatalogObject> {
    objects.into_iter().find(|o| o.name == name)
}
