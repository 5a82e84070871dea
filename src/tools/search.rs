//! The `search` tool.

use serde_json::json;
use tracing::{debug, warn};

use super::{ErrorResult, Explorer, SearchEntry, SearchResponse, SearchResult};
use crate::error::Result;
use crate::resource::ResourceId;
use crate::sql::{is_sql, normalize_sql, preview};

impl Explorer {
    /// Searches the catalog, or prepares a SQL stub when `query` looks like SQL.
    ///
    /// The SQL path makes no remote call. The metadata path matches
    /// case-insensitively against catalog names, then per catalog against
    /// `catalog.schema` and `catalog.schema.table`. A remote failure keeps the
    /// hits gathered so far and appends one error entry.
    pub async fn search(&self, query: &str) -> SearchResponse {
        if is_sql(query) {
            return SearchResponse {
                results: vec![SearchEntry::Hit(sql_stub(query))],
            };
        }

        let mut results = Vec::new();
        if let Err(e) = self.search_metadata(&query.to_lowercase(), &mut results).await {
            warn!("Metadata search for '{}' degraded: {}", query, e);
            results.push(SearchEntry::Error(ErrorResult::new(e.to_string())));
        }

        debug!("Search for '{}' returned {} result(s)", query, results.len());
        SearchResponse { results }
    }

    async fn search_metadata(&self, needle: &str, results: &mut Vec<SearchEntry>) -> Result<()> {
        let catalogs = self.catalog.list_catalogs().await?;

        for catalog in &catalogs {
            let id = ResourceId::catalog(&catalog.name);
            if matches(&id, needle) {
                results.push(SearchEntry::Hit(SearchResult::for_object(&id, catalog)));
            }
        }

        for catalog in &catalogs {
            let schemas = self.catalog.list_schemas(&catalog.name).await?;
            for schema in &schemas {
                let schema_id = ResourceId::schema(&catalog.name, &schema.name);
                if matches(&schema_id, needle) {
                    results.push(SearchEntry::Hit(SearchResult::for_object(&schema_id, schema)));
                }

                let tables = self.catalog.list_tables(&catalog.name, &schema.name).await?;
                for table in &tables {
                    let table_id = ResourceId::table(&catalog.name, &schema.name, &table.name);
                    if matches(&table_id, needle) {
                        results.push(SearchEntry::Hit(SearchResult::for_object(&table_id, table)));
                    }
                }
            }
        }

        Ok(())
    }
}

fn matches(id: &ResourceId, needle: &str) -> bool {
    id.qualified_name().to_lowercase().contains(needle)
}

fn sql_stub(query: &str) -> SearchResult {
    let sql = normalize_sql(query);
    SearchResult {
        id: ResourceId::query(sql.as_str()).encode(),
        title: "SQL query preview".to_string(),
        text: preview(&sql),
        metadata: json!({ "sql": sql }),
    }
}
