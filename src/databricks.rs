//! Databricks REST client.
//!
//! Implements [`CatalogClient`] against the Unity Catalog API and
//! [`StatementClient`] against the SQL Statement Execution API. Every request
//! carries the configured bearer token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::catalog::{CatalogClient, CatalogList, CatalogObject, SchemaList, TableList};
use crate::config::Config;
use crate::error::{ExplorerError, Result};
use crate::statement::{StatementClient, StatementRequest, StatementStatus, SubmitResponse};

const CATALOGS_PATH: &str = "/api/2.1/unity-catalog/catalogs";
const SCHEMAS_PATH: &str = "/api/2.1/unity-catalog/schemas";
const TABLES_PATH: &str = "/api/2.1/unity-catalog/tables";
const STATEMENTS_PATH: &str = "/api/2.0/sql/statements/";

/// HTTP client for one workspace.
#[derive(Debug, Clone)]
pub struct DatabricksClient {
    config: Arc<Config>,
    client: Client,
}

impl DatabricksClient {
    /// Creates a client for the workspace in `config`.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("databricks-explorer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExplorerError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Builds an absolute URL for `path` with percent-encoded query parameters.
    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let base = format!("{}{}", self.config.workspace_url, path);
        let parsed = if params.is_empty() {
            Url::parse(&base)
        } else {
            Url::parse_with_params(&base, params)
        };
        parsed.map_err(|e| ExplorerError::request(format!("Invalid request URL '{base}': {e}")))
    }

    fn authorized(&self, request: RequestBuilder, timeout: Duration) -> RequestBuilder {
        request.bearer_auth(&self.config.token).timeout(timeout)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, timeout: Duration) -> Result<T> {
        debug!("GET {}", url);
        let request = self.authorized(self.client.get(url.clone()), timeout);
        Self::send(request, &url).await
    }

    /// Sends a request and decodes a successful JSON body.
    ///
    /// Non-2xx responses become [`ExplorerError::Request`] with the status,
    /// URL, and body text.
    async fn send<T: DeserializeOwned>(request: RequestBuilder, url: &Url) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let mut message = format!("{status} for url ({url})");
            if !body.trim().is_empty() {
                message.push_str(": ");
                message.push_str(body.trim());
            }
            return Err(ExplorerError::request(message));
        }

        serde_json::from_str(&body)
            .map_err(|e| ExplorerError::request(format!("Failed to parse response from {url}: {e}")))
    }
}

#[async_trait]
impl CatalogClient for DatabricksClient {
    async fn list_catalogs(&self) -> Result<Vec<CatalogObject>> {
        let url = self.url(CATALOGS_PATH, &[])?;
        let list: CatalogList = self.get_json(url, self.config.metadata_timeout).await?;
        Ok(list.catalogs)
    }

    async fn list_schemas(&self, catalog: &str) -> Result<Vec<CatalogObject>> {
        let url = self.url(SCHEMAS_PATH, &[("catalog_name", catalog)])?;
        let list: SchemaList = self.get_json(url, self.config.metadata_timeout).await?;
        Ok(list.schemas)
    }

    async fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<CatalogObject>> {
        let url = self.url(
            TABLES_PATH,
            &[("catalog_name", catalog), ("schema_name", schema)],
        )?;
        let list: TableList = self
            .get_json(url, self.config.table_listing_timeout)
            .await?;
        Ok(list.tables)
    }
}

#[async_trait]
impl StatementClient for DatabricksClient {
    async fn submit(&self, request: &StatementRequest) -> Result<SubmitResponse> {
        let url = self.url(STATEMENTS_PATH, &[])?;
        debug!("POST {} (warehouse {})", url, request.warehouse_id);
        let builder = self.authorized(
            self.client.post(url.clone()).json(request),
            self.config.submit_timeout,
        );
        Self::send(builder, &url).await
    }

    async fn get_status(&self, statement_id: &str) -> Result<StatementStatus> {
        let mut url = self.url(STATEMENTS_PATH, &[])?;
        url.path_segments_mut()
            .map_err(|_| ExplorerError::request("Workspace URL cannot carry a path"))?
            .pop_if_empty()
            .push(statement_id);
        self.get_json(url, self.config.metadata_timeout).await
    }
}
