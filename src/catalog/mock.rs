//! In-memory catalog clients for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{CatalogClient, CatalogObject};
use crate::error::{ExplorerError, Result};

/// A catalog client backed by a fixed in-memory tree.
///
/// Listings return objects in insertion order. Every call is counted so tests
/// can assert which paths touched the metadata API.
#[derive(Debug, Default)]
pub struct MockCatalogClient {
    catalogs: Vec<CatalogObject>,
    schemas: HashMap<String, Vec<CatalogObject>>,
    tables: HashMap<(String, String), Vec<CatalogObject>>,
    failing_tables: Option<(String, String)>,
    calls: AtomicUsize,
}

impl MockCatalogClient {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a catalog.
    pub fn with_catalog(mut self, catalog: CatalogObject) -> Self {
        self.catalogs.push(catalog);
        self
    }

    /// Adds a schema under `catalog`.
    pub fn with_schema(mut self, catalog: &str, schema: CatalogObject) -> Self {
        self.schemas
            .entry(catalog.to_string())
            .or_default()
            .push(schema);
        self
    }

    /// Adds a table under `catalog.schema`.
    pub fn with_table(mut self, catalog: &str, schema: &str, table: CatalogObject) -> Self {
        self.tables
            .entry((catalog.to_string(), schema.to_string()))
            .or_default()
            .push(table);
        self
    }

    /// Makes the table listing of `catalog.schema` fail with a request error.
    pub fn failing_tables_for(mut self, catalog: &str, schema: &str) -> Self {
        self.failing_tables = Some((catalog.to_string(), schema.to_string()));
        self
    }

    /// Builds a small two-catalog tree used across tests.
    ///
    /// ```text
    /// main (Main catalog)
    ///   sales (Sales data)
    ///     orders (Customer orders), customers
    ///   hr
    ///     employees
    /// samples
    ///   nyctaxi
    ///     trips (NYC taxi trips)
    /// ```
    pub fn sample() -> Self {
        Self::new()
            .with_catalog(CatalogObject::named("main").with_comment("Main catalog"))
            .with_catalog(CatalogObject::named("samples"))
            .with_schema("main", CatalogObject::named("sales").with_comment("Sales data"))
            .with_schema("main", CatalogObject::named("hr"))
            .with_schema("samples", CatalogObject::named("nyctaxi"))
            .with_table(
                "main",
                "sales",
                CatalogObject::named("orders")
                    .with_comment("Customer orders")
                    .with_field("table_type", "MANAGED"),
            )
            .with_table("main", "sales", CatalogObject::named("customers"))
            .with_table("main", "hr", CatalogObject::named("employees"))
            .with_table(
                "samples",
                "nyctaxi",
                CatalogObject::named("trips").with_comment("NYC taxi trips"),
            )
    }

    /// Returns how many listing calls have been made.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogClient for MockCatalogClient {
    async fn list_catalogs(&self) -> Result<Vec<CatalogObject>> {
        self.record_call();
        Ok(self.catalogs.clone())
    }

    async fn list_schemas(&self, catalog: &str) -> Result<Vec<CatalogObject>> {
        self.record_call();
        Ok(self.schemas.get(catalog).cloned().unwrap_or_default())
    }

    async fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<CatalogObject>> {
        self.record_call();
        if let Some((c, s)) = &self.failing_tables {
            if c == catalog && s == schema {
                return Err(ExplorerError::request(format!(
                    "500 Server Error for url (/api/2.1/unity-catalog/tables?catalog_name={catalog}&schema_name={schema})"
                )));
            }
        }
        Ok(self
            .tables
            .get(&(catalog.to_string(), schema.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// A catalog client whose every call fails with the same request error.
#[derive(Debug, Clone)]
pub struct FailingCatalogClient {
    message: String,
}

impl FailingCatalogClient {
    /// Creates a client failing with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl CatalogClient for FailingCatalogClient {
    async fn list_catalogs(&self) -> Result<Vec<CatalogObject>> {
        Err(ExplorerError::request(self.message.clone()))
    }

    async fn list_schemas(&self, _catalog: &str) -> Result<Vec<CatalogObject>> {
        Err(ExplorerError::request(self.message.clone()))
    }

    async fn list_tables(&self, _catalog: &str, _schema: &str) -> Result<Vec<CatalogObject>> {
        Err(ExplorerError::request(self.message.clone()))
    }
}
