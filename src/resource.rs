//! Resource identifiers.
//!
//! Every object the tools hand out is named by a single string of the form
//! `<kind>::<payload>`:
//!
//! - `catalog::<catalog>`
//! - `schema::<catalog>.<schema>`
//! - `table::<catalog>.<schema>.<table>`
//! - `query::<SQL statement>`
//!
//! Decoding splits on the first `::` only. A query payload is taken verbatim,
//! so SQL containing `::` casts or dotted names survives a round trip.

use std::fmt;
use std::str::FromStr;

use crate::error::{ExplorerError, Result};

/// Separator between the kind tag and the payload.
pub const KIND_SEPARATOR: &str = "::";

/// Kind tag for SQL statements.
pub const QUERY_PREFIX: &str = "query::";

/// A decoded resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Catalog(String),
    Schema {
        catalog: String,
        schema: String,
    },
    Table {
        catalog: String,
        schema: String,
        table: String,
    },
    Query(String),
}

impl ResourceId {
    pub fn catalog(name: impl Into<String>) -> Self {
        Self::Catalog(name.into())
    }

    pub fn schema(catalog: impl Into<String>, schema: impl Into<String>) -> Self {
        Self::Schema {
            catalog: catalog.into(),
            schema: schema.into(),
        }
    }

    pub fn table(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self::Table {
            catalog: catalog.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    pub fn query(sql: impl Into<String>) -> Self {
        Self::Query(sql.into())
    }

    /// Returns the kind tag used in the encoded form.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "catalog",
            Self::Schema { .. } => "schema",
            Self::Table { .. } => "table",
            Self::Query(_) => "query",
        }
    }

    /// Returns the human-readable kind used in result titles.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "Catalog",
            Self::Schema { .. } => "Schema",
            Self::Table { .. } => "Table",
            Self::Query(_) => "Query",
        }
    }

    /// Returns the dotted, fully qualified name, or the SQL text for queries.
    pub fn qualified_name(&self) -> String {
        match self {
            Self::Catalog(name) => name.clone(),
            Self::Schema { catalog, schema } => format!("{catalog}.{schema}"),
            Self::Table {
                catalog,
                schema,
                table,
            } => format!("{catalog}.{schema}.{table}"),
            Self::Query(sql) => sql.clone(),
        }
    }

    /// Encodes the identifier into its string form.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decodes an identifier string.
    ///
    /// Fails with [`ExplorerError::MalformedIdentifier`] when there is no
    /// `::`, the kind is unknown, or the dotted payload has the wrong number
    /// of non-empty parts for its kind.
    pub fn decode(id: &str) -> Result<Self> {
        let (kind, payload) = id
            .split_once(KIND_SEPARATOR)
            .ok_or(ExplorerError::MalformedIdentifier)?;

        if kind == "query" {
            return Ok(Self::Query(payload.to_string()));
        }

        let parts: Vec<&str> = payload.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ExplorerError::MalformedIdentifier);
        }

        match (kind, parts.as_slice()) {
            ("catalog", [catalog]) => Ok(Self::catalog(*catalog)),
            ("schema", [catalog, schema]) => Ok(Self::schema(*catalog, *schema)),
            ("table", [catalog, schema, table]) => Ok(Self::table(*catalog, *schema, *table)),
            _ => Err(ExplorerError::MalformedIdentifier),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.kind(), KIND_SEPARATOR, self.qualified_name())
    }
}

impl FromStr for ResourceId {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// Returns the SQL text of a `query::` identifier without decoding the rest.
pub fn query_payload(id: &str) -> Option<&str> {
    id.strip_prefix(QUERY_PREFIX)
}
