//! Configuration management for the explorer.
//!
//! Settings come from CLI flags and environment variables (both handled by
//! clap, see [`crate::cli`]), then an optional TOML file, then built-in
//! defaults. The result is a single immutable [`Config`] that is built once
//! at startup and shared by every component.

use crate::error::{ExplorerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default bind address for the HTTP transport.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port for the HTTP transport.
pub const DEFAULT_PORT: u16 = 8080;

/// Default log verbosity.
pub const DEFAULT_LOG_LEVEL: &str = "debug";

/// Default timeout for catalog and schema listings and status polls.
pub const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 10;

/// Default timeout for table listings, which can be slow on large schemas.
pub const DEFAULT_TABLE_LISTING_TIMEOUT_SECS: u64 = 60;

/// Default timeout for the statement submission request.
pub const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 10;

/// Default number of one-second polls before a statement times out.
pub const DEFAULT_WAIT_BUDGET_SECS: u32 = 15;

/// Resolved, validated configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Workspace base URL without a trailing slash.
    pub workspace_url: String,
    /// Personal access token sent as a bearer credential.
    pub token: String,
    /// SQL warehouse every statement runs on.
    pub warehouse_id: String,
    /// Bind address for the HTTP transport.
    pub host: String,
    /// Listen port for the HTTP transport.
    pub port: u16,
    /// Log verbosity used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Timeout for catalog, schema and statement status requests.
    pub metadata_timeout: Duration,
    /// Timeout for table listing requests.
    pub table_listing_timeout: Duration,
    /// Timeout for the statement submission request.
    pub submit_timeout: Duration,
    /// Poll attempts (one per second) before a statement times out.
    pub wait_budget_secs: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("workspace_url", &self.workspace_url)
            .field("token", &"<redacted>")
            .field("warehouse_id", &self.warehouse_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("metadata_timeout", &self.metadata_timeout)
            .field("table_listing_timeout", &self.table_listing_timeout)
            .field("submit_timeout", &self.submit_timeout)
            .field("wait_budget_secs", &self.wait_budget_secs)
            .finish()
    }
}

/// Values supplied on the command line or through the environment.
///
/// Every field is optional; missing values fall through to the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub workspace_url: Option<String>,
    pub token: Option<String>,
    pub warehouse_id: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// On-disk TOML configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Workspace connection settings.
    #[serde(default)]
    pub databricks: DatabricksSection,

    /// HTTP transport settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Request timeouts and the statement wait budget.
    #[serde(default)]
    pub timeouts: TimeoutSection,

    /// Log verbosity (e.g. "info", "debug").
    pub log_level: Option<String>,
}

/// `[databricks]` table of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabricksSection {
    pub workspace_url: Option<String>,
    /// Storing the token in the file is supported but not recommended.
    pub token: Option<String>,
    pub warehouse_id: Option<String>,
}

/// `[server]` table of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// `[timeouts]` table of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSection {
    #[serde(default = "default_metadata_secs")]
    pub metadata_secs: u64,
    #[serde(default = "default_table_listing_secs")]
    pub table_listing_secs: u64,
    #[serde(default = "default_submit_secs")]
    pub submit_secs: u64,
    #[serde(default = "default_wait_budget_secs")]
    pub wait_budget_secs: u32,
}

fn default_metadata_secs() -> u64 {
    DEFAULT_METADATA_TIMEOUT_SECS
}

fn default_table_listing_secs() -> u64 {
    DEFAULT_TABLE_LISTING_TIMEOUT_SECS
}

fn default_submit_secs() -> u64 {
    DEFAULT_SUBMIT_TIMEOUT_SECS
}

fn default_wait_budget_secs() -> u32 {
    DEFAULT_WAIT_BUDGET_SECS
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            metadata_secs: default_metadata_secs(),
            table_listing_secs: default_table_listing_secs(),
            submit_secs: default_submit_secs(),
            wait_budget_secs: default_wait_budget_secs(),
        }
    }
}

impl FileConfig {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("databricks-explorer")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file is an empty config.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ExplorerError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ExplorerError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}

impl Config {
    /// Merges overrides over the file config and validates the result.
    ///
    /// Fails when any of the three workspace settings is missing or the
    /// workspace URL is not an absolute http(s) URL.
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self> {
        let workspace_url = non_empty(overrides.workspace_url.or(file.databricks.workspace_url));
        let token = non_empty(overrides.token.or(file.databricks.token));
        let warehouse_id = non_empty(overrides.warehouse_id.or(file.databricks.warehouse_id));

        let (workspace_url, token, warehouse_id) = match (workspace_url, token, warehouse_id) {
            (Some(url), Some(token), Some(warehouse)) => (url, token, warehouse),
            (url, token, warehouse) => {
                let missing: Vec<&str> = [
                    ("DATABRICKS_WORKSPACE_URL", url.is_none()),
                    ("DATABRICKS_TOKEN", token.is_none()),
                    ("DATABRICKS_WAREHOUSE_ID", warehouse.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                return Err(ExplorerError::config(format!(
                    "Set DATABRICKS_WORKSPACE_URL, DATABRICKS_TOKEN and DATABRICKS_WAREHOUSE_ID (missing: {})",
                    missing.join(", ")
                )));
            }
        };

        let timeouts = file.timeouts;
        if timeouts.wait_budget_secs == 0 {
            return Err(ExplorerError::config("wait_budget_secs must be at least 1"));
        }

        Ok(Self {
            workspace_url: normalize_workspace_url(&workspace_url)?,
            token,
            warehouse_id,
            host: overrides
                .host
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            log_level: overrides
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
            metadata_timeout: Duration::from_secs(timeouts.metadata_secs),
            table_listing_timeout: Duration::from_secs(timeouts.table_listing_secs),
            submit_timeout: Duration::from_secs(timeouts.submit_secs),
            wait_budget_secs: timeouts.wait_budget_secs,
        })
    }

    /// Builds a config with default timeouts, for tests and embedding.
    pub fn new(
        workspace_url: impl Into<String>,
        token: impl Into<String>,
        warehouse_id: impl Into<String>,
    ) -> Result<Self> {
        Self::resolve(
            Overrides {
                workspace_url: Some(workspace_url.into()),
                token: Some(token.into()),
                warehouse_id: Some(warehouse_id.into()),
                ..Default::default()
            },
            FileConfig::default(),
        )
    }

    /// Returns the `host:port` string the HTTP transport binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates the workspace URL and strips trailing slashes so API paths can
/// be appended directly.
fn normalize_workspace_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| ExplorerError::config(format!("Invalid workspace URL '{raw}': {e}")))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ExplorerError::config(format!(
            "Invalid scheme '{}'. Expected 'https' or 'http'",
            url.scheme()
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}
