//! Command-line argument parsing for the explorer.
//!
//! Every setting can also be supplied through its environment variable.

use databricks_explorer::config::{FileConfig, Overrides};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Transport the tool surface is served over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// JSON-RPC over HTTP POST on /mcp, and SSE on /sse.
    #[default]
    Http,
    /// Newline-delimited JSON-RPC on stdin/stdout.
    Stdio,
}

/// Browse Unity Catalog and run SQL through MCP `search` and `fetch` tools.
#[derive(Parser, Debug)]
#[command(name = "databricks-explorer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Workspace base URL (e.g., https://adb-123.azuredatabricks.net)
    #[arg(long, env = "DATABRICKS_WORKSPACE_URL", value_name = "URL")]
    pub workspace_url: Option<String>,

    /// Personal access token
    #[arg(long, env = "DATABRICKS_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// SQL warehouse that runs every statement
    #[arg(long, env = "DATABRICKS_WAREHOUSE_ID", value_name = "ID")]
    pub warehouse_id: Option<String>,

    /// Bind address for the HTTP transport
    #[arg(long, env = "LISTEN_HOST", value_name = "HOST")]
    pub host: Option<String>,

    /// Listen port for the HTTP transport
    #[arg(short = 'p', long, env = "PORT", value_name = "PORT")]
    pub port: Option<u16>,

    /// Log verbosity (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Transport to serve the tools over
    #[arg(long, value_enum, default_value_t = Transport::Http)]
    pub transport: Transport,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(FileConfig::default_path)
    }

    /// Extracts the settings that take precedence over the config file.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            workspace_url: self.workspace_url.clone(),
            token: self.token.clone(),
            warehouse_id: self.warehouse_id.clone(),
            host: self.host.clone(),
            port: self.port,
            log_level: self.log_level.clone(),
        }
    }
}
