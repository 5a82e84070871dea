//! Databricks Explorer - Unity Catalog browsing and SQL execution over MCP.

mod cli;

use std::sync::Arc;

use cli::{Cli, Transport};
use databricks_explorer::config::{Config, FileConfig};
use databricks_explorer::error::Result;
use databricks_explorer::{build_server, logging, server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init_stderr_logging(cli.log_level.as_deref().unwrap_or("info"));
            error!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    };

    logging::init_stderr_logging(&config.log_level);

    if let Err(e) = run(cli.transport, config).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let file = FileConfig::load_from_file(&cli.config_path())?;
    Config::resolve(cli.overrides(), file)
}

async fn run(transport: Transport, config: Config) -> Result<()> {
    let config = Arc::new(config);
    info!(
        workspace = %config.workspace_url,
        warehouse = %config.warehouse_id,
        "Starting Databricks Explorer"
    );

    let server = Arc::new(build_server(Arc::clone(&config))?);
    match transport {
        Transport::Http => server::http::serve(server, &config).await,
        Transport::Stdio => server::stdio::serve(server).await,
    }
}
