//! stdio transport: newline-delimited JSON-RPC.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use super::McpServer;
use crate::error::{ExplorerError, Result};

/// Serves on the process's stdin and stdout until stdin closes.
pub async fn serve(server: Arc<McpServer>) -> Result<()> {
    info!("Serving MCP over stdio");
    serve_lines(&server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Reads one message per line from `reader` and writes one response per line.
pub async fn serve_lines<R, W>(server: &McpServer, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.map_err(io_error)? {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(response) = server.handle_message(&line).await {
            let mut encoded = serde_json::to_string(&response)
                .map_err(|e| ExplorerError::internal(format!("Failed to encode response: {e}")))?;
            encoded.push('\n');
            writer.write_all(encoded.as_bytes()).await.map_err(io_error)?;
            writer.flush().await.map_err(io_error)?;
        }
    }

    Ok(())
}

fn io_error(e: std::io::Error) -> ExplorerError {
    ExplorerError::internal(format!("stdio transport failed: {e}"))
}
