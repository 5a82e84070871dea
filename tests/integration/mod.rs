//! Integration tests for Databricks Explorer.

pub mod fetch_test;
pub mod protocol_test;
pub mod search_test;

use std::sync::Arc;

use databricks_explorer::catalog::MockCatalogClient;
use databricks_explorer::statement::{RecordingSleeper, ScriptedStatementClient, StatementEngine};
use databricks_explorer::tools::Explorer;

/// Builds an explorer over the sample catalog tree and the given statement script.
pub fn sample_explorer(
    statements: ScriptedStatementClient,
) -> (Explorer, Arc<ScriptedStatementClient>, Arc<RecordingSleeper>) {
    let statements = Arc::new(statements);
    let sleeper = Arc::new(RecordingSleeper::new());
    let engine = StatementEngine::new(statements.clone(), "wh-integration")
        .with_sleeper(sleeper.clone());
    let explorer = Explorer::new(Arc::new(MockCatalogClient::sample()), engine);
    (explorer, statements, sleeper)
}
