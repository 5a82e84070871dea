//! Statement submission and bounded polling.
//!
//! A statement is submitted once, then polled up to `wait_budget_secs` times
//! with a one-second pause between polls. The loop ends on the first
//! terminal observation:
//!
//! - `SUCCEEDED` with a result payload: success.
//! - `FAILED`: [`ExplorerError::SqlExecution`] with the remote message.
//! - budget exhausted: [`ExplorerError::SqlTimeout`]. The remote statement is
//!   left running.
//!
//! `SUCCEEDED` without a result payload is not terminal; the state can flip
//! before the result is attached, so polling continues.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{Sleeper, StatementClient, StatementRequest, StatementState, StatementStatus, TokioSleeper};
use crate::config::{Config, DEFAULT_WAIT_BUDGET_SECS};
use crate::error::{ExplorerError, Result};

/// Pause between two status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Local view of a statement's lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionState {
    /// Submitted, no terminal status observed yet.
    Pending,
    /// Finished with a result payload.
    Succeeded(StatementStatus),
    /// Reported as failed by the warehouse.
    Failed(String),
}

/// One submitted statement, owned by the engine for a single execution.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementExecution {
    pub statement_id: String,
    pub state: ExecutionState,
    /// Status polls performed so far.
    pub polls: u32,
}

impl StatementExecution {
    fn submitted(statement_id: String) -> Self {
        Self {
            statement_id,
            state: ExecutionState::Pending,
            polls: 0,
        }
    }

    /// Applies one polled status. Returns true once the state is terminal.
    fn observe(&mut self, status: StatementStatus) -> bool {
        self.polls += 1;
        match status.state() {
            StatementState::Succeeded if status.has_result() => {
                self.state = ExecutionState::Succeeded(status);
                true
            }
            StatementState::Failed => {
                self.state = ExecutionState::Failed(status.failure_message());
                true
            }
            StatementState::Succeeded => {
                debug!(
                    statement_id = %self.statement_id,
                    "Statement succeeded without a result payload, polling again"
                );
                false
            }
            _ => false,
        }
    }

    /// Returns the final status when the statement succeeded.
    pub fn result(&self) -> Option<&StatementStatus> {
        match &self.state {
            ExecutionState::Succeeded(status) => Some(status),
            _ => None,
        }
    }

    /// Total row count of a succeeded statement; 0 otherwise.
    pub fn row_count(&self) -> u64 {
        self.result().map(StatementStatus::total_row_count).unwrap_or(0)
    }
}

/// Runs statements on one warehouse.
#[derive(Clone)]
pub struct StatementEngine {
    client: Arc<dyn StatementClient>,
    sleeper: Arc<dyn Sleeper>,
    warehouse_id: String,
    wait_budget_secs: u32,
}

impl StatementEngine {
    /// Creates an engine with the default wait budget and a real timer.
    pub fn new(client: Arc<dyn StatementClient>, warehouse_id: impl Into<String>) -> Self {
        Self {
            client,
            sleeper: Arc::new(TokioSleeper),
            warehouse_id: warehouse_id.into(),
            wait_budget_secs: DEFAULT_WAIT_BUDGET_SECS,
        }
    }

    /// Creates an engine using the warehouse and wait budget from `config`.
    pub fn from_config(client: Arc<dyn StatementClient>, config: &Config) -> Self {
        Self::new(client, config.warehouse_id.clone()).with_wait_budget(config.wait_budget_secs)
    }

    /// Replaces the sleeper used between polls.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Sets the number of polls before timing out.
    pub fn with_wait_budget(mut self, wait_budget_secs: u32) -> Self {
        self.wait_budget_secs = wait_budget_secs;
        self
    }

    /// Executes `sql` with the configured wait budget.
    pub async fn execute(&self, sql: &str) -> Result<StatementExecution> {
        self.execute_with_budget(sql, self.wait_budget_secs).await
    }

    /// Executes `sql`, polling at most `wait_budget_secs` times.
    pub async fn execute_with_budget(
        &self,
        sql: &str,
        wait_budget_secs: u32,
    ) -> Result<StatementExecution> {
        let request = StatementRequest::inline(sql, &self.warehouse_id, wait_budget_secs);
        let submitted = self.client.submit(&request).await?;
        let statement_id = submitted
            .statement_id
            .ok_or_else(|| ExplorerError::request("Statement submission returned no statement_id"))?;

        debug!(
            statement_id = %statement_id,
            warehouse_id = %self.warehouse_id,
            state = ?submitted.status.as_ref().map(|s| s.state),
            "Statement submitted"
        );

        let mut execution = StatementExecution::submitted(statement_id);
        for attempt in 1..=wait_budget_secs {
            let status = self.client.get_status(&execution.statement_id).await?;
            debug!(
                statement_id = %execution.statement_id,
                attempt,
                state = ?status.state(),
                "Polled statement status"
            );

            if execution.observe(status) {
                break;
            }
            if attempt < wait_budget_secs {
                self.sleeper.sleep(POLL_INTERVAL).await;
            }
        }

        let failure = match &execution.state {
            ExecutionState::Succeeded(_) => None,
            ExecutionState::Failed(message) => {
                warn!(statement_id = %execution.statement_id, "Statement failed: {}", message);
                Some(ExplorerError::sql_execution(message.clone()))
            }
            ExecutionState::Pending => {
                warn!(
                    statement_id = %execution.statement_id,
                    polls = execution.polls,
                    "Statement did not finish within the wait budget"
                );
                Some(ExplorerError::SqlTimeout {
                    attempts: execution.polls,
                })
            }
        };

        if let Some(error) = failure {
            return Err(error);
        }

        info!(
            statement_id = %execution.statement_id,
            rows = execution.row_count(),
            polls = execution.polls,
            "Statement succeeded"
        );
        Ok(execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{RecordingSleeper, ScriptedStatementClient};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn engine(client: Arc<ScriptedStatementClient>, sleeper: Arc<RecordingSleeper>) -> StatementEngine {
        StatementEngine::new(client, "wh-test").with_sleeper(sleeper)
    }

    #[tokio::test]
    async fn test_succeeds_on_first_poll() {
        let client = Arc::new(
            ScriptedStatementClient::new()
                .then_status(StatementStatus::succeeded(3, json!([["1"], ["2"], ["3"]]))),
        );
        let sleeper = Arc::new(RecordingSleeper::new());

        let execution = engine(client.clone(), sleeper.clone())
            .execute("SELECT 1")
            .await
            .unwrap();

        assert_eq!(execution.row_count(), 3);
        assert_eq!(execution.polls, 1);
        assert_eq!(sleeper.sleep_count(), 0);
        assert_eq!(client.poll_count(), 1);
    }

    #[tokio::test]
    async fn test_submission_request() {
        let client = Arc::new(
            ScriptedStatementClient::new().then_status(StatementStatus::succeeded(0, json!([]))),
        );
        let sleeper = Arc::new(RecordingSleeper::new());

        engine(client.clone(), sleeper)
            .with_wait_budget(20)
            .execute("SELECT a::int FROM t")
            .await
            .unwrap();

        let submitted = client.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(
            submitted[0],
            StatementRequest::inline("SELECT a::int FROM t", "wh-test", 20)
        );
    }

    #[tokio::test]
    async fn test_polls_until_success() {
        let client = Arc::new(
            ScriptedStatementClient::new()
                .then_status(StatementStatus::pending())
                .then_status(StatementStatus::with_state(StatementState::Running))
                .then_status(StatementStatus::succeeded(1, json!([["x"]]))),
        );
        let sleeper = Arc::new(RecordingSleeper::new());

        let execution = engine(client.clone(), sleeper.clone())
            .execute("SELECT 'x'")
            .await
            .unwrap();

        assert_eq!(execution.polls, 3);
        assert_eq!(sleeper.sleeps(), vec![POLL_INTERVAL, POLL_INTERVAL]);
    }

    #[tokio::test]
    async fn test_succeeded_without_result_keeps_polling() {
        let client = Arc::new(
            ScriptedStatementClient::new()
                .then_status(StatementStatus::with_state(StatementState::Succeeded))
                .then_status(StatementStatus::succeeded(2, json!([["a"], ["b"]]))),
        );
        let sleeper = Arc::new(RecordingSleeper::new());

        let execution = engine(client.clone(), sleeper)
            .execute("SELECT 1")
            .await
            .unwrap();

        assert_eq!(execution.polls, 2);
        assert_eq!(execution.row_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_statement() {
        let client = Arc::new(
            ScriptedStatementClient::new()
                .then_status(StatementStatus::pending())
                .then_status(StatementStatus::failed("syntax error")),
        );
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = engine(client, sleeper).execute("BAD").await.unwrap_err();
        assert_eq!(err, ExplorerError::sql_execution("syntax error"));
    }

    #[tokio::test]
    async fn test_timeout_after_budget() {
        let client = Arc::new(ScriptedStatementClient::new());
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = engine(client.clone(), sleeper.clone())
            .with_wait_budget(4)
            .execute("SELECT sleep(100)")
            .await
            .unwrap_err();

        assert_eq!(err, ExplorerError::SqlTimeout { attempts: 4 });
        assert_eq!(client.poll_count(), 4);
        assert_eq!(sleeper.sleep_count(), 3);
    }

    #[tokio::test]
    async fn test_zero_budget_times_out_without_polling() {
        let client = Arc::new(ScriptedStatementClient::new());
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = engine(client.clone(), sleeper)
            .execute_with_budget("SELECT 1", 0)
            .await
            .unwrap_err();

        assert_eq!(err, ExplorerError::SqlTimeout { attempts: 0 });
        assert_eq!(client.poll_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_statement_id() {
        let client = Arc::new(ScriptedStatementClient::new().without_statement_id());
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = engine(client, sleeper).execute("SELECT 1").await.unwrap_err();
        assert_eq!(err.category(), "Request Error");
    }

    #[tokio::test]
    async fn test_poll_error_propagates() {
        let client = Arc::new(
            ScriptedStatementClient::new()
                .then_error(ExplorerError::request("503 Service Unavailable")),
        );
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = engine(client, sleeper).execute("SELECT 1").await.unwrap_err();
        assert_eq!(err.to_string(), "503 Service Unavailable");
    }
}
