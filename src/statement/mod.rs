//! SQL statement execution against a fixed warehouse.
//!
//! Wire types for the statement API, the [`StatementClient`] seam the engine
//! talks through, and the [`Sleeper`] seam the poll loop waits through.

mod engine;
mod mock;

pub use engine::{ExecutionState, StatementEngine, StatementExecution, POLL_INTERVAL};
pub use mock::{RecordingSleeper, ScriptedStatementClient};

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;

/// What the warehouse does when the server-side wait hint elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnWaitTimeout {
    Continue,
}

/// Where result rows are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Inline,
}

/// Encoding of inline result rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultFormat {
    JsonArray,
}

/// Body of the statement submission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementRequest {
    pub statement: String,
    pub warehouse_id: String,
    /// Server-side wait hint, e.g. `"15s"`.
    pub wait_timeout: String,
    pub on_wait_timeout: OnWaitTimeout,
    pub disposition: Disposition,
    pub format: ResultFormat,
}

impl StatementRequest {
    /// Builds an inline JSON-array request that keeps running past the wait hint.
    pub fn inline(
        statement: impl Into<String>,
        warehouse_id: impl Into<String>,
        wait_secs: u32,
    ) -> Self {
        Self {
            statement: statement.into(),
            warehouse_id: warehouse_id.into(),
            wait_timeout: format!("{wait_secs}s"),
            on_wait_timeout: OnWaitTimeout::Continue,
            disposition: Disposition::Inline,
            format: ResultFormat::JsonArray,
        }
    }
}

/// Body of the submission response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub statement_id: Option<String>,
    #[serde(default)]
    pub status: Option<StatusInfo>,
}

/// Remote lifecycle state of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
    #[serde(other)]
    Unknown,
}

/// Error detail attached to a failed statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `status` object of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub state: StatementState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceError>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `manifest` object of a statement; describes the result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_row_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full response of the statement status call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_id: Option<String>,
    pub status: StatusInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<Manifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatementStatus {
    /// A status in the given state with nothing else attached.
    pub fn with_state(state: StatementState) -> Self {
        Self {
            statement_id: None,
            status: StatusInfo {
                state,
                error: None,
                extra: Map::new(),
            },
            manifest: None,
            result: None,
            extra: Map::new(),
        }
    }

    /// A pending status.
    pub fn pending() -> Self {
        Self::with_state(StatementState::Pending)
    }

    /// A succeeded status whose manifest reports `rows` rows.
    pub fn succeeded(rows: u64, data: Value) -> Self {
        let mut status = Self::with_state(StatementState::Succeeded);
        status.manifest = Some(Manifest {
            total_row_count: Some(rows),
            extra: Map::new(),
        });
        status.result = Some(json!({ "data_array": data }));
        status
    }

    /// A failed status carrying `message` as its error detail.
    pub fn failed(message: impl Into<String>) -> Self {
        let mut status = Self::with_state(StatementState::Failed);
        status.status.error = Some(ServiceError {
            error_code: None,
            message: Some(message.into()),
            extra: Map::new(),
        });
        status
    }

    pub fn state(&self) -> StatementState {
        self.status.state
    }

    /// True when a non-empty result payload is attached.
    pub fn has_result(&self) -> bool {
        match &self.result {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }

    /// Total row count from the manifest; 0 when missing.
    pub fn total_row_count(&self) -> u64 {
        self.manifest
            .as_ref()
            .and_then(|m| m.total_row_count)
            .unwrap_or(0)
    }

    /// Message describing a failure: the remote error detail when present,
    /// else the whole status object as JSON.
    pub fn failure_message(&self) -> String {
        self.status
            .error
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| self.to_json().to_string())
    }

    /// Returns the full status as JSON.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Remote statement service.
#[async_trait]
pub trait StatementClient: Send + Sync {
    /// Submits a statement and returns the submission response.
    async fn submit(&self, request: &StatementRequest) -> Result<SubmitResponse>;

    /// Fetches the current status of a submitted statement.
    async fn get_status(&self, statement_id: &str) -> Result<StatementStatus>;
}

/// Waits between poll attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
