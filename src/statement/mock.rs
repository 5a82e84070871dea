//! Scripted statement service and instant sleeper for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Sleeper, StatementClient, StatementRequest, StatementStatus, SubmitResponse};
use crate::error::{ExplorerError, Result};

/// Statement id handed out by [`ScriptedStatementClient`].
pub const SCRIPTED_STATEMENT_ID: &str = "01ef-scripted";

/// A statement service that replays a fixed sequence of poll responses.
///
/// Once the script is used up every further poll reports `PENDING`.
#[derive(Debug, Default)]
pub struct ScriptedStatementClient {
    script: Mutex<VecDeque<Result<StatementStatus>>>,
    submitted: Mutex<Vec<StatementRequest>>,
    polls: AtomicUsize,
    omit_statement_id: bool,
}

impl ScriptedStatementClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a poll response.
    pub fn then_status(self, status: StatementStatus) -> Self {
        self.push(Ok(status));
        self
    }

    /// Appends a failing poll.
    pub fn then_error(self, error: ExplorerError) -> Self {
        self.push(Err(error));
        self
    }

    /// Makes submission return a response without a statement id.
    pub fn without_statement_id(mut self) -> Self {
        self.omit_statement_id = true;
        self
    }

    /// Requests received by `submit`, in order.
    pub fn submitted(&self) -> Vec<StatementRequest> {
        self.submitted
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Number of status polls received.
    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    fn push(&self, entry: Result<StatementStatus>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }
}

#[async_trait]
impl StatementClient for ScriptedStatementClient {
    async fn submit(&self, request: &StatementRequest) -> Result<SubmitResponse> {
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push(request.clone());
        }
        Ok(SubmitResponse {
            statement_id: (!self.omit_statement_id).then(|| SCRIPTED_STATEMENT_ID.to_string()),
            status: None,
        })
    }

    async fn get_status(&self, statement_id: &str) -> Result<StatementStatus> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .map_err(|_| ExplorerError::internal("statement script lock poisoned"))?
            .pop_front();

        next.unwrap_or_else(|| Ok(StatementStatus::pending()))
            .map(|mut status| {
                status.statement_id = Some(statement_id.to_string());
                status
            })
    }
}

/// A sleeper that returns immediately and records every requested pause.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pauses requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sleep_count(&self) -> usize {
        self.sleeps().len()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
    }
}
