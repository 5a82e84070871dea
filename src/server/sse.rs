//! Server-Sent Events transport.
//!
//! A client opens `GET /sse` and receives an `endpoint` event naming the URL
//! it posts JSON-RPC messages to. Responses are pushed back over the open
//! stream as `message` events. A session lives as long as its stream.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::convert::Infallible;
use std::hash::{BuildHasher, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{JsonRpcResponse, McpServer};

/// Path clients post session messages to.
pub const MESSAGES_PATH: &str = "/messages/";

type Outbox = mpsc::UnboundedSender<JsonRpcResponse>;

/// Open SSE sessions, keyed by session id.
#[derive(Debug, Default)]
pub struct SseSessions {
    next: AtomicU64,
    outboxes: Mutex<HashMap<String, Outbox>>,
}

impl SseSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session and returns its id with the receiving half.
    pub fn open(&self) -> (String, mpsc::UnboundedReceiver<JsonRpcResponse>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.next_id();
        if let Ok(mut outboxes) = self.outboxes.lock() {
            outboxes.insert(id.clone(), sender);
        }
        (id, receiver)
    }

    pub fn outbox(&self, id: &str) -> Option<Outbox> {
        self.outboxes.lock().ok()?.get(id).cloned()
    }

    pub fn close(&self, id: &str) {
        if let Ok(mut outboxes) = self.outboxes.lock() {
            outboxes.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.outboxes.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Random 64-bit prefix plus a counter, as 32 hex digits.
    fn next_id(&self) -> String {
        let sequence = self.next.fetch_add(1, Ordering::Relaxed);
        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u64(sequence);
        format!("{:016x}{:016x}", hasher.finish(), sequence)
    }
}

/// Removes its session when the event stream is dropped.
struct SessionGuard {
    sessions: Arc<SseSessions>,
    id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        debug!(session_id = %self.id, "SSE session closed");
        self.sessions.close(&self.id);
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: String,
}

/// `GET /sse`: opens a session and streams its responses.
pub async fn open_stream(
    State(sessions): State<Arc<SseSessions>>,
) -> Sse<BoxStream<'static, Result<Event, Infallible>>> {
    let (id, receiver) = sessions.open();
    debug!(session_id = %id, "SSE session opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{MESSAGES_PATH}?session_id={id}"));
    let guard = SessionGuard { sessions, id };

    let messages = stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
        let response = receiver.recv().await?;
        Some((message_event(&response), (receiver, guard)))
    });

    let events = stream::once(async move { Ok::<_, Infallible>(endpoint) })
        .chain(messages.map(Ok))
        .boxed();
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// `POST /messages/?session_id=...`: handles one message for a session.
pub async fn post_message(
    State(server): State<Arc<McpServer>>,
    State(sessions): State<Arc<SseSessions>>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Response {
    let Some(outbox) = sessions.outbox(&query.session_id) else {
        return (StatusCode::NOT_FOUND, "Unknown session").into_response();
    };

    if let Some(response) = server.handle_message(&body).await {
        if outbox.send(response).is_err() {
            warn!(session_id = %query.session_id, "SSE session went away before its response");
            sessions.close(&query.session_id);
            return (StatusCode::GONE, "Session closed").into_response();
        }
    }
    StatusCode::ACCEPTED.into_response()
}

fn message_event(response: &JsonRpcResponse) -> Event {
    match serde_json::to_string(response) {
        Ok(data) => Event::default().event("message").data(data),
        Err(e) => Event::default()
            .event("error")
            .data(format!("Failed to encode response: {e}")),
    }
}
