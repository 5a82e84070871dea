//! Error types for the explorer.
//!
//! Every failure the tools can hit maps onto one variant here. The `search`
//! and `fetch` tools turn these into `{error: ...}` results at their boundary;
//! only configuration errors abort the process.

use thiserror::Error;

/// Main error type for explorer operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExplorerError {
    /// A resource identifier that does not decode into a known shape.
    #[error("Bad ID format")]
    MalformedIdentifier,

    /// The warehouse reported the statement as failed.
    #[error("{0}")]
    SqlExecution(String),

    /// The poll budget ran out before the statement reached a terminal state.
    #[error("SQL timed out after wait_timeout")]
    SqlTimeout {
        /// Number of status polls performed.
        attempts: u32,
    },

    /// HTTP or network failure talking to the workspace (status, transport, decode).
    #[error("{0}")]
    Request(String),

    /// A point lookup found no object with the requested name.
    #[error("Resource '{0}' not found")]
    NotFound(String),

    /// Configuration errors (missing credentials, invalid URL, bad config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExplorerError {
    /// Creates a SQL execution error with the given message.
    pub fn sql_execution(msg: impl Into<String>) -> Self {
        Self::SqlExecution(msg.into())
    }

    /// Creates a request error with the given message.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Creates a not-found error for the given resource identifier.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedIdentifier => "Identifier Error",
            Self::SqlExecution(_) => "SQL Execution Error",
            Self::SqlTimeout { .. } => "SQL Timeout",
            Self::Request(_) => "Request Error",
            Self::NotFound(_) => "Not Found",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

impl From<reqwest::Error> for ExplorerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Request(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            Self::Request(format!("Failed to connect to workspace: {e}"))
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Result type alias using ExplorerError.
pub type Result<T> = std::result::Result<T, ExplorerError>;
