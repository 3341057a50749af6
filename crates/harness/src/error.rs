//! Error types for the contract harness
//!
//! Failures follow the three kinds a contract run can hit: the login step
//! failing (fatal), a call answering with the wrong status, and a response
//! body missing a key or carrying a value of the wrong type. Every variant
//! built from a response keeps the raw body so a failed case shows exactly
//! what the server said.

use reqwest::StatusCode;

/// Operation name carried by errors raised while logging in
pub const LOGIN_OPERATION: &str = "login";

/// Harness result type
pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Login failed with status {status}; the run cannot continue. Response body: {body}")]
    Setup { status: StatusCode, body: String },

    #[error("{operation}: request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation}: expected status {expected}, got {actual}. Response body: {body}")]
    UnexpectedStatus {
        operation: &'static str,
        expected: StatusCode,
        actual: StatusCode,
        body: String,
    },

    #[error("{operation}: {message}. Response body: {body}")]
    Shape {
        operation: &'static str,
        message: String,
        body: String,
    },
}

impl HarnessError {
    /// Whether this failure aborts the whole run rather than a single case.
    ///
    /// Any failure to obtain a token is fatal, whatever its kind.
    pub fn is_fatal(&self) -> bool {
        match self {
            HarnessError::Setup { .. } | HarnessError::Configuration(_) => true,
            HarnessError::Transport { operation, .. } | HarnessError::Shape { operation, .. } => {
                *operation == LOGIN_OPERATION
            }
            HarnessError::UnexpectedStatus { .. } => false,
        }
    }

    /// Short machine-readable kind, used as a structured logging field
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::Configuration(_) => "configuration",
            HarnessError::Setup { .. } => "setup",
            HarnessError::Transport { .. } => "transport",
            HarnessError::UnexpectedStatus { .. } => "unexpected_status",
            HarnessError::Shape { .. } => "shape",
        }
    }

    /// The response body the failure was built from, if any
    pub fn response_body(&self) -> Option<&str> {
        match self {
            HarnessError::Setup { body, .. }
            | HarnessError::UnexpectedStatus { body, .. }
            | HarnessError::Shape { body, .. } => Some(body),
            HarnessError::Configuration(_) | HarnessError::Transport { .. } => None,
        }
    }
}
