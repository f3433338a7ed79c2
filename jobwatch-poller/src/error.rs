//! Error types for the poller

use jobwatch_client::ClientError;
use thiserror::Error;

/// Errors surfaced synchronously to the caller of the poller
///
/// Failures that happen while a session is polling are never returned here;
/// they go through the session callbacks instead.
#[derive(Debug, Error)]
pub enum PollError {
    /// Polling settings are unusable
    #[error("Invalid poll configuration: {0}")]
    InvalidConfig(String),

    /// The job could not be started, so no session was created
    #[error("Job submission failed: {0}")]
    Submission(#[source] ClientError),

    /// The submission payload could not be encoded
    #[error("Failed to encode submission payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The session task ended abnormally
    #[error("Poll task failed: {0}")]
    TaskFailed(String),
}
