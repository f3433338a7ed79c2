//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque job identifier assigned by the submission endpoint
///
/// Never empty. Serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates an identifier, returning `None` for blank input
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a job as reported by the remote system
///
/// `Done` and `Error` are terminal. Every other value is carried verbatim
/// as an in-progress status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Done,
    Error,
    InProgress(String),
}

impl JobStatus {
    pub const DONE: &'static str = "done";
    pub const ERROR: &'static str = "error";
    pub const PENDING: &'static str = "pending";

    /// Parses a raw status value
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case(Self::DONE) {
            JobStatus::Done
        } else if normalized.eq_ignore_ascii_case(Self::ERROR) {
            JobStatus::Error
        } else {
            JobStatus::InProgress(normalized.to_string())
        }
    }

    /// Status reported for a job that has not started rendering yet
    pub fn pending() -> Self {
        JobStatus::InProgress(Self::PENDING.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Done => Self::DONE,
            JobStatus::Error => Self::ERROR,
            JobStatus::InProgress(raw) => raw,
        }
    }

    /// Whether no further status changes will occur
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        JobStatus::parse(&raw)
    }
}

impl From<&str> for JobStatus {
    fn from(raw: &str) -> Self {
        JobStatus::parse(raw)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observation of a job produced by one status query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Retrievable artifact location, usually set once the job is done
    pub result: Option<String>,
    /// Detail from the remote system, usually set on error
    pub message: Option<String>,
    pub observed_at: chrono::DateTime<chrono::Utc>,
}

impl JobStatusReport {
    /// Creates a report observed now
    pub fn new(job_id: JobId, status: JobStatus) -> Self {
        Self {
            job_id,
            status,
            result: None,
            message: None,
            observed_at: chrono::Utc::now(),
        }
    }

    pub fn with_result(mut self, result: Option<String>) -> Self {
        self.result = result;
        self
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }
}
