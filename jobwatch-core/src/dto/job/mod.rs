//! Job DTOs for the dashboard endpoints

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/video/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRequest {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Reply of a submission endpoint
///
/// On success the identifier is in `project_id` (dashboard) or `job_id`.
/// Rejections carry `status: "error"` with a `message`, or a bare `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SubmitResponse {
    /// Returns the rejection reason, if the server refused the submission
    pub fn rejection(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        if self.status.as_deref() == Some("error") {
            return Some(
                self.message
                    .clone()
                    .unwrap_or_else(|| "submission rejected".to_string()),
            );
        }
        None
    }

    /// Identifier assigned to the new job, if any
    pub fn identifier(&self) -> Option<&str> {
        self.project_id.as_deref().or(self.job_id.as_deref())
    }
}

/// Dashboard status reply for `GET /api/video/status`
///
/// The outer `status` describes the status check itself (`"success"` or
/// `"error"`); `job_status` is the job's own status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEnvelope {
    pub status: String,
    #[serde(default)]
    pub job_status: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusEnvelope {
    pub fn is_check_failure(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }
}

/// Plain status reply where `status` is the job's own status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlainStatus {
    pub status: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
