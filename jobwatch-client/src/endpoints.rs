//! Endpoint layout of a submit/status job pair

/// Shape of the status reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFormat {
    /// `{ status: "success" | "error", job_status, video_url, message }`
    Envelope,
    /// `{ status: <job status>, result, message }`
    Plain,
}

/// Paths of the submission and status endpoints for one kind of job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEndpoints {
    /// POST target that starts a job and returns its identifier
    pub submit_path: String,
    /// GET target that reports a job's status
    pub status_path: String,
    /// Query parameter carrying the job identifier on status requests
    pub id_param: String,
    pub format: StatusFormat,
}

impl JobEndpoints {
    pub fn new(
        submit_path: impl Into<String>,
        status_path: impl Into<String>,
        id_param: impl Into<String>,
    ) -> Self {
        Self {
            submit_path: submit_path.into(),
            status_path: status_path.into(),
            id_param: id_param.into(),
            format: StatusFormat::Plain,
        }
    }

    /// The dashboard's video generation endpoints
    pub fn video() -> Self {
        Self::new("/api/video/generate", "/api/video/status", "project_id")
            .with_format(StatusFormat::Envelope)
    }

    pub fn with_format(mut self, format: StatusFormat) -> Self {
        self.format = format;
        self
    }
}

impl Default for JobEndpoints {
    fn default() -> Self {
        Self::video()
    }
}
