//! Job submission and status endpoints

use crate::DashboardClient;
use crate::endpoints::StatusFormat;
use crate::error::{ClientError, Result};
use jobwatch_core::domain::job::{JobId, JobStatus, JobStatusReport};
use jobwatch_core::dto::job::{PlainStatus, StatusEnvelope, SubmitResponse, VideoRequest};
use serde::Serialize;
use tracing::debug;

impl DashboardClient {
    // =============================================================================
    // Job Submission
    // =============================================================================

    /// Start a job and return the identifier the server assigned to it
    ///
    /// # Arguments
    /// * `req` - JSON body understood by the submit endpoint
    ///
    /// # Returns
    /// The new job's identifier
    pub async fn submit_job<T: Serialize + ?Sized>(&self, req: &T) -> Result<JobId> {
        let url = self.url(&self.endpoints.submit_path);
        let response = self.client.post(&url).json(req).send().await?;

        let reply: SubmitResponse = self.handle_response(response).await?;

        if let Some(reason) = reply.rejection() {
            return Err(ClientError::Rejected(reason));
        }

        let job_id = reply
            .identifier()
            .and_then(JobId::new)
            .ok_or_else(|| {
                ClientError::ParseError("response did not include a job identifier".to_string())
            })?;

        debug!("Submitted job {}", job_id);
        Ok(job_id)
    }

    /// Start a video generation job
    ///
    /// # Example
    /// ```no_run
    /// # use jobwatch_client::DashboardClient;
    /// # use jobwatch_core::dto::job::VideoRequest;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = DashboardClient::new("http://localhost:5000");
    /// let job_id = client.generate_video(VideoRequest {
    ///     subject: "Top 10 bridges".to_string(),
    ///     email: Some("me@example.com".to_string()),
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate_video(&self, req: VideoRequest) -> Result<JobId> {
        if req.subject.trim().is_empty() {
            return Err(ClientError::InvalidRequest("Subject is required".to_string()));
        }

        self.submit_job(&req).await
    }

    // =============================================================================
    // Job Status
    // =============================================================================

    /// Query the current status of a job
    ///
    /// A status check the server itself reports as failed is returned as
    /// [`ClientError::Rejected`]; a job that failed is an `Ok` report with
    /// [`JobStatus::Error`].
    pub async fn get_job_status(&self, job_id: &JobId) -> Result<JobStatusReport> {
        let url = self.url(&self.endpoints.status_path);
        let response = self
            .client
            .get(&url)
            .query(&[(self.endpoints.id_param.as_str(), job_id.as_str())])
            .send()
            .await?;

        match self.endpoints.format {
            StatusFormat::Envelope => {
                let envelope: StatusEnvelope = self.handle_response(response).await?;
                report_from_envelope(job_id, envelope)
            }
            StatusFormat::Plain => {
                let plain: PlainStatus = self.handle_response(response).await?;
                Ok(JobStatusReport::new(job_id.clone(), JobStatus::parse(&plain.status))
                    .with_result(plain.result)
                    .with_message(plain.message))
            }
        }
    }
}

fn report_from_envelope(job_id: &JobId, envelope: StatusEnvelope) -> Result<JobStatusReport> {
    if envelope.is_check_failure() {
        return Err(ClientError::Rejected(
            envelope
                .message
                .unwrap_or_else(|| "status check failed".to_string()),
        ));
    }

    let status = envelope
        .job_status
        .as_deref()
        .map(JobStatus::parse)
        .unwrap_or_else(JobStatus::pending);

    Ok(JobStatusReport::new(job_id.clone(), status)
        .with_result(envelope.video_url)
        .with_message(envelope.message))
}
