//! Job backend seam
//!
//! The poller only needs two operations from the remote system: start a job
//! and report a job's status. [`DashboardClient`] provides both over HTTP.

use async_trait::async_trait;
use jobwatch_client::DashboardClient;
use jobwatch_core::domain::job::{JobId, JobStatusReport};

/// Submission and status endpoints of a long-running job
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Starts a job and returns its identifier
    ///
    /// # Arguments
    /// * `payload` - JSON body understood by the submission endpoint
    async fn submit(&self, payload: &serde_json::Value) -> jobwatch_client::Result<JobId>;

    /// Queries the current status of a job
    async fn fetch_status(&self, job_id: &JobId) -> jobwatch_client::Result<JobStatusReport>;
}

#[async_trait]
impl JobBackend for DashboardClient {
    async fn submit(&self, payload: &serde_json::Value) -> jobwatch_client::Result<JobId> {
        self.submit_job(payload).await
    }

    async fn fetch_status(&self, job_id: &JobId) -> jobwatch_client::Result<JobStatusReport> {
        self.get_job_status(job_id).await
    }
}
