//! Jobwatch HTTP Client
//!
//! A small, type-safe HTTP client for the dashboard's job submission and
//! job status endpoints.
//!
//! # Example
//!
//! ```no_run
//! use jobwatch_client::DashboardClient;
//! use jobwatch_core::dto::job::VideoRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DashboardClient::new("http://localhost:5000");
//!
//!     let job_id = client.generate_video(VideoRequest {
//!         subject: "Top 10 volcanoes".to_string(),
//!         email: None,
//!     }).await?;
//!
//!     let report = client.get_job_status(&job_id).await?;
//!     println!("{} is {}", job_id, report.status);
//!     Ok(())
//! }
//! ```

mod endpoints;
pub mod error;
mod jobs;

pub use endpoints::{JobEndpoints, StatusFormat};
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the dashboard job endpoints
#[derive(Debug, Clone)]
pub struct DashboardClient {
    /// Base URL of the dashboard (e.g., "http://localhost:5000")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Paths and reply format of the job endpoints
    endpoints: JobEndpoints,
}

impl DashboardClient {
    /// Create a new dashboard client targeting the video endpoints
    ///
    /// # Example
    /// ```
    /// use jobwatch_client::DashboardClient;
    ///
    /// let client = DashboardClient::new("http://localhost:5000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new dashboard client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use jobwatch_client::DashboardClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = DashboardClient::with_client("http://localhost:5000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            endpoints: JobEndpoints::video(),
        }
    }

    /// Point the client at a different pair of job endpoints
    pub fn with_endpoints(mut self, endpoints: JobEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Get the base URL of the dashboard
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoints(&self) -> &JobEndpoints {
        &self.endpoints
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Non-2xx statuses become [`ClientError::ApiError`] carrying the body text.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
