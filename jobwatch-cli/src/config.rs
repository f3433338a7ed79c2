//! Configuration module
//!
//! Handles CLI configuration including the dashboard URL.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the dashboard server
    pub dashboard_url: String,
}
