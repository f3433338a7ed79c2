//! Poll session configuration
//!
//! Defines the polling cadence, the failure policy, and the callbacks a
//! session reports through.

use std::fmt;
use std::time::Duration;

use jobwatch_client::ClientError;
use jobwatch_core::domain::job::JobStatus;

use crate::callbacks::Callbacks;
use crate::error::PollError;

/// Default polling cadence
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

/// Settings and callbacks for one poll session
///
/// Failed status queries are tolerated indefinitely unless
/// `max_transport_failures` is set.
pub struct PollConfig {
    /// Time between status queries, and before the first one
    pub interval: Duration,

    /// Consecutive failed status queries after which the session errors
    pub max_transport_failures: Option<u32>,

    /// Total status queries after which the session errors
    pub max_polls: Option<u32>,

    pub(crate) callbacks: Callbacks,
}

impl PollConfig {
    /// Creates a configuration with defaults and no callbacks
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_transport_failures: None,
            max_polls: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - JOBWATCH_POLL_INTERVAL_MS (default: 5000)
    /// - JOBWATCH_MAX_TRANSPORT_FAILURES (default: unbounded)
    /// - JOBWATCH_MAX_POLLS (default: unbounded)
    pub fn from_env() -> Result<Self, PollError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PollConfig::from_env`], reading values through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PollError> {
        let mut config = Self::new();

        if let Some(ms) = parse_number::<u64>(&lookup, "JOBWATCH_POLL_INTERVAL_MS")? {
            config.interval = Duration::from_millis(ms);
        }
        config.max_transport_failures =
            parse_number(&lookup, "JOBWATCH_MAX_TRANSPORT_FAILURES")?;
        config.max_polls = parse_number(&lookup, "JOBWATCH_MAX_POLLS")?;

        config.validate()?;
        Ok(config)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_interval_ms(self, ms: u64) -> Self {
        self.with_interval(Duration::from_millis(ms))
    }

    pub fn with_max_transport_failures(mut self, max: u32) -> Self {
        self.max_transport_failures = Some(max);
        self
    }

    pub fn with_max_polls(mut self, max: u32) -> Self {
        self.max_polls = Some(max);
        self
    }

    pub fn on_status_update(mut self, callback: impl FnMut(&JobStatus) + Send + 'static) -> Self {
        self.callbacks.status_update = Some(Box::new(callback));
        self
    }

    pub fn on_done(mut self, callback: impl FnOnce(Option<String>) + Send + 'static) -> Self {
        self.callbacks.done = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnOnce(String) + Send + 'static) -> Self {
        self.callbacks.error = Some(Box::new(callback));
        self
    }

    /// Diagnostic channel for status queries that fail without ending the session
    pub fn on_poll_failure(
        mut self,
        callback: impl FnMut(&ClientError, u32) + Send + 'static,
    ) -> Self {
        self.callbacks.poll_failure = Some(Box::new(callback));
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), PollError> {
        if self.interval.is_zero() {
            return Err(PollError::InvalidConfig(
                "interval must be greater than 0".to_string(),
            ));
        }

        if self.max_transport_failures == Some(0) {
            return Err(PollError::InvalidConfig(
                "max_transport_failures must be greater than 0".to_string(),
            ));
        }

        if self.max_polls == Some(0) {
            return Err(PollError::InvalidConfig(
                "max_polls must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub(crate) fn into_parts(self) -> (PollSettings, Callbacks) {
        (
            PollSettings {
                interval: self.interval,
                max_transport_failures: self.max_transport_failures,
                max_polls: self.max_polls,
            },
            self.callbacks,
        )
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PollConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollConfig")
            .field("interval", &self.interval)
            .field("max_transport_failures", &self.max_transport_failures)
            .field("max_polls", &self.max_polls)
            .field("callbacks", &self.callbacks.describe())
            .finish()
    }
}

/// The plain settings half of a [`PollConfig`], held by the session task
#[derive(Debug, Clone, Copy)]
pub(crate) struct PollSettings {
    pub interval: Duration,
    pub max_transport_failures: Option<u32>,
    pub max_polls: Option<u32>,
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, PollError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| PollError::InvalidConfig(format!("{} is not a valid number: {}", key, raw))),
        None => Ok(None),
    }
}
