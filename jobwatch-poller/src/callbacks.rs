//! Caller-supplied reactions to session events
//!
//! The poller never renders anything itself. A presentation layer injects
//! these callbacks and the session task invokes them.

use jobwatch_client::ClientError;
use jobwatch_core::domain::job::JobStatus;

/// Invoked on every successful poll with the reported status
pub type StatusCallback = Box<dyn FnMut(&JobStatus) + Send>;

/// Invoked once when the job reaches `done`, with the result payload
pub type DoneCallback = Box<dyn FnOnce(Option<String>) + Send>;

/// Invoked once when the job errors or polling gives up
pub type ErrorCallback = Box<dyn FnOnce(String) + Send>;

/// Invoked on each failed status query, with the consecutive failure count
pub type FailureCallback = Box<dyn FnMut(&ClientError, u32) + Send>;

/// The set of callbacks owned by one session
#[derive(Default)]
pub struct Callbacks {
    pub(crate) status_update: Option<StatusCallback>,
    pub(crate) done: Option<DoneCallback>,
    pub(crate) error: Option<ErrorCallback>,
    pub(crate) poll_failure: Option<FailureCallback>,
}

impl Callbacks {
    pub(crate) fn status_update(&mut self, status: &JobStatus) {
        if let Some(callback) = self.status_update.as_mut() {
            callback(status);
        }
    }

    pub(crate) fn poll_failure(&mut self, error: &ClientError, consecutive: u32) {
        if let Some(callback) = self.poll_failure.as_mut() {
            callback(error, consecutive);
        }
    }

    /// Terminal callbacks are consumed on first use
    pub(crate) fn done(&mut self, result: Option<String>) {
        if let Some(callback) = self.done.take() {
            callback(result);
        }
    }

    pub(crate) fn error(&mut self, message: String) {
        if let Some(callback) = self.error.take() {
            callback(message);
        }
    }

    pub(crate) fn describe(&self) -> String {
        let names: Vec<&str> = [
            ("on_status_update", self.status_update.is_some()),
            ("on_done", self.done.is_some()),
            ("on_error", self.error.is_some()),
            ("on_poll_failure", self.poll_failure.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect();
        format!("[{}]", names.join(", "))
    }
}
