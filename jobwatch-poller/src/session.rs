//! Poll session handle and state machine
//!
//! `Idle -> Polling -> {Done | Errored | Cancelled}`. Only `Polling` has
//! outgoing transitions and each terminal transition is a single
//! compare-and-swap, so exactly one of them can ever win.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use jobwatch_core::domain::job::JobId;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::error::PollError;

/// Lifecycle state of a poll session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Polling = 1,
    Done = 2,
    Errored = 3,
    Cancelled = 4,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Idle,
            1 => SessionState::Polling,
            2 => SessionState::Done,
            3 => SessionState::Errored,
            _ => SessionState::Cancelled,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Done | SessionState::Errored | SessionState::Cancelled
        )
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The job reported `done`
    Done { result: Option<String> },
    /// The job reported `error`, or polling gave up
    Errored { message: String },
    /// The caller cancelled the session
    Cancelled,
}

/// State shared between a session handle and its polling task
#[derive(Debug)]
pub(crate) struct SessionShared {
    state: AtomicU8,
    attempts: AtomicU32,
    cancelled: Notify,
}

impl SessionShared {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Idle as u8),
            attempts: AtomicU32::new(0),
            cancelled: Notify::new(),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.state().is_terminal()
    }

    /// `Idle -> Polling`
    pub(crate) fn begin(&self) -> bool {
        self.transition(SessionState::Idle, SessionState::Polling)
    }

    /// `Polling -> terminal`. Returns true only for the caller that won.
    pub(crate) fn finish(&self, to: SessionState) -> bool {
        debug_assert!(to.is_terminal());
        self.transition(SessionState::Polling, to)
    }

    fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn record_attempt(&self) -> u32 {
        self.attempts.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Acquire)
    }

    pub(crate) async fn cancelled(&self) {
        self.cancelled.notified().await
    }

    fn wake(&self) {
        self.cancelled.notify_one();
    }
}

/// Handle owning the polling lifecycle of one job
///
/// The polling task and its timer are reachable only through this handle.
/// Dropping the handle cancels the session.
#[derive(Debug)]
pub struct PollSession {
    id: Uuid,
    job_id: JobId,
    shared: Arc<SessionShared>,
    task: Option<JoinHandle<SessionOutcome>>,
}

impl PollSession {
    pub(crate) fn new(
        id: Uuid,
        job_id: JobId,
        shared: Arc<SessionShared>,
        task: JoinHandle<SessionOutcome>,
    ) -> Self {
        Self {
            id,
            job_id,
            shared,
            task: Some(task),
        }
    }

    /// Session identifier used in log output
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn is_active(&self) -> bool {
        !self.shared.is_stopped()
    }

    /// Number of status queries issued so far
    pub fn attempts(&self) -> u32 {
        self.shared.attempts()
    }

    /// Stops polling
    ///
    /// No further ticks are scheduled. A status query already in flight is
    /// allowed to finish but its response is discarded. Cancelling a stopped
    /// session is a no-op.
    ///
    /// # Returns
    /// `true` if this call moved the session to `Cancelled`
    pub fn cancel(&self) -> bool {
        if !self.shared.finish(SessionState::Cancelled) {
            return false;
        }

        info!("Cancelled poll session {} for job {}", self.id, self.job_id);
        self.shared.wake();
        true
    }

    /// Waits for the session to reach a terminal state
    pub async fn wait(mut self) -> Result<SessionOutcome, PollError> {
        let Some(task) = self.task.take() else {
            return Ok(SessionOutcome::Cancelled);
        };

        task.await.map_err(|e| {
            self.shared.finish(SessionState::Errored);
            PollError::TaskFailed(e.to_string())
        })
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.cancel();
    }
}
