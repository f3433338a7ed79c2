//! Async job poller
//!
//! Starts poll sessions and runs the per-tick polling cycle. Each session
//! runs in its own task and issues at most one status query at a time.

use std::sync::Arc;

use jobwatch_client::ClientError;
use jobwatch_core::domain::job::{JobId, JobStatus};
use serde::Serialize;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::JobBackend;
use crate::callbacks::Callbacks;
use crate::config::{PollConfig, PollSettings};
use crate::error::PollError;
use crate::session::{PollSession, SessionOutcome, SessionShared, SessionState};

/// Starts and drives poll sessions against a job backend
pub struct AsyncJobPoller<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: ?Sized> Clone for AsyncJobPoller<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: JobBackend + ?Sized + 'static> AsyncJobPoller<B> {
    /// Creates a new job poller
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Starts polling an existing job
    ///
    /// The first status query happens one full interval after this call.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, job_id: JobId, config: PollConfig) -> Result<PollSession, PollError> {
        config.validate()?;

        let (settings, callbacks) = config.into_parts();
        let session_id = Uuid::new_v4();
        let shared = Arc::new(SessionShared::new());
        shared.begin();

        info!(
            "Starting poll session {} for job {} (interval: {:?})",
            session_id, job_id, settings.interval
        );

        let task = tokio::spawn(run_session(
            Arc::clone(&self.backend),
            session_id,
            job_id.clone(),
            Arc::clone(&shared),
            settings,
            callbacks,
        ));

        Ok(PollSession::new(session_id, job_id, shared, task))
    }

    /// Submits a new job, then starts polling it
    ///
    /// A failed submission is returned as [`PollError::Submission`] and no
    /// session is created.
    pub async fn submit_and_start<T: Serialize + ?Sized>(
        &self,
        request: &T,
        config: PollConfig,
    ) -> Result<PollSession, PollError> {
        config.validate()?;

        let payload = serde_json::to_value(request)?;
        let job_id = self
            .backend
            .submit(&payload)
            .await
            .map_err(PollError::Submission)?;

        info!("Submitted job {}", job_id);
        self.start(job_id, config)
    }
}

/// Polling loop of a single session
async fn run_session<B: JobBackend + ?Sized>(
    backend: Arc<B>,
    session_id: Uuid,
    job_id: JobId,
    shared: Arc<SessionShared>,
    settings: PollSettings,
    mut callbacks: Callbacks,
) -> SessionOutcome {
    let mut ticker = time::interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut failures = FailureStreak::default();

    loop {
        tokio::select! {
            biased;
            _ = shared.cancelled() => return SessionOutcome::Cancelled,
            _ = ticker.tick() => {}
        }

        if shared.is_stopped() {
            return SessionOutcome::Cancelled;
        }

        let attempt = shared.record_attempt();
        debug!("Session {}: polling job {} (attempt {})", session_id, job_id, attempt);

        let response = backend.fetch_status(&job_id).await;

        // A late response must never act on a stopped session.
        if shared.is_stopped() {
            debug!(
                "Session {}: discarding status response for job {} after cancellation",
                session_id, job_id
            );
            return SessionOutcome::Cancelled;
        }

        match response {
            Ok(report) => {
                failures.reset();
                debug!("Session {}: job {} is {}", session_id, job_id, report.status);
                if !notify_status_update(&shared, &mut callbacks, &report.status) {
                    return SessionOutcome::Cancelled;
                }

                match report.status {
                    JobStatus::Done => {
                        if !shared.finish(SessionState::Done) {
                            return SessionOutcome::Cancelled;
                        }
                        info!("Session {}: job {} finished", session_id, job_id);
                        callbacks.done(report.result.clone());
                        return SessionOutcome::Done {
                            result: report.result,
                        };
                    }
                    JobStatus::Error => {
                        let message = report
                            .message
                            .unwrap_or_else(|| format!("job {} reported an error", job_id));
                        return fail(&shared, &mut callbacks, session_id, message);
                    }
                    JobStatus::InProgress(_) => {}
                }
            }
            Err(e) => {
                let consecutive_failures = failures.record();
                warn!(
                    "Session {}: status query for job {} failed ({} in a row): {}",
                    session_id, job_id, consecutive_failures, e
                );
                if !notify_poll_failure(&shared, &mut callbacks, &e, consecutive_failures) {
                    return SessionOutcome::Cancelled;
                }

                if settings
                    .max_transport_failures
                    .is_some_and(|max| consecutive_failures >= max)
                {
                    let message = format!(
                        "giving up on job {} after {} consecutive failed status queries: {}",
                        job_id, consecutive_failures, e
                    );
                    return fail(&shared, &mut callbacks, session_id, message);
                }
            }
        }

        if settings.max_polls.is_some_and(|max| attempt >= max) {
            let message = format!(
                "job {} did not finish within {} status queries",
                job_id, attempt
            );
            return fail(&shared, &mut callbacks, session_id, message);
        }
    }
}

/// Run of consecutive failed status queries
#[derive(Debug, Default)]
struct FailureStreak(u32);

impl FailureStreak {
    fn record(&mut self) -> u32 {
        self.0 = self.0.saturating_add(1);
        self.0
    }

    fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Skips the callback once the session is stopped; returns false in that case.
fn notify_status_update(
    shared: &SessionShared,
    callbacks: &mut Callbacks,
    status: &JobStatus,
) -> bool {
    if shared.is_stopped() {
        return false;
    }
    callbacks.status_update(status);
    true
}

fn notify_poll_failure(
    shared: &SessionShared,
    callbacks: &mut Callbacks,
    error: &ClientError,
    consecutive: u32,
) -> bool {
    if shared.is_stopped() {
        return false;
    }
    callbacks.poll_failure(error, consecutive);
    true
}

fn fail(
    shared: &SessionShared,
    callbacks: &mut Callbacks,
    session_id: Uuid,
    message: String,
) -> SessionOutcome {
    if !shared.finish(SessionState::Errored) {
        return SessionOutcome::Cancelled;
    }

    warn!("Session {}: {}", session_id, message);
    callbacks.error(message.clone());
    SessionOutcome::Errored { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jobwatch_core::domain::job::JobStatusReport;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    const INTERVAL: Duration = Duration::from_millis(5000);

    enum Step {
        Status(&'static str),
        Fail,
    }

    /// Backend that answers status queries from a script
    #[derive(Default)]
    struct ScriptedBackend {
        script: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<Instant>>,
        submissions: Mutex<Vec<serde_json::Value>>,
        reject_submission: bool,
        /// When set, each status query signals `entered` and waits for `release`
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl ScriptedBackend {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                script: Mutex::new(steps.into()),
                ..Default::default()
            }
        }

        fn statuses(statuses: &[&'static str]) -> Self {
            Self::new(statuses.iter().map(|s| Step::Status(*s)).collect())
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl JobBackend for ScriptedBackend {
        async fn submit(&self, payload: &serde_json::Value) -> jobwatch_client::Result<JobId> {
            self.submissions.lock().unwrap().push(payload.clone());
            if self.reject_submission {
                return Err(ClientError::Rejected("Missing API keys".to_string()));
            }
            Ok(JobId::new("proj-submitted").unwrap())
        }

        async fn fetch_status(&self, job_id: &JobId) -> jobwatch_client::Result<JobStatusReport> {
            self.calls.lock().unwrap().push(Instant::now());

            if let Some((entered, release)) = &self.gate {
                entered.notify_one();
                release.notified().await;
            }

            let step = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Step::Status("pending"));

            match step {
                Step::Status(raw) => {
                    let status = JobStatus::parse(raw);
                    let result = (status == JobStatus::Done)
                        .then(|| format!("https://cdn.example/{}.mp4", job_id));
                    let message =
                        (status == JobStatus::Error).then(|| "render failed".to_string());
                    Ok(JobStatusReport::new(job_id.clone(), status)
                        .with_result(result)
                        .with_message(message))
                }
                Step::Fail => Err(ClientError::api_error(503, "connection reset")),
            }
        }
    }

    /// Everything the callbacks observed
    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<String>>,
        done: Mutex<Vec<Option<String>>>,
        errors: Mutex<Vec<String>>,
        failures: Mutex<Vec<u32>>,
    }

    impl Recorder {
        fn config(self: &Arc<Self>) -> PollConfig {
            let statuses = Arc::clone(self);
            let done = Arc::clone(self);
            let errors = Arc::clone(self);
            let failures = Arc::clone(self);
            PollConfig::new()
                .with_interval(INTERVAL)
                .on_status_update(move |status| {
                    statuses.statuses.lock().unwrap().push(status.to_string())
                })
                .on_done(move |result| done.done.lock().unwrap().push(result))
                .on_error(move |message| errors.errors.lock().unwrap().push(message))
                .on_poll_failure(move |_, consecutive| {
                    failures.failures.lock().unwrap().push(consecutive)
                })
        }

        fn statuses(&self) -> Vec<String> {
            self.statuses.lock().unwrap().clone()
        }

        fn done_count(&self) -> usize {
            self.done.lock().unwrap().len()
        }

        fn error_count(&self) -> usize {
            self.errors.lock().unwrap().len()
        }
    }

    fn job() -> JobId {
        JobId::new("proj-1").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_pending_done() {
        let backend = Arc::new(ScriptedBackend::statuses(&["pending", "pending", "done"]));
        let recorder = Arc::new(Recorder::default());
        let poller = AsyncJobPoller::new(Arc::clone(&backend));
        let started = Instant::now();

        let session = poller.start(job(), recorder.config()).unwrap();
        let outcome = session.wait().await.unwrap();

        assert_eq!(
            outcome,
            SessionOutcome::Done {
                result: Some("https://cdn.example/proj-1.mp4".to_string())
            }
        );
        assert_eq!(recorder.statuses(), vec!["pending", "pending", "done"]);
        assert_eq!(recorder.done_count(), 1);
        assert_eq!(recorder.error_count(), 0);
        assert_eq!(backend.call_count(), 3);
        assert_eq!(started.elapsed(), INTERVAL * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_error_stops_polling() {
        let backend = Arc::new(ScriptedBackend::statuses(&["pending", "error", "done"]));
        let recorder = Arc::new(Recorder::default());
        let poller = AsyncJobPoller::new(Arc::clone(&backend));

        let session = poller.start(job(), recorder.config()).unwrap();
        let outcome = session.wait().await.unwrap();

        assert_eq!(
            outcome,
            SessionOutcome::Errored {
                message: "render failed".to_string()
            }
        );
        assert_eq!(recorder.error_count(), 1);
        assert_eq!(recorder.done_count(), 0);

        time::sleep(INTERVAL * 4).await;
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_query_waits_a_full_interval() {
        let backend = Arc::new(ScriptedBackend::statuses(&[]));
        let poller = AsyncJobPoller::new(Arc::clone(&backend));

        let session = poller
            .start(job(), PollConfig::new().with_interval(INTERVAL))
            .unwrap();

        time::sleep(INTERVAL - Duration::from_millis(1)).await;
        assert_eq!(backend.call_count(), 0);
        assert_eq!(session.state(), SessionState::Polling);

        time::sleep(Duration::from_millis(2)).await;
        assert_eq!(backend.call_count(), 1);
        assert_eq!(session.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_does_not_stop_polling() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Step::Status("pending"),
            Step::Fail,
            Step::Status("done"),
        ]));
        let recorder = Arc::new(Recorder::default());
        let poller = AsyncJobPoller::new(Arc::clone(&backend));

        let session = poller.start(job(), recorder.config()).unwrap();
        let outcome = session.wait().await.unwrap();

        assert!(matches!(outcome, SessionOutcome::Done { .. }));
        assert_eq!(recorder.statuses(), vec!["pending", "done"]);
        assert_eq!(*recorder.failures.lock().unwrap(), vec![1]);
        assert_eq!(recorder.done_count(), 1);
        assert_eq!(recorder.error_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_transport_failures_is_terminal() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Step::Fail,
            Step::Status("pending"),
            Step::Fail,
            Step::Fail,
            Step::Status("done"),
        ]));
        let recorder = Arc::new(Recorder::default());
        let poller = AsyncJobPoller::new(Arc::clone(&backend));

        let session = poller
            .start(job(), recorder.config().with_max_transport_failures(2))
            .unwrap();
        let outcome = session.wait().await.unwrap();

        assert!(matches!(outcome, SessionOutcome::Errored { .. }));
        assert_eq!(*recorder.failures.lock().unwrap(), vec![1, 1, 2]);
        assert_eq!(recorder.error_count(), 1);
        assert_eq!(recorder.done_count(), 0);
        assert_eq!(backend.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_polls_is_terminal() {
        let backend = Arc::new(ScriptedBackend::statuses(&[]));
        let recorder = Arc::new(Recorder::default());
        let poller = AsyncJobPoller::new(Arc::clone(&backend));

        let session = poller
            .start(job(), recorder.config().with_max_polls(3))
            .unwrap();
        let outcome = session.wait().await.unwrap();

        assert_eq!(
            outcome,
            SessionOutcome::Errored {
                message: "job proj-1 did not finish within 3 status queries".to_string()
            }
        );
        assert_eq!(recorder.statuses().len(), 3);
        assert_eq!(recorder.error_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_after_cancel_is_discarded() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend {
            gate: Some((Arc::clone(&entered), Arc::clone(&release))),
            ..ScriptedBackend::statuses(&["done"])
        });
        let recorder = Arc::new(Recorder::default());
        let poller = AsyncJobPoller::new(Arc::clone(&backend));

        let session = poller.start(job(), recorder.config()).unwrap();

        entered.notified().await;
        assert!(session.cancel());
        release.notify_one();

        let outcome = session.wait().await.unwrap();
        assert_eq!(outcome, SessionOutcome::Cancelled);
        assert!(recorder.statuses().is_empty());
        assert_eq!(recorder.done_count(), 0);
        assert_eq!(recorder.error_count(), 0);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_twice_is_noop() {
        let backend = Arc::new(ScriptedBackend::statuses(&[]));
        let recorder = Arc::new(Recorder::default());
        let poller = AsyncJobPoller::new(Arc::clone(&backend));

        let session = poller.start(job(), recorder.config()).unwrap();
        time::sleep(INTERVAL + Duration::from_millis(1)).await;

        assert!(session.cancel());
        assert!(!session.cancel());
        assert_eq!(session.state(), SessionState::Cancelled);
        assert!(!session.is_active());

        time::sleep(INTERVAL * 3).await;
        assert_eq!(backend.call_count(), 1);
        assert_eq!(session.wait().await.unwrap(), SessionOutcome::Cancelled);
        assert_eq!(recorder.done_count() + recorder.error_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_done_keeps_done() {
        let backend = Arc::new(ScriptedBackend::statuses(&["done"]));
        let recorder = Arc::new(Recorder::default());
        let poller = AsyncJobPoller::new(Arc::clone(&backend));

        let session = poller.start(job(), recorder.config()).unwrap();
        time::sleep(INTERVAL * 2).await;

        assert!(!session.cancel());
        assert_eq!(session.state(), SessionState::Done);
        assert!(matches!(
            session.wait().await.unwrap(),
            SessionOutcome::Done { .. }
        ));
        assert_eq!(recorder.done_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_session_stops_polling() {
        let backend = Arc::new(ScriptedBackend::statuses(&[]));
        let poller = AsyncJobPoller::new(Arc::clone(&backend));

        let session = poller
            .start(job(), PollConfig::new().with_interval(INTERVAL))
            .unwrap();
        time::sleep(INTERVAL + Duration::from_millis(1)).await;
        drop(session);

        time::sleep(INTERVAL * 3).await;
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_is_rejected() {
        let backend = Arc::new(ScriptedBackend::statuses(&[]));
        let poller = AsyncJobPoller::new(backend);

        let err = poller
            .start(job(), PollConfig::new().with_interval_ms(0))
            .unwrap_err();
        assert!(matches!(err, PollError::InvalidConfig(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_and_start() {
        let backend = Arc::new(ScriptedBackend::statuses(&["rendering", "done"]));
        let recorder = Arc::new(Recorder::default());
        let poller = AsyncJobPoller::new(Arc::clone(&backend));

        let session = poller
            .submit_and_start(&serde_json::json!({ "subject": "Cats" }), recorder.config())
            .await
            .unwrap();
        assert_eq!(session.job_id().as_str(), "proj-submitted");

        let outcome = session.wait().await.unwrap();
        assert!(matches!(outcome, SessionOutcome::Done { .. }));
        assert_eq!(recorder.statuses(), vec!["rendering", "done"]);
        assert_eq!(
            backend.submissions.lock().unwrap()[0],
            serde_json::json!({ "subject": "Cats" })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_failure_creates_no_session() {
        let backend = Arc::new(ScriptedBackend {
            reject_submission: true,
            ..ScriptedBackend::statuses(&[])
        });
        let poller = AsyncJobPoller::new(Arc::clone(&backend));

        let err = poller
            .submit_and_start(&serde_json::json!({ "subject": "Cats" }), PollConfig::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::Submission(ClientError::Rejected(_))));

        time::sleep(INTERVAL * 2).await;
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_failure_streak_saturates() {
        let mut failures = FailureStreak(u32::MAX - 1);
        assert_eq!(failures.record(), u32::MAX);
        assert_eq!(failures.record(), u32::MAX);

        failures.reset();
        assert_eq!(failures.record(), 1);
    }

    #[test]
    fn test_non_terminal_callbacks_skip_stopped_session() {
        let recorder = Arc::new(Recorder::default());
        let (_, mut callbacks) = recorder.config().into_parts();
        let shared = SessionShared::new();
        shared.begin();

        assert!(notify_status_update(&shared, &mut callbacks, &JobStatus::pending()));
        let error = ClientError::api_error(502, "bad gateway");
        assert!(notify_poll_failure(&shared, &mut callbacks, &error, 1));

        assert!(shared.finish(SessionState::Cancelled));
        assert!(!notify_status_update(&shared, &mut callbacks, &JobStatus::pending()));
        assert!(!notify_poll_failure(&shared, &mut callbacks, &error, 2));

        assert_eq!(recorder.statuses(), vec!["pending"]);
        assert_eq!(*recorder.failures.lock().unwrap(), vec![1]);
    }
}
