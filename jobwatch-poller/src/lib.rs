//! Jobwatch Poller
//!
//! Tracks a long-running server-side job by identifier, polls its status on a
//! fixed interval, and reports the terminal outcome exactly once.
//!
//! Architecture:
//! - Backend: the submission and status endpoints behind [`JobBackend`]
//! - Config: polling cadence, failure policy and caller callbacks
//! - Session: the handle owning one job's polling task and its state machine
//! - Poller: starts sessions and runs the per-tick polling cycle
//!
//! ```no_run
//! use std::sync::Arc;
//! use jobwatch_client::DashboardClient;
//! use jobwatch_core::domain::job::JobId;
//! use jobwatch_poller::{AsyncJobPoller, PollConfig};
//!
//! # async fn example() -> Result<(), jobwatch_poller::PollError> {
//! let poller = AsyncJobPoller::new(Arc::new(DashboardClient::new("http://localhost:5000")));
//! let config = PollConfig::new()
//!     .on_status_update(|status| println!("status: {status}"))
//!     .on_done(|url| println!("done: {url:?}"))
//!     .on_error(|message| eprintln!("failed: {message}"));
//!
//! let session = poller.start(JobId::new("proj-42").unwrap(), config)?;
//! let outcome = session.wait().await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod callbacks;
pub mod config;
pub mod error;
pub mod poller;
pub mod session;

pub use backend::JobBackend;
pub use config::PollConfig;
pub use error::PollError;
pub use poller::AsyncJobPoller;
pub use session::{PollSession, SessionOutcome, SessionState};
