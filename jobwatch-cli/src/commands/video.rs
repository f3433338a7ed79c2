//! Video command handlers
//!
//! Starts video generation jobs on the dashboard, checks their status, and
//! watches them until the render finishes or fails.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Subcommand};
use colored::*;
use jobwatch_client::DashboardClient;
use jobwatch_core::domain::job::JobId;
use jobwatch_core::dto::job::VideoRequest;
use jobwatch_poller::{AsyncJobPoller, PollConfig, SessionOutcome};
use tracing::info;

use crate::config::Config;
use crate::display;

/// Video subcommands
#[derive(Subcommand)]
pub enum VideoCommands {
    /// Start a video generation job
    Generate {
        /// Subject of the video
        #[arg(short, long)]
        subject: String,

        /// Email to notify when the video is ready
        #[arg(short, long)]
        email: Option<String>,

        /// Print the job ID and exit without waiting for the render
        #[arg(long)]
        detach: bool,

        #[command(flatten)]
        poll: PollArgs,
    },
    /// Check a job's status once
    Status {
        /// Project ID returned by `generate`
        project_id: String,

        /// Print the raw report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Poll a job until it finishes
    Watch {
        /// Project ID returned by `generate`
        project_id: String,

        #[command(flatten)]
        poll: PollArgs,
    },
}

/// Polling options shared by `generate` and `watch`
#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Milliseconds between status checks
    #[arg(long, env = "JOBWATCH_POLL_INTERVAL_MS", default_value_t = 5000)]
    interval_ms: u64,

    /// Consecutive failed status checks before giving up
    #[arg(long, env = "JOBWATCH_MAX_TRANSPORT_FAILURES", default_value_t = 12)]
    max_failures: u32,

    /// Give up after this many status checks
    #[arg(long, env = "JOBWATCH_MAX_POLLS")]
    max_polls: Option<u32>,
}

impl PollArgs {
    /// Builds a poll configuration that reports to the terminal
    fn to_config(&self) -> PollConfig {
        let mut config = PollConfig::new()
            .with_interval_ms(self.interval_ms)
            .with_max_transport_failures(self.max_failures)
            .on_status_update(display::print_status_update)
            .on_poll_failure(display::print_poll_failure)
            .on_done(|result| display::print_done(result.as_deref()))
            .on_error(|message| display::print_failed(&message));

        if let Some(max_polls) = self.max_polls {
            config = config.with_max_polls(max_polls);
        }

        config
    }
}

/// Handle video commands
pub async fn handle_video_command(command: VideoCommands, config: &Config) -> Result<()> {
    let client = DashboardClient::new(&config.dashboard_url);

    match command {
        VideoCommands::Generate {
            subject,
            email,
            detach,
            poll,
        } => generate(client, subject, email, detach, &poll).await,
        VideoCommands::Status { project_id, json } => status(&client, &project_id, json).await,
        VideoCommands::Watch { project_id, poll } => {
            watch(client, parse_job_id(&project_id)?, &poll).await
        }
    }
}

fn parse_job_id(raw: &str) -> Result<JobId> {
    JobId::new(raw).ok_or_else(|| anyhow!("project ID cannot be empty"))
}

/// Submit a video job, then optionally watch it
async fn generate(
    client: DashboardClient,
    subject: String,
    email: Option<String>,
    detach: bool,
    poll: &PollArgs,
) -> Result<()> {
    info!("Requesting video about {:?}", subject);

    let job_id = client
        .generate_video(VideoRequest { subject, email })
        .await
        .context("Failed to start video generation")?;

    display::print_submitted(&job_id);

    if detach {
        println!(
            "{}",
            format!("  Run `jobwatch video watch {}` to follow it.", job_id).dimmed()
        );
        return Ok(());
    }

    println!();
    watch(client, job_id, poll).await
}

/// Query and display a job's status once
async fn status(client: &DashboardClient, project_id: &str, json: bool) -> Result<()> {
    let job_id = parse_job_id(project_id)?;

    let report = client
        .get_job_status(&job_id)
        .await
        .with_context(|| format!("Failed to check status of {}", job_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display::print_report(&report);
    }

    Ok(())
}

/// Poll a job until it reaches a terminal status or the user hits Ctrl-C
async fn watch(client: DashboardClient, job_id: JobId, poll: &PollArgs) -> Result<()> {
    let poller = AsyncJobPoller::new(Arc::new(client));
    let session = poller
        .start(job_id.clone(), poll.to_config())
        .context("Failed to start polling")?;

    println!(
        "{}",
        format!(
            "Watching job {} every {} ms (Ctrl-C to stop)...",
            job_id, poll.interval_ms
        )
        .bold()
    );

    // Dropping the pending wait on Ctrl-C drops the session, which cancels it.
    let outcome = tokio::select! {
        outcome = session.wait() => outcome?,
        _ = tokio::signal::ctrl_c() => SessionOutcome::Cancelled,
    };

    match outcome {
        SessionOutcome::Done { .. } => Ok(()),
        SessionOutcome::Errored { message } => bail!("job {} failed: {}", job_id, message),
        SessionOutcome::Cancelled => {
            println!("{}", "Stopped watching; the job keeps running.".yellow());
            Ok(())
        }
    }
}
