//! Terminal rendering of job statuses and outcomes

use colored::*;
use jobwatch_client::ClientError;
use jobwatch_core::domain::job::{JobId, JobStatus, JobStatusReport};

/// Colorize a job status for display
pub fn colorize_status(status: &JobStatus) -> ColoredString {
    match status {
        JobStatus::Done => status.as_str().green(),
        JobStatus::Error => status.as_str().red(),
        JobStatus::InProgress(raw) if raw == JobStatus::PENDING => raw.as_str().yellow(),
        JobStatus::InProgress(raw) => raw.as_str().cyan(),
    }
}

fn now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Print a one-off status report
pub fn print_report(report: &JobStatusReport) {
    println!("{}", "Job Status:".bold());
    println!("  Job ID:   {}", report.job_id.to_string().cyan());
    println!("  Status:   {}", colorize_status(&report.status));
    println!(
        "  Observed: {}",
        report.observed_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(result) = &report.result {
        println!("  Result:   {}", result.green());
    }

    if let Some(message) = &report.message {
        println!("  Message:  {}", message);
    }
}

pub fn print_submitted(job_id: &JobId) {
    println!("{} Job submitted", "✓".green());
    println!("  Job ID: {}", job_id.to_string().cyan());
}

pub fn print_status_update(status: &JobStatus) {
    println!("{} {}", now().dimmed(), colorize_status(status));
}

/// Short wording of a failed status check
pub fn describe_failure(error: &ClientError) -> &'static str {
    if error.is_server_error() {
        "dashboard unavailable"
    } else if error.is_client_error() {
        "request refused by dashboard"
    } else {
        "status check failed"
    }
}

pub fn print_poll_failure(error: &ClientError, consecutive: u32) {
    println!(
        "{} {} {} ({} in a row): {}",
        now().dimmed(),
        "⚠".yellow(),
        describe_failure(error),
        consecutive,
        error
    );
}

pub fn print_done(result: Option<&str>) {
    println!();
    println!("{} Job finished", "✓".green().bold());
    match result {
        Some(url) => println!("  Result: {}", url.green()),
        None => println!("  {}", "No result reported".dimmed()),
    }
}

pub fn print_failed(message: &str) {
    println!();
    println!("{} Job failed", "✗".red().bold());
    println!("  {}", message.red());
}
