//! Core domain types
//!
//! A job is created by a submission endpoint, mutated only by the remote
//! system, and observed by the poller through status reports.

pub mod job;
