//! Data Transfer Objects for the dashboard endpoints
//!
//! These mirror the JSON bodies exchanged with the dashboard server. They are
//! translated into domain types by the client crate.

pub mod job;
