//! Jobwatch Core
//!
//! Core types shared by the jobwatch client, poller and CLI.
//!
//! This crate contains:
//! - Domain types: job identifiers, statuses and status observations
//! - DTOs: wire shapes of the dashboard submission and status endpoints

pub mod domain;
pub mod dto;
