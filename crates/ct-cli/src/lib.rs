//! Cycle tracker CLI library.
//!
//! This crate provides the CLI interface for the cycle tracker.

mod cli;
pub mod commands;
mod config;
pub mod user;

pub use cli::{Cli, Commands, LogEntry, ProfileAction};
pub use config::Config;
