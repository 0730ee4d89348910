//! CLI subcommand implementations.

pub mod calendar;
pub mod day;
pub mod export;
pub mod home;
pub mod init;
pub mod log;
pub mod profile;
pub mod stats;
pub mod util;
