//! Subcommand implementations.

pub mod booking;
pub mod config;
