//! Command-line client for slotbook booking pages.
//!
//! This crate provides the `slotbook` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
