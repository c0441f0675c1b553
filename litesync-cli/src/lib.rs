//! Library exports for litesync-cli.
//!
//! This module exports the CLI structure for use by the binary and the
//! integration tests.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

// Re-export CLI for the binary
pub use cli::Cli;
