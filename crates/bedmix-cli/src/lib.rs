//! Command-line interface for bedmix.
//!
//! `main.rs` is a thin entry point; parsing, composition and command
//! handlers live here so they can be unit tested.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;

// Used by the binary entry point only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, ToolRequirement, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
